//! Unit test harness: shared mocks plus one module per service under test.

mod mocks;

mod handoff_tests;
mod provision_tests;
mod readiness_tests;
mod teardown_tests;
