//! Infrastructure implementation of the cloud port traits.
//!
//! `AwsCli<R>` routes every cloud call through a `CommandRunner` as one
//! `aws` invocation with a fixed request shape, and parses the JSON
//! responses with `serde_json`. Generic over `R: CommandRunner` so tests
//! can inject a mock runner without spawning real processes.

use std::process::Output;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::application::ports::{
    Addresses, ApiHandle, CommandRunner, Gateway, InstanceFacts, InstanceSpec, Instances, KeyPairs,
    SecurityGroups,
};
use crate::domain::StackError;
use crate::infra::command_runner::WAITER_TIMEOUT;

/// Adapter over the `aws` CLI.
pub struct AwsCli<R: CommandRunner> {
    runner: R,
    region: Option<String>,
}

impl<R: CommandRunner> AwsCli<R> {
    /// Create an adapter; `region` overrides the CLI's own default chain
    /// when set.
    pub fn new(runner: R, region: Option<String>) -> Self {
        Self { runner, region }
    }

    /// Run one `aws` invocation, failing with the provider's stderr when
    /// the call is rejected.
    async fn invoke(&self, operation: &str, args: &[&str]) -> Result<Output> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        full.extend_from_slice(args);
        if let Some(region) = &self.region {
            full.push("--region");
            full.push(region);
        }
        let output = self
            .runner
            .run("aws", &full)
            .await
            .with_context(|| format!("aws {operation}"))?;
        if !output.status.success() {
            return Err(StackError::ProviderRequest {
                operation: operation.to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
        Ok(output)
    }

    /// Like `invoke`, but for the blocking `aws ec2 wait` calls.
    async fn invoke_waiter(&self, operation: &str, args: &[&str]) -> Result<()> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        full.extend_from_slice(args);
        if let Some(region) = &self.region {
            full.push("--region");
            full.push(region);
        }
        let output = self
            .runner
            .run_with_timeout("aws", &full, WAITER_TIMEOUT)
            .await
            .with_context(|| format!("aws {operation}"))?;
        if !output.status.success() {
            return Err(StackError::ProviderRequest {
                operation: operation.to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
        Ok(())
    }
}

/// Parse an `aws` JSON response body.
fn parse_json(operation: &str, output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).with_context(|| format!("parsing aws {operation} output"))
}

/// Pull a string field out of a JSON response, failing with the field name.
fn string_field(operation: &str, value: &Value, field: &'static str) -> Result<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            StackError::MalformedResponse {
                operation: operation.to_owned(),
                field,
            }
            .into()
        })
}

impl<R: CommandRunner> KeyPairs for AwsCli<R> {
    async fn create_key_pair(&self, name: &str) -> Result<String> {
        let output = self
            .invoke(
                "ec2 create-key-pair",
                &[
                    "ec2",
                    "create-key-pair",
                    "--key-name",
                    name,
                    "--key-type",
                    "ed25519",
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("create-key-pair", &output)?;
        string_field("create-key-pair", &body, "KeyMaterial")
    }

    async fn delete_key_pair(&self, name: &str) -> Result<()> {
        self.invoke(
            "ec2 delete-key-pair",
            &["ec2", "delete-key-pair", "--key-name", name],
        )
        .await?;
        Ok(())
    }
}

impl<R: CommandRunner> Instances for AwsCli<R> {
    async fn run_instance(&self, spec: &InstanceSpec<'_>) -> Result<String> {
        let tag_spec = format!(
            "ResourceType=instance,Tags=[{{Key=Name,Value={}}}]",
            spec.name_tag
        );
        let output = self
            .invoke(
                "ec2 run-instances",
                &[
                    "ec2",
                    "run-instances",
                    "--image-id",
                    spec.image_id,
                    "--instance-type",
                    spec.instance_type,
                    "--subnet-id",
                    spec.subnet_id,
                    "--security-group-ids",
                    spec.security_group_id,
                    "--key-name",
                    spec.key_name,
                    "--user-data",
                    spec.user_data,
                    "--tag-specifications",
                    &tag_spec,
                    "--count",
                    "1",
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("run-instances", &output)?;
        body.get("Instances")
            .and_then(|i| i.get(0))
            .and_then(|i| i.get("InstanceId"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                StackError::MalformedResponse {
                    operation: "run-instances".to_owned(),
                    field: "Instances[0].InstanceId",
                }
                .into()
            })
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceFacts> {
        let output = self
            .invoke(
                "ec2 describe-instances",
                &[
                    "ec2",
                    "describe-instances",
                    "--instance-ids",
                    instance_id,
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("describe-instances", &output)?;
        let instance = body
            .get("Reservations")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("Instances"))
            .and_then(|i| i.get(0))
            .ok_or(StackError::MalformedResponse {
                operation: "describe-instances".to_owned(),
                field: "Reservations[0].Instances[0]",
            })?;
        let state = instance
            .get("State")
            .and_then(|s| s.get("Name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();
        let private_ip = string_field("describe-instances", instance, "PrivateIpAddress")?;
        Ok(InstanceFacts { state, private_ip })
    }

    async fn wait_running(&self, instance_id: &str) -> Result<()> {
        self.invoke_waiter(
            "ec2 wait instance-running",
            &["ec2", "wait", "instance-running", "--instance-ids", instance_id],
        )
        .await
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.invoke(
            "ec2 terminate-instances",
            &["ec2", "terminate-instances", "--instance-ids", instance_id],
        )
        .await?;
        Ok(())
    }

    async fn wait_terminated(&self, instance_id: &str) -> Result<()> {
        self.invoke_waiter(
            "ec2 wait instance-terminated",
            &["ec2", "wait", "instance-terminated", "--instance-ids", instance_id],
        )
        .await
    }
}

impl<R: CommandRunner> Addresses for AwsCli<R> {
    async fn resolve_address(&self, allocation_id: &str) -> Result<String> {
        let output = self
            .invoke(
                "ec2 describe-addresses",
                &[
                    "ec2",
                    "describe-addresses",
                    "--allocation-ids",
                    allocation_id,
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("describe-addresses", &output)?;
        body.get("Addresses")
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("PublicIp"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                StackError::MalformedResponse {
                    operation: "describe-addresses".to_owned(),
                    field: "Addresses[0].PublicIp",
                }
                .into()
            })
    }

    async fn associate_address(&self, allocation_id: &str, instance_id: &str) -> Result<String> {
        let output = self
            .invoke(
                "ec2 associate-address",
                &[
                    "ec2",
                    "associate-address",
                    "--allocation-id",
                    allocation_id,
                    "--instance-id",
                    instance_id,
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("associate-address", &output)?;
        string_field("associate-address", &body, "AssociationId")
    }

    async fn disassociate_address(&self, association_id: &str) -> Result<()> {
        self.invoke(
            "ec2 disassociate-address",
            &["ec2", "disassociate-address", "--association-id", association_id],
        )
        .await?;
        Ok(())
    }
}

impl<R: CommandRunner> Gateway for AwsCli<R> {
    async fn create_http_api(&self, name: &str) -> Result<ApiHandle> {
        let output = self
            .invoke(
                "apigatewayv2 create-api",
                &[
                    "apigatewayv2",
                    "create-api",
                    "--name",
                    name,
                    "--protocol-type",
                    "HTTP",
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("create-api", &output)?;
        Ok(ApiHandle {
            api_id: string_field("create-api", &body, "ApiId")?,
            endpoint: string_field("create-api", &body, "ApiEndpoint")?,
        })
    }

    async fn create_integration(&self, api_id: &str, uri: &str) -> Result<String> {
        let output = self
            .invoke(
                "apigatewayv2 create-integration",
                &[
                    "apigatewayv2",
                    "create-integration",
                    "--api-id",
                    api_id,
                    "--integration-type",
                    "HTTP_PROXY",
                    "--integration-method",
                    "ANY",
                    "--payload-format-version",
                    "1.0",
                    "--integration-uri",
                    uri,
                    "--output",
                    "json",
                ],
            )
            .await?;
        let body = parse_json("create-integration", &output)?;
        string_field("create-integration", &body, "IntegrationId")
    }

    async fn create_route(
        &self,
        api_id: &str,
        route_key: &str,
        integration_id: &str,
    ) -> Result<()> {
        let target = format!("integrations/{integration_id}");
        self.invoke(
            "apigatewayv2 create-route",
            &[
                "apigatewayv2",
                "create-route",
                "--api-id",
                api_id,
                "--route-key",
                route_key,
                "--target",
                &target,
            ],
        )
        .await?;
        Ok(())
    }

    async fn create_default_stage(&self, api_id: &str) -> Result<()> {
        self.invoke(
            "apigatewayv2 create-stage",
            &[
                "apigatewayv2",
                "create-stage",
                "--api-id",
                api_id,
                "--stage-name",
                "$default",
                "--auto-deploy",
            ],
        )
        .await?;
        Ok(())
    }

    async fn delete_http_api(&self, api_id: &str) -> Result<()> {
        self.invoke(
            "apigatewayv2 delete-api",
            &["apigatewayv2", "delete-api", "--api-id", api_id],
        )
        .await?;
        Ok(())
    }
}

impl<R: CommandRunner> SecurityGroups for AwsCli<R> {
    async fn authorize_ingress(&self, group_id: &str, port: u16, source_cidr: &str) -> Result<()> {
        let port = port.to_string();
        self.invoke(
            "ec2 authorize-security-group-ingress",
            &[
                "ec2",
                "authorize-security-group-ingress",
                "--group-id",
                group_id,
                "--protocol",
                "tcp",
                "--port",
                &port,
                "--cidr",
                source_cidr,
            ],
        )
        .await?;
        Ok(())
    }

    async fn revoke_ingress(&self, group_id: &str, port: u16, source_cidr: &str) -> Result<()> {
        let port = port.to_string();
        self.invoke(
            "ec2 revoke-security-group-ingress",
            &[
                "ec2",
                "revoke-security-group-ingress",
                "--group-id",
                group_id,
                "--protocol",
                "tcp",
                "--port",
                &port,
                "--cidr",
                source_cidr,
            ],
        )
        .await?;
        Ok(())
    }
}
