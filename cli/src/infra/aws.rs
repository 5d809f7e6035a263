//! Infrastructure implementation of the cloud provider port traits.
//!
//! `AwsCli<R>` routes every EC2 and SSM call through the `aws` binary via a
//! `CommandRunner` and parses its JSON output.

use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::application::ports::{
    CommandRunner, InstanceFilter, InstanceFleet, InstanceSpec, KeyPairs, NetworkFabric,
    ProviderTooling,
};
use crate::domain::firewall::{IngressRule, ip_permissions};
use crate::domain::{Instance, Tag};

/// Infrastructure adapter over the AWS CLI.
///
/// Generic over `R: CommandRunner` so that tests can inject a stub runner
/// without spawning real processes.
pub struct AwsCli<R: CommandRunner> {
    runner: R,
    region: Option<String>,
    /// Timeout for `aws ec2 wait ...`, which may block for many minutes.
    wait_timeout: Duration,
}

impl<R: CommandRunner> AwsCli<R> {
    pub fn new(runner: R, region: Option<String>, wait_timeout: Duration) -> Self {
        Self {
            runner,
            region,
            wait_timeout,
        }
    }

    fn full_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = args.to_vec();
        if let Some(region) = &self.region {
            full.push("--region");
            full.push(region);
        }
        full
    }

    /// Run `aws <args>` and return stdout, failing on a non-zero exit.
    async fn call(&self, args: &[&str]) -> Result<String> {
        let full = self.full_args(args);
        let output = self
            .runner
            .run("aws", &full)
            .await
            .with_context(|| format!("aws {}", describe(args)))?;
        stdout_or_error(args, &output)
    }

    async fn call_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let mut with_output = args.to_vec();
        with_output.extend_from_slice(&["--output", "json"]);
        let stdout = self.call(&with_output).await?;
        serde_json::from_str(&stdout)
            .with_context(|| format!("parsing output of aws {}", describe(args)))
    }

    async fn wait(&self, args: &[&str]) -> Result<()> {
        let full = self.full_args(args);
        let output = self
            .runner
            .run_with_timeout("aws", &full, self.wait_timeout)
            .await
            .with_context(|| format!("aws {}", describe(args)))?;
        stdout_or_error(args, &output).map(|_| ())
    }
}

/// `ec2 create-vpc` for error messages.
fn describe(args: &[&str]) -> String {
    args.iter().take(2).copied().collect::<Vec<_>>().join(" ")
}

fn stdout_or_error(args: &[&str], output: &Output) -> Result<String> {
    if !output.status.success() {
        anyhow::bail!(
            "aws {} failed: {}",
            describe(args),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn name_filter(key: &str, pattern: &str) -> String {
    format!("Name={key},Values={pattern}")
}

// ── Response shapes ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcEnvelope {
    vpc: VpcItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcItem {
    vpc_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcList {
    #[serde(default)]
    vpcs: Vec<VpcItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InternetGatewayEnvelope {
    internet_gateway: InternetGatewayItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InternetGatewayItem {
    internet_gateway_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteTableEnvelope {
    route_table: RouteTableItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteTableItem {
    route_table_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetEnvelope {
    subnet: SubnetItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetItem {
    subnet_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupItem {
    group_id: String,
    #[serde(default)]
    group_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupList {
    #[serde(default)]
    security_groups: Vec<SecurityGroupItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyPairItem {
    key_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyPairList {
    #[serde(default)]
    key_pairs: Vec<KeyPairItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterEnvelope {
    parameter: ParameterItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterItem {
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservations {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<InstanceItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceState {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TagItem {
    key: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceItem {
    instance_id: String,
    state: Option<InstanceState>,
    public_ip_address: Option<String>,
    private_ip_address: Option<String>,
    public_dns_name: Option<String>,
    #[serde(default)]
    tags: Vec<TagItem>,
}

impl From<InstanceItem> for Instance {
    fn from(item: InstanceItem) -> Self {
        Self {
            id: item.instance_id,
            state: item.state.map_or_else(|| "unknown".to_string(), |s| s.name),
            public_ip: item.public_ip_address,
            private_ip: item.private_ip_address,
            public_dns: item.public_dns_name.filter(|d| !d.is_empty()),
            tags: item
                .tags
                .into_iter()
                .map(|t| Tag {
                    key: t.key,
                    value: t.value,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RunInstances {
    instances: Vec<InstanceItem>,
}

// ── Port implementations ──────────────────────────────────────────────────────

impl<R: CommandRunner> ProviderTooling for AwsCli<R> {
    async fn version(&self) -> Result<Output> {
        self.runner
            .run("aws", &["--version"])
            .await
            .context("aws --version")
    }
}

impl<R: CommandRunner> KeyPairs for AwsCli<R> {
    async fn create_key_pair(&self, name: &str) -> Result<String> {
        self.call(&[
            "ec2",
            "create-key-pair",
            "--key-name",
            name,
            "--query",
            "KeyMaterial",
            "--output",
            "text",
        ])
        .await
    }

    async fn list_key_pairs(&self, pattern: &str) -> Result<Vec<String>> {
        let filter = name_filter("key-name", pattern);
        let list: KeyPairList = self
            .call_json(&["ec2", "describe-key-pairs", "--filters", &filter])
            .await?;
        Ok(list.key_pairs.into_iter().map(|k| k.key_name).collect())
    }
}

impl<R: CommandRunner> NetworkFabric for AwsCli<R> {
    async fn create_vpc(&self, cidr: &str) -> Result<String> {
        let created: VpcEnvelope = self
            .call_json(&["ec2", "create-vpc", "--cidr-block", cidr])
            .await?;
        Ok(created.vpc.vpc_id)
    }

    async fn wait_vpc_exists(&self, vpc_id: &str) -> Result<()> {
        self.wait(&["ec2", "wait", "vpc-exists", "--vpc-ids", vpc_id])
            .await
    }

    async fn wait_vpc_available(&self, vpc_id: &str) -> Result<()> {
        self.wait(&["ec2", "wait", "vpc-available", "--vpc-ids", vpc_id])
            .await
    }

    async fn enable_vpc_dns(&self, vpc_id: &str) -> Result<()> {
        // One attribute per call.
        for attribute in ["--enable-dns-support", "--enable-dns-hostnames"] {
            self.call(&[
                "ec2",
                "modify-vpc-attribute",
                "--vpc-id",
                vpc_id,
                attribute,
                "{\"Value\":true}",
            ])
            .await?;
        }
        Ok(())
    }

    async fn tag_name(&self, resource_id: &str, name: &str) -> Result<()> {
        let tag = format!("Key=Name,Value={name}");
        self.call(&["ec2", "create-tags", "--resources", resource_id, "--tags", &tag])
            .await
            .map(|_| ())
    }

    async fn create_internet_gateway(&self, vpc_id: &str) -> Result<String> {
        let created: InternetGatewayEnvelope = self
            .call_json(&["ec2", "create-internet-gateway"])
            .await?;
        let id = created.internet_gateway.internet_gateway_id;
        self.call(&[
            "ec2",
            "attach-internet-gateway",
            "--internet-gateway-id",
            &id,
            "--vpc-id",
            vpc_id,
        ])
        .await?;
        Ok(id)
    }

    async fn create_public_route_table(&self, vpc_id: &str, gateway_id: &str) -> Result<String> {
        let created: RouteTableEnvelope = self
            .call_json(&["ec2", "create-route-table", "--vpc-id", vpc_id])
            .await?;
        let id = created.route_table.route_table_id;
        self.call(&[
            "ec2",
            "create-route",
            "--route-table-id",
            &id,
            "--destination-cidr-block",
            "0.0.0.0/0",
            "--gateway-id",
            gateway_id,
        ])
        .await?;
        Ok(id)
    }

    async fn create_subnet(&self, vpc_id: &str, cidr: &str) -> Result<String> {
        let created: SubnetEnvelope = self
            .call_json(&["ec2", "create-subnet", "--vpc-id", vpc_id, "--cidr-block", cidr])
            .await?;
        Ok(created.subnet.subnet_id)
    }

    async fn associate_route_table(&self, route_table_id: &str, subnet_id: &str) -> Result<()> {
        self.call(&[
            "ec2",
            "associate-route-table",
            "--route-table-id",
            route_table_id,
            "--subnet-id",
            subnet_id,
        ])
        .await
        .map(|_| ())
    }

    async fn create_security_group(
        &self,
        vpc_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String> {
        let created: SecurityGroupItem = self
            .call_json(&[
                "ec2",
                "create-security-group",
                "--group-name",
                name,
                "--description",
                description,
                "--vpc-id",
                vpc_id,
            ])
            .await?;
        Ok(created.group_id)
    }

    async fn authorize_ingress(&self, group_id: &str, rules: &[IngressRule]) -> Result<()> {
        let permissions = ip_permissions(rules).to_string();
        self.call(&[
            "ec2",
            "authorize-security-group-ingress",
            "--group-id",
            group_id,
            "--ip-permissions",
            &permissions,
        ])
        .await
        .map(|_| ())
    }

    async fn list_vpcs(&self, pattern: &str) -> Result<Vec<String>> {
        let filter = name_filter("tag:Name", pattern);
        let list: VpcList = self
            .call_json(&["ec2", "describe-vpcs", "--filters", &filter])
            .await?;
        Ok(list.vpcs.into_iter().map(|v| v.vpc_id).collect())
    }

    async fn list_security_groups(&self, pattern: &str) -> Result<Vec<(String, String)>> {
        let filter = name_filter("group-name", pattern);
        let list: SecurityGroupList = self
            .call_json(&["ec2", "describe-security-groups", "--filters", &filter])
            .await?;
        Ok(list
            .security_groups
            .into_iter()
            .map(|g| (g.group_id, g.group_name))
            .collect())
    }
}

impl<R: CommandRunner> InstanceFleet for AwsCli<R> {
    async fn image_id(&self, parameter: &str) -> Result<String> {
        let found: ParameterEnvelope = self
            .call_json(&["ssm", "get-parameter", "--name", parameter])
            .await?;
        Ok(found.parameter.value)
    }

    async fn run_instance(&self, spec: &InstanceSpec<'_>) -> Result<String> {
        let interfaces = json!([{
            "AssociatePublicIpAddress": true,
            "DeviceIndex": 0,
            "SubnetId": spec.subnet_id,
            "Groups": [spec.security_group_id],
        }])
        .to_string();
        let tags = json!([{
            "ResourceType": "instance",
            "Tags": [{ "Key": "Name", "Value": spec.name }],
        }])
        .to_string();
        let launched: RunInstances = self
            .call_json(&[
                "ec2",
                "run-instances",
                "--image-id",
                spec.image_id,
                "--count",
                "1",
                "--instance-type",
                spec.instance_type,
                "--key-name",
                spec.key_name,
                "--network-interfaces",
                &interfaces,
                "--tag-specifications",
                &tags,
            ])
            .await?;
        launched
            .instances
            .into_iter()
            .next()
            .map(|i| i.instance_id)
            .ok_or_else(|| anyhow::anyhow!("run-instances returned no instance"))
    }

    async fn wait_status_ok(&self, instance_ids: &[String]) -> Result<()> {
        let mut args = vec!["ec2", "wait", "instance-status-ok", "--instance-ids"];
        args.extend(instance_ids.iter().map(String::as_str));
        self.wait(&args).await
    }

    async fn describe_instances(
        &self,
        name_pattern: &str,
        filter: InstanceFilter,
    ) -> Result<Vec<Instance>> {
        let name = name_filter("tag:Name", name_pattern);
        let mut args = vec!["ec2", "describe-instances", "--filters", name.as_str()];
        if filter == InstanceFilter::Running {
            args.push("Name=instance-state-name,Values=running");
        }
        let found: Reservations = self.call_json(&args).await?;
        Ok(found
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .map(Instance::from)
            .collect())
    }
}
