//! Security group ingress rules for the cluster.

use std::net::Ipv4Addr;

use serde_json::{Value, json};

/// Anywhere on the internet.
pub const ANYWHERE: &str = "0.0.0.0/0";

/// Web UI of the HDFS name node.
pub const NAMENODE_UI_PORT: u16 = 50070;

/// Where allowed traffic may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Cidr(String),
    /// Members of the given security group.
    Group(String),
}

/// One inbound permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    /// `None` means every protocol and port.
    pub tcp_port: Option<u16>,
    pub source: Source,
}

impl IngressRule {
    fn tcp(port: u16, cidr: &str) -> Self {
        Self {
            tcp_port: Some(port),
            source: Source::Cidr(cidr.to_string()),
        }
    }

    /// Render as an element of the EC2 `IpPermissions` list.
    #[must_use]
    pub fn to_ip_permission(&self) -> Value {
        let mut permission = match self.tcp_port {
            Some(port) => json!({ "IpProtocol": "tcp", "FromPort": port, "ToPort": port }),
            None => json!({ "IpProtocol": "-1" }),
        };
        match &self.source {
            Source::Cidr(cidr) => permission["IpRanges"] = json!([{ "CidrIp": cidr }]),
            Source::Group(id) => permission["UserIdGroupPairs"] = json!([{ "GroupId": id }]),
        }
        permission
    }
}

/// SSH source range: the caller's address, or anywhere when it is unknown.
#[must_use]
pub fn ssh_source(caller: Option<Ipv4Addr>) -> String {
    caller.map_or_else(|| ANYWHERE.to_string(), |ip| format!("{ip}/32"))
}

/// The fixed rule set: public HTTP(S), restricted SSH and name node UI,
/// unrestricted traffic between group members.
#[must_use]
pub fn cluster_ingress_rules(ssh_cidr: &str, group_id: &str) -> Vec<IngressRule> {
    vec![
        IngressRule::tcp(80, ANYWHERE),
        IngressRule::tcp(443, ANYWHERE),
        IngressRule::tcp(22, ssh_cidr),
        IngressRule {
            tcp_port: None,
            source: Source::Group(group_id.to_string()),
        },
        IngressRule::tcp(NAMENODE_UI_PORT, ssh_cidr),
    ]
}

/// Render a rule set as the JSON document accepted by `--ip-permissions`.
#[must_use]
pub fn ip_permissions(rules: &[IngressRule]) -> Value {
    Value::Array(rules.iter().map(IngressRule::to_ip_permission).collect())
}
