//! Instances, naming convention and the master/slave topology.
//!
//! Pure functions only — no I/O, no async.

use serde::Serialize;

use crate::domain::error::TopologyError;

/// Cloud resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    #[must_use]
    pub fn name(value: &str) -> Self {
        Self {
            key: "Name".to_string(),
            value: value.to_string(),
        }
    }
}

/// A compute instance as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub id: String,
    pub state: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub public_dns: Option<String>,
    pub tags: Vec<Tag>,
}

impl Instance {
    /// Value of the `Name` tag, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == "Name")
            .map(|t| t.value.as_str())
    }
}

/// Derives every resource name from the project prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNaming {
    project: String,
}

impl ClusterNaming {
    #[must_use]
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
        }
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Prefix shared by all instance names.
    #[must_use]
    pub fn instance_prefix(&self) -> String {
        format!("{}-inst-", self.project)
    }

    #[must_use]
    pub fn instance_name(&self, ordinal: usize) -> String {
        format!("{}{ordinal}", self.instance_prefix())
    }

    /// The reserved master name: ordinal zero.
    #[must_use]
    pub fn master_name(&self) -> String {
        self.instance_name(0)
    }

    #[must_use]
    pub fn key_name(&self) -> String {
        format!("{}-key", self.project)
    }

    #[must_use]
    pub fn vpc_name(&self) -> String {
        format!("{}-vpc", self.project)
    }

    #[must_use]
    pub fn subnet_name(&self) -> String {
        format!("{}-subnet", self.project)
    }

    /// Security groups cannot be renamed or reused, so each run gets a fresh suffix.
    #[must_use]
    pub fn security_group_name(&self, unique: i64) -> String {
        format!("{}-{unique}", self.project)
    }

    /// Wildcard used by provider filters to find every project resource.
    #[must_use]
    pub fn filter_pattern(&self) -> String {
        format!("{}*", self.project)
    }
}

/// Hostname given to the master.
pub const MASTER_HOSTNAME: &str = "master";

/// Hostname of the slave at `index` in discovery order.
#[must_use]
pub fn slave_hostname(index: usize) -> String {
    format!("slave{index}")
}

/// One node of the resolved topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub instance_id: String,
    pub hostname: String,
    pub public_ip: String,
    pub private_ip: String,
}

impl Node {
    fn from_instance(instance: &Instance, hostname: String) -> Result<Self, TopologyError> {
        let address = |ip: &Option<String>, kind| {
            ip.clone().ok_or_else(|| TopologyError::MissingAddress {
                instance_id: instance.id.clone(),
                kind,
            })
        };
        Ok(Self {
            instance_id: instance.id.clone(),
            hostname,
            public_ip: address(&instance.public_ip, "public")?,
            private_ip: address(&instance.private_ip, "private")?,
        })
    }
}

/// One master plus the ordered slaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub master: Node,
    pub slaves: Vec<Node>,
}

impl Topology {
    /// Master first, then slaves in order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::once(&self.master).chain(self.slaves.iter())
    }

    #[must_use]
    pub fn slave_hostnames(&self) -> Vec<String> {
        self.slaves.iter().map(|s| s.hostname.clone()).collect()
    }
}

/// Classify instances into exactly one master and the ordered slaves.
///
/// The master is the single instance whose `Name` tag equals
/// [`ClusterNaming::master_name`]. Slaves are every other instance whose name
/// starts with the instance prefix, kept in discovery order, and named
/// `slave0`, `slave1`, ... in that order.
///
/// # Errors
///
/// Returns [`TopologyError::NoMaster`] or [`TopologyError::MultipleMasters`]
/// when the master is not unique, and [`TopologyError::MissingAddress`] when
/// a selected instance lacks a public or private address.
pub fn resolve(instances: &[Instance], naming: &ClusterNaming) -> Result<Topology, TopologyError> {
    let master_name = naming.master_name();
    let prefix = naming.instance_prefix();

    let masters: Vec<&Instance> = instances
        .iter()
        .filter(|i| i.name() == Some(master_name.as_str()))
        .collect();
    let master = match masters.as_slice() {
        [only] => *only,
        [] => return Err(TopologyError::NoMaster { master_name }),
        many => {
            let ids = many
                .iter()
                .map(|i| i.id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(TopologyError::MultipleMasters { master_name, ids });
        }
    };

    let slaves = instances
        .iter()
        .filter(|i| {
            i.name()
                .is_some_and(|n| n.starts_with(&prefix) && n != master_name)
        })
        .enumerate()
        .map(|(index, instance)| Node::from_instance(instance, slave_hostname(index)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Topology {
        master: Node::from_instance(master, MASTER_HOSTNAME.to_string())?,
        slaves,
    })
}
