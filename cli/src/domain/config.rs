//! Cluster configuration schema, defaults and validators.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "project",
    "region",
    "instance_count",
    "instance_type",
    "vpc_cidr",
];

const UBUNTU_AMI_PARAMETER: &str =
    "/aws/service/canonical/ubuntu/server/20.04/stable/current/amd64/hvm/ebs-gp2/ami-id";
const SOFTWARE_MIRROR: &str = "http://sd-127206.dedibox.fr/hagimont";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.sparkctl/config.yaml`.
///
/// Every field has a compiled-in default; the file only needs to list overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterConfig {
    /// Prefix for every cloud resource name and the local key directory.
    pub project: String,
    /// AWS region; `None` defers to the AWS CLI profile.
    pub region: Option<String>,
    /// Total instances, master included.
    pub instance_count: usize,
    pub instance_type: String,
    /// CIDR block shared by the VPC and its single subnet.
    pub vpc_cidr: String,
    /// Public SSM parameter holding the AMI id.
    pub image_parameter: String,
    /// Login user on the instances.
    pub ssh_user: String,
    pub software: SoftwareConfig,
    pub job: JobConfig,
    pub timeouts: TimeoutConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            project: "cbdproject".to_string(),
            region: None,
            instance_count: 3,
            instance_type: "t2.medium".to_string(),
            vpc_cidr: "10.0.0.0/24".to_string(),
            image_parameter: UBUNTU_AMI_PARAMETER.to_string(),
            ssh_user: "ubuntu".to_string(),
            software: SoftwareConfig::default(),
            job: JobConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// A software archive fetched onto the shared mount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Archive {
    /// File name under the shared mount; must end in `.tar.gz`.
    pub file: String,
    pub url: String,
}

/// Where the software stack comes from and where it lands on every node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SoftwareConfig {
    pub archives: Vec<Archive>,
    /// Directory exported by the master and mounted by every slave.
    pub shared_dir: String,
    /// Home directory of `ssh_user` on the instances.
    pub home_dir: String,
    pub jdk_dir: String,
    pub hadoop_dir: String,
    pub spark_dir: String,
    /// Directory holding the benchmark scripts (`start.sh`, `run.sh`, ...).
    pub bench_dir: String,
}

impl Default for SoftwareConfig {
    fn default() -> Self {
        let archive = |file: &str, path: &str| Archive {
            file: file.to_string(),
            url: format!("{SOFTWARE_MIRROR}/{path}"),
        };
        Self {
            archives: vec![
                archive("jdk.tar.gz", "software/jdk-8u221-linux-x64.tar.gz"),
                archive("hadoop.tar.gz", "software/hadoop-2.7.1.tar.gz"),
                archive("spark.tar.gz", "software/spark-2.4.3-bin-hadoop2.7.tgz"),
                archive(
                    "ressources.tar.gz",
                    "resources-N7/bigdata/sujet-tp-scale.tgz",
                ),
            ],
            shared_dir: "/mnt/nfs".to_string(),
            home_dir: "/home/ubuntu".to_string(),
            jdk_dir: "jdk1.8.0_221".to_string(),
            hadoop_dir: "hadoop-2.7.1".to_string(),
            spark_dir: "spark-2.4.3-bin-hadoop2.7".to_string(),
            bench_dir: "sujet-tp-scale".to_string(),
        }
    }
}

impl SoftwareConfig {
    #[must_use]
    pub fn jdk_home(&self) -> String {
        format!("{}/{}", self.home_dir, self.jdk_dir)
    }

    #[must_use]
    pub fn hadoop_home(&self) -> String {
        format!("{}/{}", self.home_dir, self.hadoop_dir)
    }

    #[must_use]
    pub fn spark_home(&self) -> String {
        format!("{}/{}", self.home_dir, self.spark_dir)
    }

    #[must_use]
    pub fn bench_home(&self) -> String {
        format!("{}/{}", self.home_dir, self.bench_dir)
    }

    /// `etc/hadoop` inside the Hadoop tree.
    #[must_use]
    pub fn hadoop_conf_dir(&self) -> String {
        format!("{}/etc/hadoop", self.hadoop_home())
    }

    #[must_use]
    pub fn spark_conf_dir(&self) -> String {
        format!("{}/conf", self.spark_home())
    }
}

/// Benchmark job parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobConfig {
    /// Application source compiled by `comp.sh`.
    pub application: String,
    /// Generated input holds 2^`input_size_exponent` bits.
    pub input_size_exponent: u32,
    pub input_file: String,
    /// Prefix of the output line that carries the execution time.
    pub timing_marker: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            application: "wordcount.java".to_string(),
            input_size_exponent: 22,
            input_file: "filesample.txt".to_string(),
            timing_marker: "time in ms".to_string(),
        }
    }
}

/// Upper bounds for spawned processes, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Single AWS CLI call.
    pub aws_secs: u64,
    /// AWS CLI waiters (`instance-status-ok` can take several minutes).
    pub wait_secs: u64,
    /// Single remote command; downloads and the benchmark run are long.
    pub remote_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            aws_secs: 60,
            wait_secs: 1800,
            remote_secs: 3600,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn aws(&self) -> Duration {
        Duration::from_secs(self.aws_secs)
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    #[must_use]
    pub fn remote(&self) -> Duration {
        Duration::from_secs(self.remote_secs)
    }
}

impl ClusterConfig {
    /// Check invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for the first offending field.
    pub fn validate(&self) -> Result<()> {
        validate_config_value("project", &self.project)?;
        validate_config_value("instance_count", &self.instance_count.to_string())?;
        validate_config_value("instance_type", &self.instance_type)?;
        validate_config_value("vpc_cidr", &self.vpc_cidr)?;
        if let Some(region) = &self.region {
            validate_config_value("region", region)?;
        }
        for archive in &self.software.archives {
            if !archive.file.ends_with(".tar.gz") {
                return Err(ConfigError::InvalidField {
                    field: "software.archives".to_string(),
                    value: archive.file.clone(),
                    reason: "Archive file names must end in .tar.gz".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Apply a whitelisted `key = value` override.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "project" => self.project = value.to_string(),
            "region" => self.region = Some(value.to_string()),
            "instance_count" => self.instance_count = value.parse()?,
            "instance_type" => self.instance_type = value.to_string(),
            "vpc_cidr" => self.vpc_cidr = value.to_string(),
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    match key {
        "project" => {
            let ok = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !ok {
                return Err(invalid(
                    key,
                    value,
                    "Use lowercase letters, digits and '-' only",
                ));
            }
        }
        "instance_count" => match value.parse::<usize>() {
            Ok(n) if n >= 2 => {}
            _ => {
                return Err(invalid(
                    key,
                    value,
                    "A cluster needs at least 2 instances (one master, one slave)",
                ));
            }
        },
        "instance_type" | "region" => {
            if value.trim().is_empty() || value.contains(char::is_whitespace) {
                return Err(invalid(key, value, "Value must be a single non-empty word"));
            }
        }
        "vpc_cidr" => {
            if !is_ipv4_cidr(value) {
                return Err(invalid(key, value, "Expected an IPv4 CIDR such as 10.0.0.0/24"));
            }
        }
        _ => {}
    }
    Ok(())
}

fn invalid(key: &str, value: &str, reason: &str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn is_ipv4_cidr(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    let octets_ok = addr.split('.').count() == 4 && addr.split('.').all(|o| o.parse::<u8>().is_ok());
    octets_ok && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
