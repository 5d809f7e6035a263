//! Environment files: `/etc/environment`, `spark-env.sh`, `hadoop-env.sh`.

use crate::domain::config::SoftwareConfig;
use crate::domain::network::MANAGED_MARKER;
use crate::domain::text::replace_managed_block;

pub const SYSTEM_ENVIRONMENT: &str = "/etc/environment";

/// Stock Ubuntu search path, kept after the cluster tool directories.
/// Written literally: `/etc/environment` is not shell-expanded, so the
/// node's current `$PATH` cannot be appended there.
const BASE_PATH: &str =
    "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin:/usr/games:/usr/local/games:/snap/bin";

/// Ordered `KEY=value` assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentFile {
    vars: Vec<(String, String)>,
}

impl EnvironmentFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((key.to_string(), value)),
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Lines as `KEY=value`.
    #[must_use]
    pub fn assignments(&self) -> Vec<String> {
        self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// Lines as `export KEY=value`.
    #[must_use]
    pub fn exports(&self) -> Vec<String> {
        self.vars
            .iter()
            .map(|(k, v)| format!("export {k}={v}"))
            .collect()
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.assignments().join("\n");
        out.push('\n');
        out
    }
}

/// Whole content of `/etc/environment` on every node.
#[must_use]
pub fn system_environment(software: &SoftwareConfig) -> EnvironmentFile {
    let hadoop = software.hadoop_home();
    let spark = software.spark_home();
    let jdk = software.jdk_home();
    let path = format!("{hadoop}/bin:{hadoop}/sbin:{spark}/bin:{spark}/sbin:{jdk}/bin:{BASE_PATH}");
    EnvironmentFile::new()
        .var("JAVA_HOME", jdk)
        .var("SPARK_HOME", spark)
        .var("HADOOP_HOME", hadoop)
        .var("PATH", path)
}

/// Overrides appended to Spark's environment template.
#[must_use]
pub fn spark_env_overrides(software: &SoftwareConfig) -> EnvironmentFile {
    EnvironmentFile::new()
        .var("SPARK_MASTER_HOST", crate::domain::cluster::MASTER_HOSTNAME)
        .var("JAVA_HOME", software.jdk_home())
}

/// `spark-env.sh` = template + managed override block.
#[must_use]
pub fn patch_spark_env(template: &str, software: &SoftwareConfig) -> String {
    replace_managed_block(template, MANAGED_MARKER, &spark_env_overrides(software).exports())
}

/// `hadoop-env.sh` with `${JAVA_HOME}` pinned to the extracted JDK.
///
/// The stock script only forwards the login environment, which non-interactive
/// SSH sessions started by `start-dfs.sh` do not have.
#[must_use]
pub fn patch_hadoop_env(existing: &str, software: &SoftwareConfig) -> String {
    existing.replace("${JAVA_HOME}", &software.jdk_home())
}
