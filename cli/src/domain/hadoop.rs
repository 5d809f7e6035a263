//! Hadoop `*-site.xml` files built from typed property lists.

use std::fmt::Write as _;

/// One `<property>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
}

/// The `<configuration>` element of a Hadoop site file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteConfiguration {
    properties: Vec<Property>,
}

impl SiteConfiguration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == name) {
            existing.value = value;
        } else {
            self.properties.push(Property {
                name: name.to_string(),
                value,
                description: None,
            });
        }
        self
    }

    /// Attach a description to the most recently set property.
    #[must_use]
    pub fn described(mut self, description: &str) -> Self {
        if let Some(last) = self.properties.last_mut() {
            last.description = Some(description.to_string());
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Render the `<configuration>` element.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("<configuration>\n");
        for p in &self.properties {
            out.push_str("    <property>\n");
            let _ = writeln!(out, "        <name>{}</name>", escape(&p.name));
            let _ = writeln!(out, "        <value>{}</value>", escape(&p.value));
            if let Some(d) = &p.description {
                let _ = writeln!(out, "        <description>{}</description>", escape(d));
            }
            out.push_str("    </property>\n");
        }
        out.push_str("</configuration>\n");
        out
    }

    /// Replace the `<configuration>` element of `existing` with this one.
    ///
    /// The XML declaration, stylesheet and license comments that precede the
    /// element are kept.
    #[must_use]
    pub fn patch(&self, existing: &str) -> String {
        let mut out = String::new();
        let mut inside = false;
        for line in existing.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("<configuration") {
                inside = !trimmed.contains("</configuration>") && !trimmed.ends_with("/>");
                continue;
            }
            if inside {
                if trimmed.contains("</configuration>") {
                    inside = false;
                }
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.render());
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Extract `name -> value` pairs from a rendered site file.
#[must_use]
pub fn parse_properties(xml: &str) -> Vec<(String, String)> {
    let tag = |line: &str, name: &str| {
        let open = format!("<{name}>");
        let close = format!("</{name}>");
        let start = line.find(&open)? + open.len();
        let end = line[start..].find(&close)? + start;
        Some(line[start..end].trim().to_string())
    };
    let mut pairs = Vec::new();
    let mut name: Option<String> = None;
    for line in xml.lines() {
        if let Some(n) = tag(line, "name") {
            name = Some(n);
        } else if let Some(v) = tag(line, "value")
            && let Some(n) = name.take()
        {
            pairs.push((n, v));
        }
    }
    pairs
}

/// Name node address every node points at.
pub const DEFAULT_FS: &str = "hdfs://master:54310";
pub const HADOOP_TMP_DIR: &str = "/tmp/hadoop";

/// `core-site.xml`: default file system and temp directory.
#[must_use]
pub fn core_site() -> SiteConfiguration {
    SiteConfiguration::new()
        .set("hadoop.tmp.dir", HADOOP_TMP_DIR)
        .described("A base for other temporary directories.")
        .set("fs.defaultFS", DEFAULT_FS)
}

/// `hdfs-site.xml`: replication factor and block size.
#[must_use]
pub fn hdfs_site() -> SiteConfiguration {
    SiteConfiguration::new()
        .set("dfs.replication", 1)
        .set("dfs.block.size", 64 * 1024 * 1024)
}
