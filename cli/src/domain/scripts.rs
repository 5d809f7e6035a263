//! Shell scripts run on the master.

use crate::domain::config::JobConfig;
use crate::domain::hadoop::HADOOP_TMP_DIR;

/// Commands that format HDFS and bring up every daemon, in order.
pub const CLUSTER_START: [&str; 4] = [
    "hdfs namenode -format",
    "start-dfs.sh",
    "start-master.sh",
    "start-slaves.sh",
];

/// `start.sh`: wipe the local and every slave's Hadoop temp directory, then
/// format HDFS and start the daemons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartScript {
    slaves: Vec<String>,
}

impl StartScript {
    #[must_use]
    pub fn for_slaves(slaves: &[String]) -> Self {
        Self {
            slaves: slaves.to_vec(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("rm -rf {HADOOP_TMP_DIR}*")];
        lines.extend(
            self.slaves
                .iter()
                .map(|s| format!("ssh {s} rm -rf {HADOOP_TMP_DIR}*")),
        );
        lines.extend(CLUSTER_START.iter().map(ToString::to_string));
        lines
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.lines().join("\n");
        out.push('\n');
        out
    }
}

/// One benchmark script invocation inside the benchmark directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStep {
    pub label: &'static str,
    pub script: &'static str,
    pub args: Vec<String>,
    /// Capture output instead of echoing it.
    pub hidden: bool,
}

impl JobStep {
    /// `cd <dir> ; source <script> <args>`.
    #[must_use]
    pub fn command(&self, bench_home: &str) -> String {
        let mut cmd = format!("cd {bench_home} ; source {}", self.script);
        for arg in &self.args {
            cmd.push(' ');
            cmd.push_str(arg);
        }
        cmd
    }
}

/// The fixed sequence: stop, compile, generate input, start, copy, run.
#[must_use]
pub fn job_steps(job: &JobConfig) -> Vec<JobStep> {
    let step = |label, script, args: Vec<String>, hidden| JobStep {
        label,
        script,
        args,
        hidden,
    };
    vec![
        step("stopping previous run", "stop.sh", vec![], true),
        step("compiling application", "comp.sh", vec![job.application.clone()], false),
        step(
            "generating input",
            "generate.sh",
            vec![job.input_file.clone(), job.input_size_exponent.to_string()],
            false,
        ),
        step("starting cluster", "start.sh", vec![], true),
        step("copying input", "copy.sh", vec![], false),
        step("running job", "run.sh", vec![], true),
    ]
}
