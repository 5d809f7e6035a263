//! Benchmark job: the fixed script sequence on the master and timing parsing.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{
    ProgressReporter, RemoteShell, SessionOpener, Visibility, close_after, run_checked,
};
use crate::application::services::deploy::DeployedCluster;
use crate::domain::ExecutionTime;
use crate::domain::config::{JobConfig, SoftwareConfig};
use crate::domain::job::parse_execution_time;
use crate::domain::scripts::job_steps;

/// Output of the benchmark stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub master: String,
    pub slaves: usize,
    pub execution_time: ExecutionTime,
}

/// Run every job step in `bench_home` and return the output of the last one.
///
/// A failing first step (stopping a previous run) only warns: there may be
/// nothing to stop.
///
/// # Errors
///
/// Returns an error if any other step fails.
pub async fn run_job(
    shell: &impl RemoteShell,
    software: &SoftwareConfig,
    job: &JobConfig,
    reporter: &impl ProgressReporter,
) -> Result<String> {
    let bench_home = software.bench_home();
    let steps = job_steps(job);
    let mut last_output = String::new();
    for (index, step) in steps.iter().enumerate() {
        reporter.step(&format!("{}...", step.label));
        let visibility = if step.hidden {
            Visibility::Hidden
        } else {
            Visibility::Shown
        };
        let command = step.command(&bench_home);
        if index == 0 {
            let output = shell.run(&command, visibility).await?;
            if !output.status.success() {
                reporter.warn(&format!("{} exited with {}", step.script, output.status));
            }
            continue;
        }
        last_output = run_checked(shell, &command, visibility)
            .await
            .with_context(|| format!("{} failed", step.label))?;
    }
    Ok(last_output)
}

/// Run the benchmark on the master and parse its execution time.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or a job step fails.
/// A missing timing line is not an error.
pub async fn run_benchmark<O: SessionOpener>(
    opener: &O,
    cluster: &DeployedCluster,
    software: &SoftwareConfig,
    job: &JobConfig,
    reporter: &impl ProgressReporter,
) -> Result<JobReport> {
    let master = opener.open(&cluster.topology.master.public_ip).await?;
    let result = run_job(&master, software, job, reporter).await;
    let output = close_after(master, result).await?;

    let execution_time = parse_execution_time(&output, &job.timing_marker);
    match &execution_time {
        ExecutionTime::Measured { .. } => reporter.success(&format!("execution time: {execution_time}")),
        ExecutionTime::Undefined => reporter.warn("job output had no timing line"),
    }
    Ok(JobReport {
        master: cluster.topology.master.public_ip.clone(),
        slaves: cluster.topology.slaves.len(),
        execution_time,
    })
}
