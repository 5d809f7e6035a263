//! The whole pipeline against a fake provider and fake hosts.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::Ipv4Addr;

use sparkctl::application::services::pipeline::run_pipeline;
use sparkctl::domain::ExecutionTime;
use sparkctl::domain::config::ClusterConfig;
use sparkctl::infra::keys::PemKeyStore;
use tempfile::TempDir;

use crate::mocks::{CLUSTER_PUBLIC_KEY, FakeCloud, FakeCluster, FixedLookup, RecordingReporter};

const MASTER: &str = "203.0.113.10";
const SLAVES: [&str; 2] = ["203.0.113.11", "203.0.113.12"];
const HOME: &str = "/home/ubuntu";

fn config() -> ClusterConfig {
    ClusterConfig {
        project: "demo".to_string(),
        ..ClusterConfig::default()
    }
}

#[tokio::test]
async fn test_three_node_cluster_reports_job_time() {
    let dir = TempDir::new().unwrap();
    let keys = PemKeyStore::in_dir(dir.path().join(".demo"));
    let cloud = FakeCloud::new();
    let cluster = FakeCluster::new("INFO starting\ntime in ms: 4213\n");
    let reporter = RecordingReporter::default();

    let report = run_pipeline(
        &cloud,
        &keys,
        &FixedLookup(Some(Ipv4Addr::new(198, 51, 100, 7))),
        |_| cluster.clone(),
        &config(),
        &reporter,
    )
    .await
    .expect("pipeline");

    assert_eq!(report.provisioned.instances.len(), 3);
    assert_eq!(report.provisioned.ssh_source, "198.51.100.7/32");
    assert!(report.provisioned.key_path.exists());
    assert_eq!(report.job.master, MASTER);
    assert_eq!(report.job.slaves, 2);
    assert!(report.job.execution_time.to_string().contains("4213"));
    assert_eq!(report.job.execution_time.millis(), Some(4213));
    assert!(reporter.warnings.borrow().is_empty(), "{:?}", reporter.warnings.borrow());
}

#[tokio::test]
async fn test_every_node_resolves_every_hostname() {
    let dir = TempDir::new().unwrap();
    let keys = PemKeyStore::in_dir(dir.path().to_path_buf());
    let cluster = FakeCluster::new("time in ms: 1\n");

    run_pipeline(
        &FakeCloud::new(),
        &keys,
        &FixedLookup(None),
        |_| cluster.clone(),
        &config(),
        &RecordingReporter::default(),
    )
    .await
    .expect("pipeline");

    for host in std::iter::once(MASTER).chain(SLAVES) {
        let hosts = cluster.file(host, "/etc/hosts").expect("hosts file");
        for entry in ["10.0.0.10 master", "10.0.0.11 slave0", "10.0.0.12 slave1"] {
            assert!(hosts.lines().any(|l| l == entry), "{host} lacks {entry}:\n{hosts}");
        }
    }
    for (host, name) in SLAVES.iter().zip(["slave0", "slave1"]) {
        let keys = cluster.file(host, "~/.ssh/authorized_keys").expect("authorized_keys");
        assert!(keys.contains(CLUSTER_PUBLIC_KEY));
        assert!(
            cluster
                .commands(host)
                .contains(&format!("hostnamectl set-hostname {name}"))
        );
    }
}

#[tokio::test]
async fn test_master_is_configured_before_slaves_at_each_stage() {
    let dir = TempDir::new().unwrap();
    let cluster = FakeCluster::new("time in ms: 1\n");

    run_pipeline(
        &FakeCloud::new(),
        &PemKeyStore::in_dir(dir.path().to_path_buf()),
        &FixedLookup(None),
        |_| cluster.clone(),
        &config(),
        &RecordingReporter::default(),
    )
    .await
    .expect("pipeline");

    let stage = [MASTER, SLAVES[0], SLAVES[1]];
    let mut expected = Vec::new();
    expected.extend(stage);
    expected.extend(stage);
    expected.push(MASTER);
    assert_eq!(cluster.opened(), expected);
}

#[tokio::test]
async fn test_deploy_writes_worker_lists_and_start_script() {
    let dir = TempDir::new().unwrap();
    let cluster = FakeCluster::new("time in ms: 1\n");

    run_pipeline(
        &FakeCloud::new(),
        &PemKeyStore::in_dir(dir.path().to_path_buf()),
        &FixedLookup(None),
        |_| cluster.clone(),
        &config(),
        &RecordingReporter::default(),
    )
    .await
    .expect("pipeline");

    let spark_slaves = cluster
        .file(MASTER, &format!("{HOME}/spark-2.4.3-bin-hadoop2.7/conf/slaves"))
        .expect("spark slaves");
    assert!(spark_slaves.contains("slave0\nslave1"), "{spark_slaves}");
    assert!(!spark_slaves.contains("localhost"));

    let start = cluster
        .file(MASTER, &format!("{HOME}/sujet-tp-scale/start.sh"))
        .expect("start.sh");
    assert!(start.contains("ssh slave1 rm -rf /tmp/hadoop*"));
    assert!(start.ends_with("start-slaves.sh\n"));

    for slave in SLAVES {
        assert!(
            cluster
                .commands(slave)
                .iter()
                .any(|c| c.contains("mount -t nfs 10.0.0.10:/mnt/nfs /mnt/nfs"))
        );
        let core_site = cluster
            .file(slave, &format!("{HOME}/hadoop-2.7.1/etc/hadoop/core-site.xml"))
            .expect("core-site");
        assert!(core_site.contains("hdfs://master:54310"));
    }
}

#[tokio::test]
async fn test_missing_timing_line_reports_undefined() {
    let dir = TempDir::new().unwrap();
    let reporter = RecordingReporter::default();

    let report = run_pipeline(
        &FakeCloud::new(),
        &PemKeyStore::in_dir(dir.path().to_path_buf()),
        &FixedLookup(Some(Ipv4Addr::new(198, 51, 100, 7))),
        |_| FakeCluster::new("job finished\n"),
        &config(),
        &reporter,
    )
    .await
    .expect("pipeline");

    assert_eq!(report.job.execution_time, ExecutionTime::Undefined);
    assert_eq!(report.job.execution_time.to_string(), "Undefined");
    assert_eq!(reporter.warnings.borrow().len(), 1);
}

#[tokio::test]
async fn test_unreachable_slave_stops_pipeline_after_master() {
    let dir = TempDir::new().unwrap();
    let cluster = FakeCluster::new("").unreachable(SLAVES[1]);

    let err = run_pipeline(
        &FakeCloud::new(),
        &PemKeyStore::in_dir(dir.path().to_path_buf()),
        &FixedLookup(None),
        |_| cluster.clone(),
        &config(),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("slave1 unreachable");

    assert!(format!("{err:#}").contains(SLAVES[1]));
    assert!(cluster.file(MASTER, "~/.ssh/cluster-key.pub").is_some());
    assert!(cluster.file(SLAVES[0], "~/.ssh/authorized_keys").is_some());
    assert!(cluster.file(MASTER, "/etc/exports").is_none());
}
