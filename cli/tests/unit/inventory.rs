//! `status` inventory over the fake provider.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use sparkctl::application::services::inventory::collect;
use sparkctl::application::services::provision::provision_cluster;
use sparkctl::domain::ClusterNaming;
use sparkctl::domain::config::ClusterConfig;
use sparkctl::infra::keys::PemKeyStore;
use tempfile::TempDir;

use crate::mocks::{FakeCloud, FixedLookup, RecordingReporter, instance};

#[tokio::test]
async fn test_empty_project_has_no_topology_and_no_error() {
    let inventory = collect(&FakeCloud::new(), &ClusterNaming::new("demo"))
        .await
        .expect("inventory");
    assert!(inventory.instances.is_empty());
    assert!(inventory.topology.is_none());
    assert!(inventory.topology_error.is_none());
}

#[tokio::test]
async fn test_provisioned_project_lists_every_resource() {
    let dir = TempDir::new().unwrap();
    let cloud = FakeCloud::new();
    provision_cluster(
        &cloud,
        &PemKeyStore::in_dir(dir.path().to_path_buf()),
        &FixedLookup(None),
        &ClusterConfig {
            project: "demo".to_string(),
            ..ClusterConfig::default()
        },
        &RecordingReporter::default(),
    )
    .await
    .expect("provision");

    let inventory = collect(&cloud, &ClusterNaming::new("demo"))
        .await
        .expect("inventory");
    assert_eq!(inventory.project, "demo");
    assert_eq!(inventory.instances.len(), 3);
    assert_eq!(inventory.vpcs, ["vpc-1"]);
    assert_eq!(inventory.key_pairs, ["demo-key"]);
    assert_eq!(inventory.security_groups.len(), 1);
    assert!(inventory.security_groups[0].name.starts_with("demo-"));
    let topology = inventory.topology.expect("topology");
    assert_eq!(topology.master.hostname, "master");
    assert_eq!(topology.slave_hostnames(), ["slave0", "slave1"]);
}

#[tokio::test]
async fn test_two_masters_are_reported_not_fatal() {
    let cloud = FakeCloud::new().with_instances(vec![
        instance("i-1", "demo-inst-0", 10),
        instance("i-2", "demo-inst-0", 11),
        instance("i-3", "demo-inst-1", 12),
    ]);
    let inventory = collect(&cloud, &ClusterNaming::new("demo"))
        .await
        .expect("inventory");
    assert_eq!(inventory.instances.len(), 3);
    assert!(inventory.topology.is_none());
    let reason = inventory.topology_error.expect("reason");
    assert!(reason.contains("i-1, i-2"), "{reason}");
}

#[tokio::test]
async fn test_other_projects_are_filtered_out() {
    let cloud = FakeCloud::new().with_instances(vec![
        instance("i-1", "demo-inst-0", 10),
        instance("i-2", "other-inst-0", 11),
    ]);
    let inventory = collect(&cloud, &ClusterNaming::new("demo"))
        .await
        .expect("inventory");
    assert_eq!(inventory.instances.len(), 1);
    assert!(inventory.topology.expect("topology").slaves.is_empty());
}

#[tokio::test]
async fn test_inventory_serializes_without_empty_error() {
    let cloud = FakeCloud::new().with_instances(vec![instance("i-1", "demo-inst-0", 10)]);
    let inventory = collect(&cloud, &ClusterNaming::new("demo"))
        .await
        .expect("inventory");
    let value = serde_json::to_value(&inventory).expect("json");
    assert!(value.get("topology_error").is_none());
    assert_eq!(value["topology"]["master"]["public_ip"], "203.0.113.10");
}
