//! Property tests for topology resolution.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use sparkctl::domain::{ClusterNaming, Instance, resolve};

use crate::mocks::instance;

/// `count` instances of project `demo` with the master at `master_at`.
fn cluster(count: usize, master_at: usize) -> Vec<Instance> {
    (0..count)
        .map(|i| {
            let name = if i == master_at {
                "demo-inst-0".to_string()
            } else {
                format!("demo-inst-{}", i + 1)
            };
            instance(&format!("i-{i}"), &name, u8::try_from(10 + i).unwrap())
        })
        .collect()
}

proptest! {
    /// Slaves keep discovery order and are numbered from zero.
    #[test]
    fn prop_slaves_follow_discovery_order(count in 1usize..20, seed in 0usize..20) {
        let master_at = seed % count;
        let instances = cluster(count, master_at);
        let topology = resolve(&instances, &ClusterNaming::new("demo")).expect("resolves");

        prop_assert_eq!(&topology.master.instance_id, &format!("i-{master_at}"));
        prop_assert_eq!(topology.master.hostname.as_str(), "master");
        prop_assert_eq!(topology.slaves.len(), count - 1);

        let expected_ids: Vec<String> = (0..count)
            .filter(|i| *i != master_at)
            .map(|i| format!("i-{i}"))
            .collect();
        let ids: Vec<String> = topology.slaves.iter().map(|s| s.instance_id.clone()).collect();
        prop_assert_eq!(ids, expected_ids);
        for (index, slave) in topology.slaves.iter().enumerate() {
            prop_assert_eq!(&slave.hostname, &format!("slave{index}"));
        }
    }

    /// Every node appears exactly once, master first.
    #[test]
    fn prop_nodes_cover_every_instance_once(count in 1usize..20, seed in 0usize..20) {
        let instances = cluster(count, seed % count);
        let topology = resolve(&instances, &ClusterNaming::new("demo")).expect("resolves");
        let mut ids: Vec<&str> = topology.nodes().map(|n| n.instance_id.as_str()).collect();
        prop_assert_eq!(ids[0], topology.master.instance_id.as_str());
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), count);
    }

    /// Instances of another project never join the topology.
    #[test]
    fn prop_foreign_instances_are_ignored(count in 1usize..10) {
        let mut instances = cluster(count, 0);
        instances.push(instance("i-x", "demox-inst-0", 99));
        instances.push(instance("i-y", "other-inst-3", 98));
        let topology = resolve(&instances, &ClusterNaming::new("demo")).expect("resolves");
        prop_assert!(topology.nodes().all(|n| n.instance_id != "i-x" && n.instance_id != "i-y"));
        prop_assert_eq!(topology.nodes().count(), count);
    }
}
