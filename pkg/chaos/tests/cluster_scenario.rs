//! Chaos and scheduling phases run against one shared cluster.

use pkg_chaos::{ChaosManager, EventResult};
use pkg_scheduler::Scheduler;
use pkg_types::cluster::ClusterState;
use pkg_types::node::Node;
use pkg_types::pod::{Pod, PodPhase, ResourceRequirements};
use serde_json::json;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn make_node(id: &str) -> Node {
    let res = ResourceRequirements::new(4.0, 8.0 * GIB);
    Node::new(id, res, res)
}

fn make_pod(id: &str, cpu: f64) -> Pod {
    let requests = ResourceRequirements::new(cpu, GIB);
    let limits = ResourceRequirements::new(cpu * 2.0, 2.0 * GIB);
    Pod::new(id, "web", "default", requests, limits)
}

#[test]
fn drained_node_is_skipped_on_next_pass() {
    let mut cluster = ClusterState::new();
    cluster.insert_node(make_node("n1")).unwrap();
    cluster.insert_node(make_node("n2")).unwrap();
    cluster.insert_pod(make_pod("p1", 2.0)).unwrap();

    let scheduler = Scheduler::new();
    let chaos = ChaosManager::new(vec![json!({"tick": 1, "type": "node_drain", "node_id": "n1"})]);

    // tick 0
    assert!(chaos.execute_events_for_tick(&mut cluster, 0).is_empty());
    let summary = scheduler.schedule_all_pending(&mut cluster).unwrap();
    assert_eq!(summary.scheduled_count, 1);
    let p1 = cluster.pod("p1").unwrap();
    assert_eq!(p1.phase(), PodPhase::Running);
    assert_eq!(p1.assigned_node(), Some("n1"));
    assert_eq!(cluster.node("n1").unwrap().usage().cpu, 2.0);

    // tick 1
    let outcomes = chaos.execute_events_for_tick(&mut cluster, 1);
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].result, EventResult::Executed(_)));

    cluster.insert_pod(make_pod("p2", 3.0)).unwrap();
    let summary = scheduler.schedule_all_pending(&mut cluster).unwrap();
    assert_eq!(summary.scheduled_count, 1);
    assert_eq!(summary.unschedulable_count, 0);
    // n1 still has 2 cores free but is cordoned
    assert_eq!(cluster.pod("p2").unwrap().assigned_node(), Some("n2"));
    assert_eq!(cluster.pod("p1").unwrap().assigned_node(), Some("n1"));
}

#[test]
fn oom_crash_then_schedule_leaves_crashed_pod_alone() {
    let mut cluster = ClusterState::new();
    cluster.insert_node(make_node("n1")).unwrap();
    cluster.insert_pod(make_pod("p1", 1.0)).unwrap();
    cluster.insert_pod(make_pod("p2", 1.0)).unwrap();

    let scheduler = Scheduler::new();
    scheduler.schedule_all_pending(&mut cluster).unwrap();

    let chaos = ChaosManager::new(vec![json!({
        "tick": 5,
        "type": "oom_storm",
        "pod_ids": ["p1", "p2", "p3"],
        "memory_increase": 1.5 * GIB,
    })]);
    let outcomes = chaos.execute_events_for_tick(&mut cluster, 5);
    assert!(outcomes[0].result.is_executed());

    for id in ["p1", "p2"] {
        let pod = cluster.pod(id).unwrap();
        assert_eq!(pod.phase(), PodPhase::CrashLoop);
        assert_eq!(pod.restart_count(), 1);
    }

    let summary = scheduler.schedule_all_pending(&mut cluster).unwrap();
    assert_eq!(summary.scheduled_count, 0);
    assert_eq!(summary.unschedulable_count, 0);
}

#[test]
fn identical_runs_produce_identical_state() {
    let build = || {
        let mut cluster = ClusterState::new();
        for id in ["n3", "n1", "n2"] {
            cluster.insert_node(make_node(id)).unwrap();
        }
        for i in 0..10 {
            cluster
                .insert_pod(make_pod(&format!("p{i}"), 1.0 + (i % 2) as f64))
                .unwrap();
        }
        cluster
    };
    let schedule = vec![
        json!({"tick": 0, "type": "node_cordon", "node_id": "n2"}),
        json!({"tick": 1, "type": "burst_traffic", "pod_ids": ["p0", "p1"], "cpu_increase": 0.5}),
        json!({"tick": 2, "type": "pod_crash", "pod_id": "p3"}),
    ];

    let run = |mut cluster: ClusterState| {
        let scheduler = Scheduler::new();
        let chaos = ChaosManager::new(schedule.clone());
        let mut log = Vec::new();
        for tick in 0..3 {
            log.push(serde_json::to_value(chaos.execute_events_for_tick(&mut cluster, tick)).unwrap());
            log.push(serde_json::to_value(scheduler.schedule_all_pending(&mut cluster).unwrap()).unwrap());
        }
        (cluster, log)
    };

    assert_eq!(run(build()), run(build()));
}
