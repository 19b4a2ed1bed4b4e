//! Rebootstrap scenarios: baseline establishment, ordering, idempotence,
//! and the best-effort / required split.

use volharness::HarnessError;

use crate::helpers::env;

const NODES: &[&str] = &["node0", "node1", "node2"];

#[tokio::test]
async fn rebootstrap_establishes_baseline_from_dirty_cluster() {
    let env = env(NODES).await;
    env.cluster.seed_dirty_state(NODES);

    env.harness.rebootstrap().await.expect("rebootstrap");

    // old state is gone
    assert!(!env.cluster.volume_exists("stale/leftover"));
    assert!(!env.cluster.image_exists("stale.leftover"));
    assert!(!env.cluster.has_policy("stalepolicy"));
    for node in NODES {
        assert_eq!(env.cluster.container_count(node), 0);
    }

    // baseline state is present
    assert!(env.cluster.global_uploaded());
    assert!(env.cluster.has_policy("policy1"));
    for node in NODES {
        assert!(env.cluster.is_running(node, "volmaster"), "{node} master");
        assert!(env.cluster.is_running(node, "volplugin"), "{node} plugin");
    }
    assert!(env.cluster.is_running("node0", "volsupervisor"));
    assert!(
        !env.cluster.is_running("node1", "volsupervisor"),
        "supervisor only on the control node"
    );
}

#[tokio::test]
async fn rebootstrap_is_idempotent() {
    let env = env(NODES).await;
    env.harness.rebootstrap().await.expect("first rebootstrap");
    env.harness.rebootstrap().await.expect("second rebootstrap");
    assert!(env.cluster.has_policy("policy1"));
    assert!(env.cluster.global_uploaded());
}

#[tokio::test]
async fn rebootstrap_orders_teardown_before_baseline() {
    let env = env(NODES).await;
    env.cluster.seed_dirty_state(NODES);
    env.harness.rebootstrap().await.expect("rebootstrap");

    let sweep = env.cluster.position("docker ps -aq").expect("container sweep");
    let store_clear = env.cluster.position("etcdctl rm").expect("store clear");
    let restart = env
        .cluster
        .position("service docker restart")
        .expect("runtime restart");
    let global = env.cluster.position("global upload").expect("global upload");
    let master = env
        .cluster
        .position("nohup $(which volmaster)")
        .expect("master start");
    let policy = env.cluster.position("policy upload").expect("policy upload");

    assert!(sweep < store_clear, "containers removed before store clear");
    assert!(store_clear < restart, "store cleared before runtime restart");
    assert!(restart < global, "runtime restarted before global upload");
    assert!(global < master, "global uploaded before services start");
    assert!(master < policy, "services up before policy upload");
}

#[tokio::test]
async fn rebootstrap_survives_advisory_failures() {
    let env = env(NODES).await;
    // every node's container sweep and image maintenance breaks
    env.cluster.fail_on("docker ps -aq", 1, "cannot connect to daemon");
    env.cluster.fail_on("rbd showmapped", 1, "no keyring");

    env.harness.rebootstrap().await.expect("advisory failures tolerated");
    assert!(env.cluster.has_policy("policy1"));
}

#[tokio::test]
async fn rebootstrap_aborts_on_required_step_failure() {
    let env = env(NODES).await;
    env.cluster.seed_dirty_state(NODES);
    env.cluster.fail_on("etcdctl rm", 1, "connection refused");

    let err = env.harness.rebootstrap().await.unwrap_err();
    match err {
        HarnessError::Setup { step, output } => {
            assert_eq!(step, "coordination store clear");
            assert!(output.contains("connection refused"));
        }
        other => panic!("expected Setup, got {other}"),
    }
    // nothing after the failed step ran
    assert!(!env.cluster.contains("global upload"));
    assert!(!env.cluster.contains("nohup $(which volmaster)"));
}

#[tokio::test]
async fn rebootstrap_aborts_when_global_upload_fails() {
    let env = env(NODES).await;
    env.cluster.fail_on("global upload", 1, "store write rejected");

    let err = env.harness.rebootstrap().await.unwrap_err();
    assert!(matches!(err, HarnessError::Setup { .. }));
    assert!(
        !env.cluster.contains("nohup $(which volmaster)"),
        "services never started after a failed global upload"
    );
}

#[tokio::test]
async fn rebootstrap_aborts_when_a_service_never_comes_up() {
    let env = env(NODES).await;
    env.cluster.fail_on("nohup $(which volplugin)", 1, "exec format error");

    let err = env.harness.rebootstrap().await.unwrap_err();
    assert!(matches!(err, HarnessError::Remote(_)), "launch rejection surfaces");
    assert!(!env.cluster.has_policy("policy1"), "policy upload never reached");
}

#[tokio::test]
async fn clear_volumes_sweeps_runtime_references() {
    let env = env(NODES).await;
    env.harness.rebootstrap().await.expect("rebootstrap");
    env.harness
        .create_volume(
            "node1",
            &"policy1/sweepme".parse().expect("volume id"),
            &Default::default(),
        )
        .await
        .expect("create");

    let report = env.harness.clear_volumes().await;
    assert!(report.is_ok());
    assert_eq!(report.len(), NODES.len());
}

#[tokio::test]
async fn pull_image_reaches_every_node() {
    let env = env(NODES).await;
    env.harness.pull_image("alpine").await.expect("pull");
    for node in NODES {
        assert!(env.cluster.pulled(node, "alpine"), "{node} pulled");
    }
}

#[tokio::test]
async fn runtime_restart_touches_every_node() {
    let env = env(NODES).await;
    env.harness.rebootstrap().await.expect("rebootstrap");
    for node in NODES {
        assert_eq!(env.cluster.runtime_restarts(node), 1, "{node} restarted once");
    }
}

#[tokio::test]
async fn stopped_services_are_gone_before_masters_restart() {
    let env = env(NODES).await;
    env.cluster.seed_dirty_state(NODES);
    env.harness.rebootstrap().await.expect("rebootstrap");

    let plugin_stop = env.cluster.position("pkill volplugin").expect("plugin stop");
    let master_start = env
        .cluster
        .position("nohup $(which volmaster)")
        .expect("master start");
    assert!(plugin_stop < master_start);
}
