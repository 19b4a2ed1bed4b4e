//! Service crash / restart scenarios.

use std::collections::BTreeMap;

use volharness::{ServiceKind, VolumeId};

use crate::helpers::{TestEnv, env};

const NODES: &[&str] = &["node0", "node1", "node2"];

async fn ready_env() -> TestEnv {
    let env = env(NODES).await;
    env.harness.rebootstrap().await.expect("rebootstrap");
    env
}

#[tokio::test]
async fn volume_creation_fails_while_master_is_down() {
    let env = ready_env().await;
    let report = env.harness.stop_service_everywhere(ServiceKind::Master).await;
    assert!(report.is_ok());

    let err = env
        .harness
        .create_volume("node1", &VolumeId::new("policy1", "orphan"), &BTreeMap::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("volmaster"), "{err}");

    // recovery: masters back up, creation works again
    env.harness
        .start_service_everywhere(ServiceKind::Master)
        .await
        .into_result()
        .expect("restart masters");
    env.harness
        .wait_ready_everywhere(ServiceKind::Master)
        .await
        .into_result()
        .expect("masters ready");
    env.harness
        .create_volume("node1", &VolumeId::new("policy1", "orphan"), &BTreeMap::new())
        .await
        .expect("create after recovery");
}

#[tokio::test]
async fn plugin_restart_on_one_node() {
    let env = ready_env().await;
    env.harness
        .stop_service(ServiceKind::Plugin, "node2")
        .await
        .expect("stop");
    assert!(!env.cluster.is_running("node2", "volplugin"));
    assert!(env.cluster.is_running("node1", "volplugin"), "other nodes untouched");

    env.harness
        .start_service(ServiceKind::Plugin, "node2", &[])
        .await
        .expect("start");
    env.harness
        .wait_service_ready(ServiceKind::Plugin, "node2")
        .await
        .expect("ready");
    assert!(env.cluster.is_running("node2", "volplugin"));
}

#[tokio::test]
async fn stop_is_idempotent_fleet_wide() {
    let env = ready_env().await;
    for _ in 0..2 {
        let report = env.harness.stop_service_everywhere(ServiceKind::Plugin).await;
        assert!(report.is_ok(), "stopping stopped plugins still succeeds");
    }
}

#[tokio::test]
async fn supervisor_restart_stays_on_control_node() {
    let env = ready_env().await;
    env.harness
        .stop_service(ServiceKind::Supervisor, "node0")
        .await
        .expect("stop");
    env.harness
        .start_service(ServiceKind::Supervisor, "node0", &[])
        .await
        .expect("start");
    env.harness
        .wait_service_ready(ServiceKind::Supervisor, "node0")
        .await
        .expect("ready");
    assert!(env.cluster.is_running("node0", "volsupervisor"));
    assert!(!env.cluster.is_running("node2", "volsupervisor"));
}

#[tokio::test]
async fn wait_ready_everywhere_names_the_lagging_node() {
    let env = ready_env().await;
    env.harness
        .stop_service(ServiceKind::Plugin, "node1")
        .await
        .expect("stop");
    let report = env.harness.wait_ready_everywhere(ServiceKind::Plugin).await;
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "node1");
    assert!(failures[0].1.to_string().contains("plugin on node1"));
}
