//! Batched stress dispatch against a single node.

use volharness::soak;

use crate::helpers::env;

#[tokio::test]
async fn soak_runs_every_iteration_in_batches() {
    let env = env(&["node0"]).await;
    env.harness.rebootstrap().await.expect("rebootstrap");

    let node = env.harness.fleet().get("node0").expect("node");
    let results = soak(node, "pgrep -c volplugin", 200, 25).await;
    assert_eq!(results.len(), 200);
    assert!(results.iter().all(Result::is_ok));
}

#[tokio::test]
async fn soak_collects_failures_without_stopping() {
    let env = env(&["node0"]).await;
    // plugin never started, so every probe fails
    let node = env.harness.fleet().get("node0").expect("node");
    let results = soak(node, "pgrep -c volplugin", 60, 10).await;
    assert_eq!(results.len(), 60, "every iteration attempted");
    assert!(results.iter().all(Result::is_err));
}
