//! Drain lifecycle tests for a leaf instance.

use std::time::{Duration, Instant};

use drain_chain::config::Role;
use drain_chain::drain::DrainState;
use drain_chain::lifecycle::{SequencerState, TerminationSignal};
use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leaf_stays_available_during_convergence() {
    let mut config = common::test_config(Role::Leaf);
    config.drain.convergence_delay_ms = 1_000;
    config.work.min_ms = 150;
    config.work.max_ms = 700;
    let (addr, state, shutdown) = common::spawn_server(config).await;
    let client = common::client();
    let base = format!("http://{addr}");

    // Active: work is admitted.
    let res = client.get(format!("{base}/process")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let work_ms = body["work_ms"].as_u64().unwrap();
    assert!((150..=700).contains(&work_ms), "work_ms {work_ms} out of range");
    assert_eq!(body["service"], "drain-chain-leaf");
    assert!(body["hostname"].is_string());
    assert!(body["processed_at"].is_string());

    // Fire the pre-stop hook.
    let hook_started = Instant::now();
    let hook = tokio::spawn({
        let client = client.clone();
        let url = format!("{base}/prestop");
        async move { client.get(url).send().await }
    });

    // Inside the window the instance still looks healthy and takes work.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.sequencer.state(), SequencerState::Converging);
    let res = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");
    let res = client.get(format!("{base}/process")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The hook returns only after the delay, with drain in effect.
    let res = hook.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "done");
    assert!(hook_started.elapsed() >= Duration::from_millis(1_000));
    assert_eq!(state.coordinator.query(), DrainState::Draining);

    // After the window: unhealthy, and new work is refused without running.
    let performed = state.work.performed();
    let res = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "draining");

    for _ in 0..5 {
        let res = client.get(format!("{base}/process")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "error": "service is draining" }));
    }
    assert_eq!(state.work.performed(), performed, "no work after drain");

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_prestop_runs_one_convergence() {
    let mut config = common::test_config(Role::Leaf);
    config.drain.convergence_delay_ms = 600;
    let (addr, state, shutdown) = common::spawn_server(config).await;
    let client = common::client();

    let start = Instant::now();
    let hooks: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            let url = format!("http://{addr}/prestop");
            tokio::spawn(async move { client.get(url).send().await })
        })
        .collect();
    for hook in hooks {
        assert_eq!(hook.await.unwrap().unwrap().status(), StatusCode::OK);
    }

    // Four sequential delays would be 2.4s.
    assert!(start.elapsed() < Duration::from_millis(1_500));
    assert!(state.coordinator.is_draining());

    // Already drained: returns at once.
    let again = Instant::now();
    let res = client.get(format!("http://{addr}/prestop")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(again.elapsed() < Duration::from_millis(300));

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_termination_sequence_exits_cleanly() {
    let service = common::spawn_service(common::test_config(Role::Leaf)).await;
    let client = common::client();
    let base = format!("http://{}", service.addr);

    let res = client.get(format!("{base}/process")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{base}/prestop")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let res = client.get(format!("{base}/process")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    service.signal.send(TerminationSignal::Terminate).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("service should exit after the signal")
        .unwrap();
    assert!(result.is_ok(), "expected clean exit, got {result:?}");

    // Listener is closed after exit.
    assert!(client.get(format!("{base}/health")).send().await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_signal_without_prestop_finishes_inflight_work() {
    let mut config = common::test_config(Role::Leaf);
    config.drain.convergence_delay_ms = 5_000;
    config.work.min_ms = 400;
    config.work.max_ms = 400;
    let service = common::spawn_service(config).await;
    let client = common::client();
    let base = format!("http://{}", service.addr);

    let inflight = tokio::spawn({
        let client = client.clone();
        let url = format!("{base}/process");
        async move { client.get(url).send().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let start = Instant::now();
    service.signal.send(TerminationSignal::Terminate).unwrap();

    // The admitted request completes even though drain began after it.
    let res = inflight.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let result = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("service should exit after the signal")
        .unwrap();
    assert!(result.is_ok());
    // No convergence delay on the signal-first path.
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_signal_mid_convergence_waits_for_drain() {
    let mut config = common::test_config(Role::Leaf);
    config.drain.convergence_delay_ms = 800;
    let service = common::spawn_service(config).await;
    let client = common::client();
    let base = format!("http://{}", service.addr);

    let hook_started = Instant::now();
    let hook = tokio::spawn({
        let client = client.clone();
        let url = format!("{base}/prestop");
        async move { client.get(url).send().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    service.signal.send(TerminationSignal::Terminate).unwrap();

    let res = hook.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(hook_started.elapsed() >= Duration::from_millis(800));

    let result = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("service should exit after the signal")
        .unwrap();
    assert!(result.is_ok());
}
