use std::time::Duration;

use crate::support::{
    helpers::{ci_config, init_tracing},
    mock_cluster::{MockCluster, MockLauncher, MockProcess},
};
use anyhow::Result;
use tokio::time::Instant;
use warpstart::runtime::fatal::{classify, failure_message, FailureKind};
use warpstart::{Runner, TerminationTarget, ValidatorProcess};

#[tokio::test(start_paused = true)]
async fn start_reports_the_launched_pid() -> Result<()> {
    init_tracing();
    let cluster = MockCluster::new([0], 0).with_heights([None, None, Some(0), Some(1)]);
    let launcher = MockLauncher::new();
    let runner = Runner::with_parts(ci_config(), cluster.clone(), launcher.clone());

    let (process, ready) = runner.start(None).await?;

    assert_eq!(ready.pid, process.id());
    assert_eq!(ready.block_height, 1);
    assert_eq!(ready.attempts, 4);
    assert_eq!(launcher.launches(), vec![None]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn start_passes_the_warp_slot_through() -> Result<()> {
    init_tracing();
    let cluster = MockCluster::new([0], 0).with_heights([Some(10), Some(11)]);
    let launcher = MockLauncher::new();
    let runner = Runner::with_parts(ci_config(), cluster, launcher.clone());

    runner.start(Some(4_000)).await?;

    assert_eq!(launcher.launches(), vec![Some(4_000)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn silent_rpc_fails_after_the_full_budget() {
    init_tracing();
    let cluster = MockCluster::new([0], 0);
    let runner = Runner::with_parts(ci_config(), cluster.clone(), MockLauncher::new());
    let started = Instant::now();

    let err = runner.start(None).await.unwrap_err();

    assert_eq!(classify(&err), FailureKind::NotResponding);
    assert_eq!(cluster.height_calls(), 50);
    assert_eq!(
        failure_message(&err),
        "Test validator is still not responding, something is wrong."
    );
    assert!(started.elapsed() >= Duration::from_millis(4_900));
}

#[tokio::test(start_paused = true)]
async fn rpc_from_another_validator_is_detected() {
    init_tracing();
    let cluster = MockCluster::new([0], 0).with_heights([Some(100), Some(101)]);
    let runner = Runner::with_parts(
        ci_config(),
        cluster,
        MockLauncher::new().exit_on_launch(),
    );

    let err = runner.start(None).await.unwrap_err();

    assert_eq!(classify(&err), FailureKind::ProcessGone);
    assert!(failure_message(&err).contains("was a validator already running?"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_fresh_validator() {
    init_tracing();
    let cluster = MockCluster::new([0], 0);
    let launcher = MockLauncher::new();
    let runner = Runner::with_parts(ci_config(), cluster.clone(), launcher.clone());
    runner.cancellation_token().cancel();

    let err = runner.start(None).await.unwrap_err();

    assert_eq!(classify(&err), FailureKind::Cancelled);
    assert_eq!(cluster.height_calls(), 1);
    let spawned = launcher.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].interrupts(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_after_relaunch_stops_the_warped_validator() {
    init_tracing();
    let cluster = MockCluster::new([1], 1_200);
    let launcher = MockLauncher::new();
    let runner = Runner::with_parts(ci_config(), cluster, launcher.clone());
    let token = runner.cancellation_token();
    // The relaunch happens after the 5 s shutdown grace; cancel while polling.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5_200)).await;
        token.cancel();
    });
    let mut running = MockProcess::new(7);

    let err = runner
        .advance(TerminationTarget::Tracked(&mut running), 1)
        .await
        .unwrap_err();

    assert_eq!(classify(&err), FailureKind::Cancelled);
    assert_eq!(running.interrupts(), 1);
    assert_eq!(launcher.launches(), vec![Some(2_000)]);
    let spawned = launcher.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].interrupts(), 1);
    assert!(!spawned[0].is_running());
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_boundary_wait_skips_the_restart() {
    init_tracing();
    let cluster = MockCluster::new([5], 5_999);
    let launcher = MockLauncher::new();
    let runner = Runner::with_parts(ci_config(), cluster.clone(), launcher.clone());
    let token = runner.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        token.cancel();
    });
    let mut running = MockProcess::new(7);

    let err = runner
        .advance(TerminationTarget::Tracked(&mut running), 1)
        .await
        .unwrap_err();

    assert_eq!(classify(&err), FailureKind::Cancelled);
    assert!(cluster.epoch_calls() >= 2);
    assert!(running.is_running());
    assert!(launcher.launches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn launches_are_independent() -> Result<()> {
    init_tracing();
    let cluster = MockCluster::new([0], 0).with_heights([Some(1), Some(2), Some(3), Some(4)]);
    let launcher = MockLauncher::new();
    let runner = Runner::with_parts(ci_config(), cluster, launcher.clone());

    let (mut first, _) = runner.start(Some(3_000)).await?;
    let (mut second, _) = runner.start(Some(3_000)).await?;
    assert_ne!(first.id(), second.id());

    first.interrupt()?;
    assert!(first.has_exited()?);
    assert!(!second.has_exited()?);
    Ok(())
}
