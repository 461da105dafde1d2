//! Lifecycle controller tests against scripted listeners.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

use service_lifecycle::lifecycle::{
    DrainError, DrainStatus, LifecycleState, ServeError, ServiceLifecycleController, Shutdown,
};

mod common;
use common::{Script, ScriptedFactory};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

async fn wait_for_state(
    rx: &mut tokio::sync::watch::Receiver<LifecycleState>,
    state: LifecycleState,
) {
    timeout(TEST_TIMEOUT, rx.wait_for(|s| *s == state))
        .await
        .expect("state not reached")
        .expect("controller dropped");
}

#[tokio::test]
async fn test_cancellation_drains_once_and_normalizes_closed() {
    let (factory, probe) = ScriptedFactory::new(Script::Healthy);
    let controller = ServiceLifecycleController::new(Some(Duration::from_secs(1)));
    let mut states = controller.subscribe();
    let shutdown = Shutdown::new();
    let cancellation = shutdown.subscribe();

    let run = tokio::spawn(controller.run(factory, (), cancellation));
    wait_for_state(&mut states, LifecycleState::Serving).await;

    shutdown.trigger();
    let outcome = timeout(TEST_TIMEOUT, run).await.unwrap().unwrap().unwrap();

    assert!(outcome.is_ok(), "unexpected outcome: {:?}", outcome);
    assert!(matches!(outcome.drain, DrainStatus::Completed));
    assert!(outcome.serve_error().is_none());
    assert_eq!(probe.drains(), 1);
    assert_eq!(probe.serves(), 1);
    assert_eq!(*states.borrow(), LifecycleState::Stopped);
    assert!(outcome.into_result().is_ok());
}

#[tokio::test]
async fn test_serve_failure_before_cancellation_skips_drain() {
    let (factory, probe) = ScriptedFactory::new(Script::FailAfter(Duration::from_millis(20)));
    let controller = ServiceLifecycleController::new(None);
    let shutdown = Shutdown::new();

    let outcome = timeout(TEST_TIMEOUT, controller.run(factory, (), shutdown.subscribe()))
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(outcome.drain, DrainStatus::NotAttempted));
    assert!(!outcome.drain_attempted());
    assert!(matches!(outcome.serve_error(), Some(ServeError::Io(e)) if e.to_string() == "accept failed"));
    assert_eq!(probe.drains(), 0);

    // Cancellation after the fact changes nothing.
    assert_eq!(shutdown.trigger(), 0);
}

#[tokio::test]
async fn test_closed_without_drain_is_a_clean_stop() {
    let (factory, probe) = ScriptedFactory::new(Script::ClosedAfter(Duration::from_millis(10)));
    let controller = ServiceLifecycleController::new(None);
    let states = controller.subscribe();
    let (_tx, rx) = oneshot::channel::<()>();

    let outcome = timeout(TEST_TIMEOUT, controller.run(factory, (), rx))
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.is_ok(), "unexpected outcome: {:?}", outcome);
    assert!(!outcome.drain_attempted());
    assert!(outcome.serve_error().is_none());
    assert_eq!(probe.drains(), 0);
    assert_eq!(*states.borrow(), LifecycleState::Stopped);
    assert!(outcome.into_result().is_ok());
}

#[tokio::test]
async fn test_panicking_serve_loop_reports_aborted() {
    let (factory, probe) = ScriptedFactory::new(Script::PanicAfter(Duration::from_millis(10)));
    let controller = ServiceLifecycleController::new(None);
    let shutdown = Shutdown::new();

    let outcome = timeout(TEST_TIMEOUT, controller.run(factory, (), shutdown.subscribe()))
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(outcome.serve_error(), Some(ServeError::Aborted)));
    assert!(!outcome.drain_attempted());
    assert_eq!(probe.serves(), 1);
    assert_eq!(probe.drains(), 0);
}

#[tokio::test]
async fn test_serve_loop_panicking_during_drain_reports_aborted() {
    let (factory, probe) = ScriptedFactory::new(Script::PanicOnStop);
    let controller = ServiceLifecycleController::new(Some(Duration::from_secs(1)));
    let mut states = controller.subscribe();
    let shutdown = Shutdown::new();

    let run = tokio::spawn(controller.run(factory, (), shutdown.subscribe()));
    wait_for_state(&mut states, LifecycleState::Serving).await;
    shutdown.trigger();

    let outcome = timeout(TEST_TIMEOUT, run).await.unwrap().unwrap().unwrap();
    assert!(matches!(outcome.drain, DrainStatus::Completed));
    assert!(matches!(outcome.serve_error(), Some(ServeError::Aborted)));
    assert_eq!(probe.drains(), 1);
}

#[tokio::test]
async fn test_drain_failure_and_serve_failure_are_joined() {
    let (factory, probe) = ScriptedFactory::new(Script::DrainTimesOut);
    let controller = ServiceLifecycleController::new(Some(Duration::from_millis(50)));
    let mut states = controller.subscribe();
    let (tx, rx) = oneshot::channel();

    let run = tokio::spawn(controller.run(factory, (), rx));
    wait_for_state(&mut states, LifecycleState::Serving).await;
    tx.send(()).unwrap();

    let outcome = timeout(TEST_TIMEOUT, run).await.unwrap().unwrap().unwrap();
    assert_eq!(probe.drains(), 1);

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(
        err.drain(),
        Some(DrainError::DeadlineExceeded(d)) if *d == Duration::from_millis(50)
    ));
    assert!(matches!(
        err.serve(),
        Some(ServeError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionReset
    ));
    assert_eq!(err.causes().count(), 2);
}

#[tokio::test]
async fn test_bind_failure_is_returned_without_drain() {
    let (factory, probe) = ScriptedFactory::unbindable();
    let controller = ServiceLifecycleController::new(None);
    let states = controller.subscribe();
    let shutdown = Shutdown::new();

    let err = controller
        .run(factory, (), shutdown.subscribe())
        .await
        .unwrap_err();

    assert_eq!(err.address, "127.0.0.1:8080");
    assert_eq!(err.source.kind(), std::io::ErrorKind::AddrInUse);
    assert_eq!(probe.serves(), 0);
    assert_eq!(probe.drains(), 0);
    assert_eq!(*states.borrow(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_state_passes_through_draining() {
    let (factory, _probe) = ScriptedFactory::new(Script::Healthy);
    let controller = ServiceLifecycleController::new(None);
    let mut states = controller.subscribe();
    assert_eq!(controller.state(), LifecycleState::Starting);

    let (tx, rx) = oneshot::channel();
    let run = tokio::spawn(controller.run(factory, (), rx));

    let mut seen = vec![*states.borrow_and_update()];
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(());
    });
    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        seen.push(state);
        if state == LifecycleState::Stopped {
            break;
        }
    }

    timeout(TEST_TIMEOUT, run).await.unwrap().unwrap().unwrap();
    seen.dedup();
    assert_eq!(seen.first(), Some(&LifecycleState::Starting));
    assert_eq!(seen.last(), Some(&LifecycleState::Stopped));
    assert!(seen.contains(&LifecycleState::Serving));
    assert!(seen.contains(&LifecycleState::Draining));
}
