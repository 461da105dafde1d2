//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::Notify;

use service_lifecycle::lifecycle::{
    BindError, BoxError, Dependency, Drain, DrainError, Listener, ListenerFactory, ServeError,
};

/// Dependency that finishes after `delay` with a fixed result.
pub struct ScriptedDependency {
    name: &'static str,
    delay: Duration,
    failure: Option<&'static str>,
    pub connected: Arc<AtomicBool>,
    pub attempts: Arc<AtomicUsize>,
}

impl ScriptedDependency {
    pub fn ok(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            failure: None,
            connected: Arc::new(AtomicBool::new(false)),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &'static str, delay: Duration, message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::ok(name, delay)
        }
    }
}

impl Dependency for ScriptedDependency {
    fn name(&self) -> &str {
        self.name
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.failure {
                Some(message) => Err(Box::new(io::Error::other(message)) as BoxError),
                None => {
                    self.connected.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
        .boxed()
    }
}

/// How a [`ScriptedListener`] behaves.
#[derive(Clone, Copy, Debug)]
pub enum Script {
    /// Serve until drained, then report `Closed`.
    Healthy,
    /// Fail on its own after the delay.
    FailAfter(Duration),
    /// Drain fails with a deadline error; the serve loop then reports a reset.
    DrainTimesOut,
    /// Report `Closed` after the delay without being drained.
    ClosedAfter(Duration),
    /// Panic after the delay without reporting a result.
    PanicAfter(Duration),
    /// Serve until drained, then panic instead of reporting.
    PanicOnStop,
}

/// Counters shared between a test and its scripted listener.
#[derive(Debug, Default)]
pub struct ListenerProbe {
    pub drains: AtomicUsize,
    pub serves: AtomicUsize,
}

impl ListenerProbe {
    pub fn drains(&self) -> usize {
        self.drains.load(Ordering::SeqCst)
    }

    pub fn serves(&self) -> usize {
        self.serves.load(Ordering::SeqCst)
    }
}

pub struct ScriptedFactory {
    pub script: Script,
    pub bind_fails: bool,
    pub probe: Arc<ListenerProbe>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> (Self, Arc<ListenerProbe>) {
        let probe = Arc::new(ListenerProbe::default());
        (
            Self {
                script,
                bind_fails: false,
                probe: Arc::clone(&probe),
            },
            probe,
        )
    }

    pub fn unbindable() -> (Self, Arc<ListenerProbe>) {
        let (mut factory, probe) = Self::new(Script::Healthy);
        factory.bind_fails = true;
        (factory, probe)
    }
}

impl ListenerFactory for ScriptedFactory {
    type Listener = ScriptedListener;

    fn bind(self) -> BoxFuture<'static, Result<ScriptedListener, BindError>> {
        async move {
            if self.bind_fails {
                return Err(BindError::new(
                    "127.0.0.1:8080",
                    io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
                ));
            }
            Ok(ScriptedListener {
                script: self.script,
                probe: self.probe,
                stop: Arc::new(Notify::new()),
            })
        }
        .boxed()
    }
}

pub struct ScriptedListener {
    script: Script,
    probe: Arc<ListenerProbe>,
    stop: Arc<Notify>,
}

impl Listener for ScriptedListener {
    type Handler = ();
    type Drain = ScriptedDrain;

    fn drain_handle(&self) -> ScriptedDrain {
        ScriptedDrain {
            script: self.script,
            probe: Arc::clone(&self.probe),
            stop: Arc::clone(&self.stop),
        }
    }

    fn serve(self, _handler: ()) -> BoxFuture<'static, ServeError> {
        async move {
            self.probe.serves.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Healthy => {
                    self.stop.notified().await;
                    ServeError::Closed
                }
                Script::FailAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    ServeError::Io(io::Error::other("accept failed"))
                }
                Script::DrainTimesOut => {
                    self.stop.notified().await;
                    ServeError::Io(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset",
                    ))
                }
                Script::ClosedAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    ServeError::Closed
                }
                Script::PanicAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    panic!("serve loop crashed");
                }
                Script::PanicOnStop => {
                    self.stop.notified().await;
                    panic!("serve loop crashed while stopping");
                }
            }
        }
        .boxed()
    }
}

pub struct ScriptedDrain {
    script: Script,
    probe: Arc<ListenerProbe>,
    stop: Arc<Notify>,
}

impl Drain for ScriptedDrain {
    fn drain(self, deadline: Option<Duration>) -> BoxFuture<'static, Result<(), DrainError>> {
        async move {
            self.probe.drains.fetch_add(1, Ordering::SeqCst);
            // Stay in the draining state long enough to be observed.
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.stop.notify_one();
            match self.script {
                Script::DrainTimesOut => Err(DrainError::DeadlineExceeded(
                    deadline.unwrap_or(Duration::ZERO),
                )),
                _ => Ok(()),
            }
        }
        .boxed()
    }
}

/// Arc a scripted dependency for use with the coordinator.
pub fn dep(dependency: ScriptedDependency) -> Arc<dyn Dependency> {
    Arc::new(dependency)
}
