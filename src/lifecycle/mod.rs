//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Dependencies → connect concurrently → scan results in declared order
//!
//! Serve/shutdown (controller.rs, shutdown.rs):
//!     Bind → serve in background → cancellation → drain → await serve exit
//!     → joined ShutdownOutcome
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancellation source for the controller
//! ```
//!
//! # Design Decisions
//! - Startup completes before the listener is bound (traffic only when ready)
//! - Ordered shutdown: drain is always requested before the serve result is awaited
//! - Drain deadline is configuration of the drain call, not of the controller
//! - Nothing here logs failures or exits the process; callers decide

pub mod controller;
pub mod error;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{Drain, LifecycleState, Listener, ListenerFactory, ServiceLifecycleController};
pub use error::{BindError, DrainError, ServeError};
pub use shutdown::{DrainStatus, Shutdown, ShutdownError, ShutdownOutcome};
pub use signals::{CancellationSource, TerminateSignal};
pub use startup::{
    start_all, start_all_sequential, BoxError, Dependency, FnDependency, StartupError,
    StartupStrategy,
};
