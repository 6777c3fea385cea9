#![forbid(unsafe_code)]

//! Keeps the local item store and the shared backend in step: optimistic
//! local writes, echo suppression, a short local-preference window, and a
//! single-threaded loop applying remote events.

mod debounce;
mod echo;
mod error;
mod event;
mod persist;
mod reconcile;
mod session;

pub use debounce::SaveDebouncer;
pub use echo::EchoGuard;
pub use error::SyncError;
pub use event::RemoteEvent;
pub use persist::Persistence;
pub use reconcile::{IgnoreReason, Reconciler, ReconcileOutcome, run_reconcile_loop, LoopStats};
pub use session::{SyncSession, SyncSettings};

pub const DEFAULT_LOCAL_GRACE_MS: kb_core::TimestampMs = 500;
pub const DEFAULT_ECHO_TTL_MS: kb_core::TimestampMs = 2_000;
pub const DEFAULT_SAVE_DEBOUNCE_MS: kb_core::TimestampMs = 1_000;

pub fn system_now_ms() -> kb_core::TimestampMs {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}
