// Managers module - thread-safe facades over the estimation core
//
// Managers own the locking, progress broadcast, and telemetry publication
// so the estimator itself stays single-threaded and synchronous.

pub mod session_manager;

pub use session_manager::{SessionManager, SessionProgress};
