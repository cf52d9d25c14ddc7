//! Lifecycle subsystem: startup ordering and graceful shutdown.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
