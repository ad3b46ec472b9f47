//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Reads the filter from the environment (`RUST_LOG`). Safe to call more
/// than once; later calls are ignored, which keeps test harnesses happy.
pub fn init() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
