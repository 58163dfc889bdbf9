//! Logging prelude module for convenient access to tracing macros.
//!
//! Console diagnostics go through `tracing`; the durable per-day audit
//! trail is written by [`crate::log_sink::DailyLog`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Copied the tree {} into folder {}", name, dir);
//! warn!("Mode {} not recognized", mode);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed. Control the log level
/// with the `RUST_LOG` environment variable:
///
/// ```bash
/// RUST_LOG=debug dirmirror --source a --replica b
/// RUST_LOG=dirmirror::reconcile=trace dirmirror --source a --replica b
/// ```
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4
