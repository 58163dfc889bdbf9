//! Signal handlers for graceful termination

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Exit code after SIGINT (128 + 2)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Cancel `token` when SIGINT or SIGTERM arrives
///
/// Both handlers are installed before this returns, so a signal sent right
/// after the call is already caught. The running session observes the
/// token between filesystem actions and during the inter-cycle wait, then
/// shuts down and closes its log. Must be called inside a tokio runtime.
pub fn cancel_on_signal(token: CancellationToken) {
	let mut sigterm = match signal(SignalKind::terminate()) {
		Ok(stream) => stream,
		Err(e) => {
			warn!("Failed to setup SIGTERM handler: {}. Process will not handle SIGTERM gracefully.", e);
			return;
		}
	};

	let mut sigint = match signal(SignalKind::interrupt()) {
		Ok(stream) => stream,
		Err(e) => {
			warn!("Failed to setup SIGINT handler: {}. Process will not handle SIGINT gracefully.", e);
			return;
		}
	};

	tokio::spawn(async move {
		tokio::select! {
			_ = sigterm.recv() => debug!("Received SIGTERM, stopping after the current action..."),
			_ = sigint.recv() => debug!("Received SIGINT, stopping after the current action..."),
			_ = token.cancelled() => return,
		}
		token.cancel();
	});
}


// vim: ts=4
