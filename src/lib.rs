//! # dirmirror - One-way Directory Mirror
//!
//! dirmirror keeps a replica directory tree structurally and
//! content-identical to a source tree, once or repeatedly on a schedule.
//! Dot-prefixed entries are never propagated.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dirmirror::{MirrorOptions, MirrorSession, RunOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = MirrorSession::new("LOGS");
//!     session.configure(MirrorOptions::new("./data", "./backup"));
//!     if let RunOutcome::Completed { report, .. } = session.run(&CancellationToken::new()).await {
//!         println!("Created {} files", report.files_created);
//!     }
//!     session.close();
//! }
//! ```
//!
//! ## Continuous Mode
//!
//! ```rust,ignore
//! let options = MirrorOptions::new("./data", "./backup")
//!     .mode("continuous")
//!     .interval_hours(0.5)
//!     .max_cycles(10);
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod fs;
pub mod log_sink;
pub mod logging;
pub mod reconcile;
pub mod scheduler;
pub mod session;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types and functions
pub use config::{CycleLimit, MirrorMode, MirrorOptions, MirrorSettings, Schedule};
pub use error::{ConfigError, FsError, MirrorError};
pub use events::{EventSink, MemorySink, MirrorEvent};
pub use fs::{FileSystem, LocalFileSystem};
pub use log_sink::DailyLog;
pub use reconcile::{PassReport, Reconciler};
pub use session::{MirrorSession, Refusal, RunOutcome, SessionState, SessionStatus};
pub use types::{DirectoryListing, EntryKind};

// vim: ts=4
