//! Utility modules for common functionality

pub mod signal;

pub use signal::cancel_on_signal;

// vim: ts=4
