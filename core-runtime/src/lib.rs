//! # Core Runtime Module
//!
//! Shared runtime infrastructure for the decoder workspace:
//! - Logging and tracing subscriber setup
//! - Runtime error type
//!
//! ## Overview
//!
//! Library crates only emit `tracing` events. Hosts and demos call
//! [`logging::init_logging`] once at startup to decide where those events go.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
