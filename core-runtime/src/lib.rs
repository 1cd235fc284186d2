//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Opacity mobile core:
//! - Logging and tracing infrastructure
//! - Log tree configuration and host-supplied logging settings
//! - Event bus carrying SDK events towards the host
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the log tree and the service
//! façade depend on. It establishes the logging conventions (a `tracing`
//! subscriber that mirrors events into the log tree) and the event
//! broadcasting mechanism used to relay SDK events.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
