//! Consolidated error handling for the reconciliation engine.
//!
//! This module provides:
//! - Error types per concern (store access, event processing)
//! - Error classification for retry decisions at the event boundary
//!
//! The engine's propagation policy (see `engine` module docs) distinguishes
//! errors that are surfaced to the caller for retry from errors that are
//! logged and abort the remainder of a single event's cascade.

mod common;
mod traits;

pub use common::*;
pub use traits::*;
