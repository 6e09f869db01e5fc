//! DomainWatch - A domain-portfolio update pipeline
//!
//! This library provides the diff-and-notify pipeline for a tracked domain
//! portfolio: fetching fresh registration snapshots, diffing them against
//! stored rows, recording an audit trail, and dispatching notifications.

pub mod cli;
pub mod config;
pub mod core;
pub mod diff;
pub mod intel;
pub mod notification;
pub mod orchestrator;
pub mod recorder;
pub mod store;
pub mod util;

// Re-export core types for convenience
pub use crate::core::*;
