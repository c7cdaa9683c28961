//! # Docsmith Shared
//!
//! Shared types, data model and configuration for Docsmith.
//! This crate provides the foundation types used across all Docsmith components:
//! the `CodeAnalysis` produced by the parser and the `ScoreBreakdown` produced
//! by the quality scorer.

pub mod analysis;
pub mod config;
pub mod error;
pub mod quality;
pub mod types;

// Re-export commonly used types
pub use analysis::*;
pub use config::*;
pub use error::*;
pub use quality::*;
pub use types::*;

/// Version information for Docsmith
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
