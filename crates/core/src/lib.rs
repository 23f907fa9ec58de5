//! Core types and configuration for the weekly workload feature pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Weekly observation records and their keys
//! - Derived feature sets and augmented records
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
