//! fusion-core - Core types and traits for hybrid result fusion
//!
//! This crate provides the result-set data model, error handling,
//! configuration and collaborator traits shared by the fusion engine
//! and its callers.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{FusionError, Result};
pub use traits::*;
pub use types::*;
