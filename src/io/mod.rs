//! Input/output helpers.
//!
//! - model catalogue loading, YAML or JSON (`config`)

pub mod config;

pub use config::*;
