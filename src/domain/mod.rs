//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - sampling and model types (`Domain`, `Sampling`, `Model`, `VariableDescriptor`)
//! - composed outputs (`Figure`, `Row`, `Trace`, `Update`)
//! - declarative configuration (`ModelsConfig`, `PlotConfig`, `AppConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
