//! Interactive state and event routing.
//!
//! Responsibilities:
//!
//! - typed control and graph identifiers (`ids`)
//! - visible-variable selection per model (`selection`)
//! - per-parameter sampling edits (`range`)
//! - one model's figure and its recompute rules (`state`)
//! - routing control events to the right model (`binder`)

pub mod binder;
pub mod ids;
pub mod range;
pub mod selection;
pub mod state;

pub use binder::*;
pub use ids::*;
pub use range::*;
pub use selection::*;
pub use state::*;
