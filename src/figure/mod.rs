//! Figure building.
//!
//! Responsibilities:
//!
//! - resolve how each plotted variable's parameters are sampled (`resolver`)
//! - evaluate variables and stack them into a multi-row figure (`composer`)

pub mod composer;
pub mod resolver;

pub use composer::*;
pub use resolver::*;
