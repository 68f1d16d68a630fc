//! `kview` library crate.
//!
//! The binary (`kview`) is a thin wrapper around this library so that:
//!
//! - the binding engine is testable without spawning processes
//! - other front-ends can host a `Session` directly
//!
//! Engine layers, bottom-up: `domain` and `math` types, `models` (catalogue
//! loading), `figure` (resolution and composition), `controls` (per-model
//! state and event routing), `app` (sessions and front-end views).

pub mod app;
pub mod cli;
pub mod controls;
pub mod domain;
pub mod error;
pub mod figure;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod tui;
