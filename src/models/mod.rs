//! Model instantiation and introspection.
//!
//! - `factory`: turn declarative entries into `Model`s (built-in `expr` target)
//! - `callable`: expression-backed callables evaluated over parameter grids
//! - `registry`: instantiate a whole catalogue with per-model failure isolation

pub mod callable;
pub mod factory;
pub mod registry;

pub use callable::*;
pub use factory::*;
pub use registry::*;
