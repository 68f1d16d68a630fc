//! Mathematical utilities: sampling grids and the expression language.

pub mod expr;
pub mod grid;

pub use expr::*;
pub use grid::*;
