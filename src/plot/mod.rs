//! Terminal plotting of figure rows.

pub mod ascii;

pub use ascii::*;
