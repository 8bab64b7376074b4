//! # Tabular data
//!
//! CSV loading and the datetime-indexed table.

mod loader;
mod table;

pub use loader::*;
pub use table::*;
