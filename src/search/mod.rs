//! # Window search

mod window;

pub use window::*;
