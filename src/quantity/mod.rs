//! The per-row quantity widget.

pub mod control;

pub use control::*;
