//! Visual feedback for add-to-cart buttons.

pub mod button;

pub use button::*;
