//! Pure data structures for the cart view: rows and the totals derived from them.

pub mod line_item;
pub mod totals;

pub use line_item::*;
pub use totals::*;
