//! Derived cart totals.
//!
//! Totals are never stored. They are recomputed from the rows as currently
//! rendered, every time a quantity changes.

use super::{LineItem, OrderId};

#[derive(Debug, Clone, PartialEq)]
pub struct LineTotal {
    pub order_id: OrderId,
    pub total: f64,
}

/// Line totals in row order plus their sum.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartTotals {
    pub lines: Vec<LineTotal>,
    pub grand_total: f64,
}

impl CartTotals {
    /// Computes `unit_price × quantity` per row and the grand total.
    pub fn compute(items: &[LineItem]) -> Self {
        let lines: Vec<LineTotal> = items
            .iter()
            .map(|item| LineTotal {
                order_id: item.order_id.clone(),
                total: item.total(),
            })
            .collect();
        let grand_total = lines.iter().map(|line| line.total).sum();
        Self { lines, grand_total }
    }
}

/// Renders an amount the way the storefront displays it, e.g. `₹76.50`.
pub fn format_money(symbol: &str, amount: f64) -> String {
    format!("{}{:.2}", symbol, amount)
}
