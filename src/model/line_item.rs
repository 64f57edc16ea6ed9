//! A single product row of the cart view.
//!
//! # Rendering Contract
//! Rows are rendered by the server-side template, which exposes the row's
//! identity as `data-order-id` and its unit price as `data-price`. Both are
//! plain text by the time they reach us, so the numeric fields are parsed
//! tolerantly (see [`parse_price`] and [`parse_quantity`]) instead of failing.

use serde::{Deserialize, Serialize};

use std::fmt::Display;

/// Opaque identifier of a cart row (`data-order-id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub order_id: OrderId,
    pub unit_price: f64,
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new LineItem from already-validated values.
    ///
    /// # Arguments
    /// * `order_id` - Row identifier
    /// * `unit_price` - Price of one unit, immutable for the row's lifetime
    /// * `quantity` - Current quantity (values below 1 are raised to 1)
    pub fn new(order_id: impl Into<OrderId>, unit_price: f64, quantity: u32) -> Self {
        Self {
            order_id: order_id.into(),
            unit_price: sanitize_price(unit_price),
            quantity: quantity.max(1),
        }
    }

    /// Builds a LineItem from the raw text a row carries.
    ///
    /// A missing or non-numeric price counts as `0`, a missing or non-numeric
    /// quantity counts as `1`.
    pub fn from_raw(order_id: OrderId, price: Option<&str>, quantity: &str) -> Self {
        Self::new(order_id, parse_price(price), parse_quantity(quantity))
    }

    pub fn total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Parses a `data-price` attribute, defaulting to `0.0`.
///
/// The leading number wins (`"25.50abc"` is 25.5). Negative, infinite and
/// NaN values are treated as missing.
pub fn parse_price(raw: Option<&str>) -> f64 {
    raw.and_then(parse_leading_decimal)
        .map(sanitize_price)
        .unwrap_or(0.0)
}

/// Reads the decimal number at the start of `raw`, ignoring leading
/// whitespace. An exponent is only taken when it has digits.
fn parse_leading_decimal(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    let whole = digits_from(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if whole > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole == 0 && fraction == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'-' | b'+')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }
    text[..end].parse().ok()
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        0.0
    }
}

/// Parses quantity text, coercing anything unusable to `1`.
///
/// Leading integer digits win (`"3 kg"` is 3). Text without leading
/// digits, and any value below 1, becomes 1. Values beyond `u32::MAX`
/// saturate.
pub fn parse_quantity(raw: &str) -> u32 {
    match parse_leading_integer(raw) {
        Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Reads the integer at the start of `raw`, ignoring leading whitespace.
/// Returns `None` when there are no leading digits.
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
