//! # Cart Document
//!
//! An in-memory model of the parts of the rendered page this crate reads and
//! writes: cart rows, the grand-total element, the cart-count badge, toasts,
//! alerts and add-to-cart forms.
//!
//! Rendering the page is somebody else's job. The document is built once from
//! whatever the server rendered (see the builder methods) and from then on
//! belongs to the [`CartSynchronizer`](crate::sync::CartSynchronizer), which
//! hands out clones as snapshots.

use crate::feedback::{AddToCartButton, ButtonId};
use crate::model::{format_money, parse_leading_integer, CartTotals, LineItem, OrderId};
use crate::quantity::{QuantityControl, QuantityInput};
use crate::transport::FormSubmission;

/// A text input, optionally paired with a hidden field that mirrors it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub value: String,
    pub mirror: Option<String>,
}

impl InputField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            mirror: None,
        }
    }

    /// An input with a hidden mirror field for native form submission.
    pub fn mirrored(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            mirror: Some(value.clone()),
            value,
        }
    }
}

impl QuantityInput for InputField {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: String) {
        self.value = value;
    }

    fn set_mirror(&mut self, value: String) {
        if let Some(mirror) = self.mirror.as_mut() {
            *mirror = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub order_id: OrderId,
    /// Raw `data-price` attribute, `None` when absent.
    pub data_price: Option<String>,
    pub quantity: QuantityControl<InputField>,
    /// Text of the row's total cell.
    pub total_text: String,
}

impl CartRow {
    pub fn new(order_id: impl Into<OrderId>, data_price: Option<&str>, quantity: &str) -> Self {
        Self::with_input(order_id, data_price, InputField::new(quantity))
    }

    pub fn with_input(
        order_id: impl Into<OrderId>,
        data_price: Option<&str>,
        input: InputField,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            data_price: data_price.map(str::to_string),
            quantity: QuantityControl::bind(input),
            total_text: String::new(),
        }
    }

    /// The row as currently rendered.
    pub fn line_item(&self) -> LineItem {
        LineItem::from_raw(
            self.order_id.clone(),
            self.data_price.as_deref(),
            &self.quantity.input().value,
        )
    }
}

/// The form an add-to-cart button submits.
#[derive(Debug, Clone, PartialEq)]
pub struct CartForm {
    pub action: String,
    pub fields: Vec<(String, String)>,
    /// Quantity picker inside the form. Its hidden `quantity` field is sent.
    pub quantity: Option<QuantityControl<InputField>>,
}

impl CartForm {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            fields: Vec::new(),
            quantity: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn with_quantity(mut self, initial: &str) -> Self {
        self.quantity = Some(QuantityControl::bind(InputField::mirrored(initial)));
        self
    }

    /// The form as it would be submitted right now.
    pub fn submission(&self) -> FormSubmission {
        let mut fields: Vec<(String, String)> = self
            .fields
            .iter()
            .filter(|(name, _)| self.quantity.is_none() || name != "quantity")
            .cloned()
            .collect();
        if let Some(control) = &self.quantity {
            let value = control
                .input()
                .mirror
                .clone()
                .unwrap_or_else(|| control.current().to_string());
            fields.push(("quantity".to_string(), value));
        }
        FormSubmission {
            action: self.action.clone(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductWidget {
    pub button: AddToCartButton,
    pub form: CartForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartDocument {
    pub rows: Vec<CartRow>,
    /// Grand-total element text, `None` when the page has no such element.
    pub grand_total: Option<String>,
    /// Cart-count badge text, `None` when the page has no badge.
    pub cart_count: Option<String>,
    pub toasts: Vec<Toast>,
    /// Blocking error notifications, oldest first.
    pub alerts: Vec<String>,
    pub products: Vec<ProductWidget>,
}

impl CartDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, row: CartRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_grand_total(mut self) -> Self {
        self.grand_total = Some(String::new());
        self
    }

    pub fn with_cart_count(mut self, text: impl Into<String>) -> Self {
        self.cart_count = Some(text.into());
        self
    }

    pub fn with_product(mut self, button: AddToCartButton, form: CartForm) -> Self {
        self.products.push(ProductWidget { button, form });
        self
    }

    pub fn row_mut(&mut self, order_id: &OrderId) -> Option<&mut CartRow> {
        self.rows.iter_mut().find(|row| &row.order_id == order_id)
    }

    pub fn product_mut(&mut self, button_id: &ButtonId) -> Option<&mut ProductWidget> {
        self.products.iter_mut().find(|p| &p.button.id == button_id)
    }

    pub fn line_items(&self) -> Vec<LineItem> {
        self.rows.iter().map(CartRow::line_item).collect()
    }

    /// Writes every row total and the grand total.
    pub fn render_totals(&mut self, totals: &CartTotals, currency: &str) {
        for (row, line) in self.rows.iter_mut().zip(&totals.lines) {
            row.total_text = format_money(currency, line.total);
        }
        if let Some(grand_total) = self.grand_total.as_mut() {
            *grand_total = format_money(currency, totals.grand_total);
        }
    }

    /// Optimistically adds one to the badge. Returns the new count, if a badge exists.
    pub fn bump_cart_count(&mut self) -> Option<u32> {
        let badge = self.cart_count.as_mut()?;
        let current = parse_leading_integer(badge)
            .map(|value| u32::try_from(value.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0);
        let next = current.saturating_add(1);
        *badge = next.to_string();
        Some(next)
    }

    /// Overwrites the badge with an authoritative count.
    pub fn set_cart_count(&mut self, count: u32) -> bool {
        match self.cart_count.as_mut() {
            Some(badge) => {
                *badge = count.to_string();
                true
            }
            None => false,
        }
    }
}
