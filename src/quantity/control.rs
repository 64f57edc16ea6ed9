//! # Quantity Control
//!
//! A per-row widget binding a text input and two step buttons to a bounded
//! integer quantity. The control owns its input, so every mutation goes through
//! one place and the optional hidden form field is re-mirrored synchronously.
//!
//! ## Bounds
//!
//! - The floor is 1: decrementing at 1 is a no-op, and text edits that parse
//!   below 1 (or not at all) are coerced to 1.
//! - There is no ceiling beyond `u32::MAX`.
//!
//! The control never talks to the network. On the cart page the
//! [`CartSynchronizer`](crate::sync::CartSynchronizer) pairs each step with
//! an update request.

use crate::model::parse_quantity;
use crate::transport::CartAction;

/// The field a [`QuantityControl`] writes to.
///
/// Implemented by [`InputField`](crate::page::InputField) for the in-memory
/// document. A browser binding would implement it over the real input element.
pub trait QuantityInput {
    /// Current text of the visible input.
    fn value(&self) -> String;

    /// Replaces the text of the visible input.
    fn set_value(&mut self, value: String);

    /// Writes the hidden field mirrored for native form submission.
    /// Inputs without a hidden field ignore this.
    fn set_mirror(&mut self, _value: String) {}
}

/// A user-driven change to a quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    Increment,
    Decrement,
    /// Raw text typed into the input.
    Input(String),
    /// Programmatic set.
    Set(u32),
}

impl QuantityChange {
    /// The server action a step button maps to. Text edits have none.
    pub fn action(&self) -> Option<CartAction> {
        match self {
            QuantityChange::Increment => Some(CartAction::Increase),
            QuantityChange::Decrement => Some(CartAction::Decrease),
            QuantityChange::Input(_) | QuantityChange::Set(_) => None,
        }
    }
}

/// Result of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Changed { from: u32, to: u32 },
    Unchanged(u32),
}

impl StepOutcome {
    fn between(from: u32, to: u32) -> Self {
        if from == to {
            StepOutcome::Unchanged(to)
        } else {
            StepOutcome::Changed { from, to }
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, StepOutcome::Changed { .. })
    }

    /// The quantity after the mutation.
    pub fn value(&self) -> u32 {
        match *self {
            StepOutcome::Changed { to, .. } => to,
            StepOutcome::Unchanged(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantityControl<I> {
    input: I,
}

impl<I: QuantityInput> QuantityControl<I> {
    /// Binds a control to its input and mirrors the current value.
    pub fn bind(input: I) -> Self {
        let mut control = Self { input };
        let current = control.current();
        control.input.set_mirror(current.to_string());
        control
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// The quantity the input currently represents.
    pub fn current(&self) -> u32 {
        parse_quantity(&self.input.value())
    }

    pub fn increment(&mut self) -> StepOutcome {
        let from = self.current();
        let to = from.saturating_add(1);
        self.write(to);
        StepOutcome::between(from, to)
    }

    pub fn decrement(&mut self) -> StepOutcome {
        let from = self.current();
        let to = if from > 1 { from - 1 } else { from };
        self.write(to);
        StepOutcome::between(from, to)
    }

    /// Handles an input event carrying the field's new text.
    pub fn on_input(&mut self, text: &str) -> StepOutcome {
        let from = self.current();
        let to = parse_quantity(text);
        self.write(to);
        StepOutcome::between(from, to)
    }

    pub fn set_quantity(&mut self, quantity: u32) -> StepOutcome {
        let from = self.current();
        let to = quantity.max(1);
        self.write(to);
        StepOutcome::between(from, to)
    }

    pub fn apply(&mut self, change: &QuantityChange) -> StepOutcome {
        match change {
            QuantityChange::Increment => self.increment(),
            QuantityChange::Decrement => self.decrement(),
            QuantityChange::Input(text) => self.on_input(text),
            QuantityChange::Set(quantity) => self.set_quantity(*quantity),
        }
    }

    fn write(&mut self, quantity: u32) {
        let text = quantity.to_string();
        self.input.set_value(text.clone());
        self.input.set_mirror(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Field {
        value: String,
        mirror: Option<String>,
    }

    impl QuantityInput for Field {
        fn value(&self) -> String {
            self.value.clone()
        }

        fn set_value(&mut self, value: String) {
            self.value = value;
        }

        fn set_mirror(&mut self, value: String) {
            self.mirror = Some(value);
        }
    }

    fn control(initial: &str) -> QuantityControl<Field> {
        QuantityControl::bind(Field {
            value: initial.to_string(),
            mirror: None,
        })
    }

    #[test]
    fn test_bind_mirrors_initial_value() {
        let control = control("4");
        assert_eq!(control.input().mirror.as_deref(), Some("4"));
    }

    #[test]
    fn test_decrement_floors_at_one() {
        let mut control = control("2");
        assert_eq!(control.decrement(), StepOutcome::Changed { from: 2, to: 1 });
        for _ in 0..5 {
            assert_eq!(control.decrement(), StepOutcome::Unchanged(1));
        }
        assert_eq!(control.current(), 1);
        assert_eq!(control.input().mirror.as_deref(), Some("1"));
    }

    #[test]
    fn test_increment_has_no_ceiling() {
        let mut control = control("7");
        for _ in 0..250 {
            control.increment();
        }
        assert_eq!(control.current(), 257);
        assert_eq!(control.input().value, "257");
        assert_eq!(control.input().mirror.as_deref(), Some("257"));
    }

    #[test]
    fn test_manual_input_is_coerced() {
        let mut control = control("3");
        assert_eq!(control.on_input("-5"), StepOutcome::Changed { from: 3, to: 1 });
        assert_eq!(control.input().value, "1");

        control.set_quantity(6);
        assert_eq!(control.on_input("abc").value(), 1);
        assert_eq!(control.input().mirror.as_deref(), Some("1"));

        assert_eq!(control.on_input("12"), StepOutcome::Changed { from: 1, to: 12 });
    }

    #[test]
    fn test_set_quantity_clamps_zero() {
        let mut control = control("5");
        assert_eq!(control.set_quantity(0), StepOutcome::Changed { from: 5, to: 1 });
        assert_eq!(control.set_quantity(1), StepOutcome::Unchanged(1));
    }

    #[test]
    fn test_change_maps_to_action() {
        assert_eq!(QuantityChange::Increment.action(), Some(CartAction::Increase));
        assert_eq!(QuantityChange::Decrement.action(), Some(CartAction::Decrease));
        assert_eq!(QuantityChange::Input("2".into()).action(), None);
        assert_eq!(QuantityChange::Set(2).action(), None);
    }
}
