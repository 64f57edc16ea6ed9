//! # Add-to-Cart Feedback
//!
//! The button-level state machine shown while an "add to cart" request is
//! running:
//!
//! ```text
//!          click               success              reset delay
//!   Idle ──────────▶ Submitting ───────▶ Added ─────────────────▶ Idle
//!                        │
//!                        └──── failure ────▶ Idle (immediate)
//! ```
//!
//! The button is disabled in every state but `Idle`, so clicks arriving
//! while a request is outstanding (or while "Added" is shown) are ignored.
//! The label captured on the accepted click is restored verbatim on
//! the way back to `Idle`.
//!
//! The machine owns no timers. The [`CartSynchronizer`](crate::sync::CartSynchronizer)
//! schedules the reset and feeds it back in as an event.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of an add-to-cart button on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonId(pub String);

impl From<&str> for ButtonId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for ButtonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Submitting,
    Added,
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click started a submission.
    Accepted,
    /// The button was disabled; nothing was sent.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddToCartButton {
    pub id: ButtonId,
    label: String,
    state: ButtonState,
    saved_label: Option<String>,
}

impl AddToCartButton {
    pub fn new(id: impl Into<ButtonId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            state: ButtonState::Idle,
            saved_label: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == ButtonState::Idle
    }

    /// `Idle → Submitting`. Any other state ignores the click.
    pub fn click(&mut self, submitting_label: &str) -> ClickOutcome {
        if self.state != ButtonState::Idle {
            return ClickOutcome::Ignored;
        }
        self.saved_label = Some(std::mem::replace(
            &mut self.label,
            submitting_label.to_string(),
        ));
        self.state = ButtonState::Submitting;
        ClickOutcome::Accepted
    }

    /// `Submitting → Added`. Returns false if no submission was running.
    pub fn succeed(&mut self, added_label: &str) -> bool {
        if self.state != ButtonState::Submitting {
            return false;
        }
        self.label = added_label.to_string();
        self.state = ButtonState::Added;
        true
    }

    /// `Submitting → Idle`, restoring the original label.
    pub fn fail(&mut self) -> bool {
        if self.state != ButtonState::Submitting {
            return false;
        }
        self.restore();
        true
    }

    /// `Added → Idle` once the feedback delay has elapsed.
    pub fn reset(&mut self) -> bool {
        if self.state != ButtonState::Added {
            return false;
        }
        self.restore();
        true
    }

    fn restore(&mut self) {
        if let Some(label) = self.saved_label.take() {
            self.label = label;
        }
        self.state = ButtonState::Idle;
    }
}
