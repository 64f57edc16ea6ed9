//! Bookkeeping for requests the synchronizer has in flight.

use crate::model::OrderId;
use crate::quantity::StepOutcome;
use crate::transport::CartAction;
use std::collections::HashMap;

/// Per-row generation counters and the history a failed step is undone against.
///
/// Every step request and every manual edit advances its row's generation.
/// A completion is current only if no newer generation has been issued for
/// its row since it was dispatched.
///
/// A decrease sent at the floor changes nothing on screen, yet the server
/// still applies it if an earlier decrease never arrived. The ledger keeps
/// those floor-blocked decreases until the row goes quiet so that a failed
/// decrease can hand its unit over to one of them instead of adding it back.
#[derive(Debug, Default)]
pub struct RequestLedger {
    rows: HashMap<OrderId, RowLedger>,
}

#[derive(Debug, Default)]
struct RowLedger {
    generation: u64,
    /// Generation of the last manual edit or `set_quantity`.
    baseline: u64,
    steps_in_flight: usize,
    floor_blocked: Vec<u64>,
    /// Floor-blocked decreases that took over a failed decrease's unit.
    promoted: Vec<u64>,
}

/// What a failed step does to the quantity on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// A manual edit or set replaced the quantity after this step was sent.
    Superseded,
    /// The step never changed the quantity.
    Nothing,
    /// A later floor-blocked decrease now stands for this one.
    HandedOver { to: u64 },
    Increment,
    Decrement,
}

impl RequestLedger {
    /// Records a step whose request is about to be sent and returns its generation.
    pub fn issue_step(
        &mut self,
        order_id: &OrderId,
        action: CartAction,
        applied: StepOutcome,
    ) -> u64 {
        let row = self.rows.entry(order_id.clone()).or_default();
        row.generation += 1;
        row.steps_in_flight += 1;
        if action == CartAction::Decrease && !applied.changed() {
            row.floor_blocked.push(row.generation);
        }
        row.generation
    }

    /// Records a manual edit or set. Steps issued before it are no longer undone.
    pub fn issue_edit(&mut self, order_id: &OrderId) -> u64 {
        let row = self.rows.entry(order_id.clone()).or_default();
        row.generation += 1;
        row.baseline = row.generation;
        row.floor_blocked.clear();
        row.promoted.clear();
        row.generation
    }

    pub fn current(&self, order_id: &OrderId) -> u64 {
        self.rows.get(order_id).map_or(0, |row| row.generation)
    }

    pub fn is_current(&self, order_id: &OrderId, generation: u64) -> bool {
        self.current(order_id) == generation
    }

    /// Decides how to undo a failed step. Call before [`RequestLedger::settle`].
    pub fn roll_back(
        &mut self,
        order_id: &OrderId,
        generation: u64,
        action: CartAction,
        applied: StepOutcome,
    ) -> Rollback {
        let Some(row) = self.rows.get_mut(order_id) else {
            return Rollback::Nothing;
        };
        if generation <= row.baseline {
            return Rollback::Superseded;
        }
        if let Some(index) = row.promoted.iter().position(|&g| g == generation) {
            row.promoted.swap_remove(index);
            return Rollback::Increment;
        }
        if let Some(index) = row.floor_blocked.iter().position(|&g| g == generation) {
            row.floor_blocked.remove(index);
            return Rollback::Nothing;
        }
        if !applied.changed() {
            return Rollback::Nothing;
        }
        match action {
            CartAction::Increase => Rollback::Decrement,
            CartAction::Decrease => {
                match row.floor_blocked.iter().position(|&g| g > generation) {
                    Some(index) => {
                        let to = row.floor_blocked.remove(index);
                        row.promoted.push(to);
                        Rollback::HandedOver { to }
                    }
                    None => Rollback::Increment,
                }
            }
        }
    }

    /// Marks one step request on the row as settled. Once none are left the
    /// floor history is dropped, since no failure can refer to it any more.
    pub fn settle(&mut self, order_id: &OrderId) {
        if let Some(row) = self.rows.get_mut(order_id) {
            row.steps_in_flight = row.steps_in_flight.saturating_sub(1);
            if row.steps_in_flight == 0 {
                row.floor_blocked.clear();
                row.promoted.clear();
            }
        }
    }
}

/// Counters exposed through snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub updates_dispatched: u64,
    pub updates_confirmed: u64,
    /// Successful updates dropped because a newer one was issued.
    pub updates_stale: u64,
    pub updates_failed: u64,
    pub adds_dispatched: u64,
    pub adds_confirmed: u64,
    pub adds_failed: u64,
    /// Add-to-cart clicks ignored while the button was disabled.
    pub duplicate_clicks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWN: StepOutcome = StepOutcome::Changed { from: 2, to: 1 };
    const AT_FLOOR: StepOutcome = StepOutcome::Unchanged(1);

    #[test]
    fn test_newer_generation_supersedes() {
        let mut ledger = RequestLedger::default();
        let row = OrderId::from("1");
        let other = OrderId::from("2");

        assert_eq!(ledger.current(&row), 0);
        let up = StepOutcome::Changed { from: 1, to: 2 };
        let first = ledger.issue_step(&row, CartAction::Increase, up);
        let second = ledger.issue_edit(&row);
        assert!(!ledger.is_current(&row, first));
        assert!(ledger.is_current(&row, second));

        // Rows are independent.
        assert_eq!(ledger.issue_edit(&other), 1);
        assert!(ledger.is_current(&row, second));
    }

    #[test]
    fn test_failed_decrease_hands_unit_to_floor_blocked_one() {
        let mut ledger = RequestLedger::default();
        let row = OrderId::from("1");
        let first = ledger.issue_step(&row, CartAction::Decrease, DOWN);
        let second = ledger.issue_step(&row, CartAction::Decrease, AT_FLOOR);

        assert_eq!(
            ledger.roll_back(&row, first, CartAction::Decrease, DOWN),
            Rollback::HandedOver { to: second }
        );
        ledger.settle(&row);
        // The blocked decrease now carries a real unit of its own.
        assert_eq!(
            ledger.roll_back(&row, second, CartAction::Decrease, AT_FLOOR),
            Rollback::Increment
        );
    }

    #[test]
    fn test_blocked_decrease_failing_first_changes_nothing() {
        let mut ledger = RequestLedger::default();
        let row = OrderId::from("1");
        let first = ledger.issue_step(&row, CartAction::Decrease, DOWN);
        let second = ledger.issue_step(&row, CartAction::Decrease, AT_FLOOR);

        assert_eq!(
            ledger.roll_back(&row, second, CartAction::Decrease, AT_FLOOR),
            Rollback::Nothing
        );
        ledger.settle(&row);
        assert_eq!(
            ledger.roll_back(&row, first, CartAction::Decrease, DOWN),
            Rollback::Increment
        );
    }

    #[test]
    fn test_earlier_blocked_decrease_is_not_taken_over() {
        let mut ledger = RequestLedger::default();
        let row = OrderId::from("1");
        ledger.issue_step(&row, CartAction::Decrease, AT_FLOOR);
        let up = StepOutcome::Changed { from: 1, to: 2 };
        ledger.issue_step(&row, CartAction::Increase, up);
        let down = ledger.issue_step(&row, CartAction::Decrease, DOWN);

        assert_eq!(
            ledger.roll_back(&row, down, CartAction::Decrease, DOWN),
            Rollback::Increment
        );
    }

    #[test]
    fn test_edit_supersedes_earlier_steps() {
        let mut ledger = RequestLedger::default();
        let row = OrderId::from("1");
        let up = StepOutcome::Changed { from: 1, to: 2 };
        let before = ledger.issue_step(&row, CartAction::Increase, up);
        ledger.issue_edit(&row);
        let after = ledger.issue_step(&row, CartAction::Increase, up);

        assert_eq!(
            ledger.roll_back(&row, before, CartAction::Increase, up),
            Rollback::Superseded
        );
        assert_eq!(
            ledger.roll_back(&row, after, CartAction::Increase, up),
            Rollback::Decrement
        );
    }

    #[test]
    fn test_quiet_row_forgets_floor_history() {
        let mut ledger = RequestLedger::default();
        let row = OrderId::from("1");
        let down = ledger.issue_step(&row, CartAction::Decrease, DOWN);
        let blocked = ledger.issue_step(&row, CartAction::Decrease, AT_FLOOR);
        assert_eq!(
            ledger.roll_back(&row, down, CartAction::Decrease, DOWN),
            Rollback::HandedOver { to: blocked }
        );
        ledger.settle(&row);
        assert_eq!(ledger.rows[&row].promoted, vec![blocked]);

        ledger.issue_step(&row, CartAction::Decrease, AT_FLOOR);
        ledger.settle(&row);
        ledger.settle(&row);
        assert!(ledger.rows[&row].floor_blocked.is_empty());
        assert!(ledger.rows[&row].promoted.is_empty());
    }
}
