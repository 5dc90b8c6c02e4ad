//! Undo records for committed purchase steps.

use common::{ItemId, UserId};
use domain::Money;

use crate::steps;

/// The undo action paired with a committed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    /// Undoes `mark_sold_out` by putting the item back on sale.
    RevertItem { item_id: ItemId },

    /// Undoes `debit_buyer` by crediting the amount back.
    RefundBuyer { buyer_id: UserId, amount: Money },
}

impl Compensation {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RevertItem { .. } => steps::COMPENSATE_REVERT_ITEM,
            Self::RefundBuyer { .. } => steps::COMPENSATE_REFUND_BUYER,
        }
    }
}

/// Ordered log of compensations for the steps committed so far.
///
/// A record is pushed right after its step commits. On failure the log is
/// unwound newest first, so a refund always runs before the item revert.
#[derive(Debug, Default)]
pub struct CompensationLog {
    entries: Vec<Compensation>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the undo action of a step that has just committed.
    pub fn push(&mut self, compensation: Compensation) {
        self.entries.push(compensation);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consumes the log, yielding compensations in the order they must run.
    pub fn unwind(self) -> impl Iterator<Item = Compensation> {
        self.entries.into_iter().rev()
    }
}
