//! Donation: a funding source.

use crate::domain::{Amount, EntityKind, LedgerEntity, TimeMs};
use serde::{Deserialize, Serialize};

/// A monetary contribution distributed across open projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    /// Row id assigned by the storage layer.
    pub id: i64,
    /// Free-text note from the donor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Donated amount; immutable after creation.
    pub full_amount: Amount,
    pub invested_amount: Amount,
    pub fully_invested: bool,
    pub create_date: TimeMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<TimeMs>,
}

impl Donation {
    /// Create a freshly persisted donation: nothing allocated, open.
    pub fn new(
        id: i64,
        comment: Option<String>,
        full_amount: Amount,
        create_date: TimeMs,
    ) -> Self {
        Self {
            id,
            comment,
            full_amount,
            invested_amount: Amount::zero(),
            fully_invested: false,
            create_date,
            close_date: None,
        }
    }
}

impl LedgerEntity for Donation {
    fn id(&self) -> i64 {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Donation
    }

    fn full_amount(&self) -> Amount {
        self.full_amount
    }

    fn invested_amount(&self) -> Amount {
        self.invested_amount
    }

    fn fully_invested(&self) -> bool {
        self.fully_invested
    }

    fn close_date(&self) -> Option<TimeMs> {
        self.close_date
    }

    fn create_date(&self) -> TimeMs {
        self.create_date
    }

    fn add_investment(&mut self, delta: Amount) {
        self.invested_amount += delta;
    }

    fn close(&mut self, now: TimeMs) {
        self.fully_invested = true;
        self.close_date = Some(now);
    }
}
