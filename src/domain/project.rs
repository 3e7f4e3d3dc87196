//! Charity project: a funding target.

use crate::domain::{Amount, EntityKind, LedgerEntity, TimeMs};
use serde::{Deserialize, Serialize};

/// An open funding request that donations are allocated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Row id assigned by the storage layer.
    pub id: i64,
    /// Unique human-readable name.
    pub name: String,
    pub description: String,
    /// Target amount; may be raised (never below the invested amount)
    /// while the project is open.
    pub full_amount: Amount,
    pub invested_amount: Amount,
    pub fully_invested: bool,
    pub create_date: TimeMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<TimeMs>,
}

impl Project {
    /// Create a freshly persisted project: nothing invested, open.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        full_amount: Amount,
        create_date: TimeMs,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            full_amount,
            invested_amount: Amount::zero(),
            fully_invested: false,
            create_date,
            close_date: None,
        }
    }
}

impl LedgerEntity for Project {
    fn id(&self) -> i64 {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Project
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
