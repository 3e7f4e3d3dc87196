//! The ledger-entity capability shared by projects and donations.

use crate::domain::{Amount, TimeMs};
use serde::{Deserialize, Serialize};

/// The two ledger entity kinds.
///
/// An allocation run pairs a trigger of one kind with candidates of
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A funding target.
    Project,
    /// A funding source.
    Donation,
}

impl EntityKind {
    /// The kind on the opposite side of an allocation run.
    pub fn counter(&self) -> EntityKind {
        match self {
            EntityKind::Project => EntityKind::Donation,
            EntityKind::Donation => EntityKind::Project,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Project => write!(f, "project"),
            EntityKind::Donation => write!(f, "donation"),
        }
    }
}

/// Value semantics common to both entity kinds.
///
/// The allocation engine sees entities only through this trait; the
/// kind-specific fields (name, description, comment) never enter the
/// matching loop.
pub trait LedgerEntity {
    fn id(&self) -> i64;
    fn kind(&self) -> EntityKind;
    fn full_amount(&self) -> Amount;
    fn invested_amount(&self) -> Amount;
    fn fully_invested(&self) -> bool;
    fn close_date(&self) -> Option<TimeMs>;
    fn create_date(&self) -> TimeMs;

    /// Record `delta` units moved into this entity.
    fn add_investment(&mut self, delta: Amount);

    /// Mark the entity fully invested at `now`.
    ///
    /// Called exactly once per entity, the moment `invested_amount`
    /// reaches `full_amount`; the flag and close date never revert.
    fn close(&mut self, now: TimeMs);

    /// Remaining shortfall: `full_amount - invested_amount`.
    fn room(&self) -> Amount {
        self.full_amount() - self.invested_amount()
    }

    /// Whether this entity can still take part in an allocation run.
    fn is_open(&self) -> bool {
        !self.fully_invested()
    }

    /// Snapshot the allocation-relevant fields for the commit
    /// boundary. `observed_invested` is the invested amount seen when
    /// the entity was read; the commit guards on it to detect
    /// concurrent runs.
    fn to_update(&self, observed_invested: Amount) -> LedgerUpdate {
        LedgerUpdate {
            kind: self.kind(),
            id: self.id(),
            invested_amount: self.invested_amount(),
            fully_invested: self.fully_invested(),
            close_date: self.close_date(),
            observed_invested,
        }
    }
}

/// One row of the mutation set handed to the commit boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub kind: EntityKind,
    pub id: i64,
    pub invested_amount: Amount,
    pub fully_invested: bool,
    pub close_date: Option<TimeMs>,
    /// Invested amount at read time; the commit's optimistic guard.
    pub observed_invested: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Donation;

    #[test]
    fn test_counter_kind() {
        assert_eq!(EntityKind::Project.counter(), EntityKind::Donation);
        assert_eq!(EntityKind::Donation.counter(), EntityKind::Project);
    }

    #[test]
    fn test_room_and_open() {
        let mut donation = Donation::new(1, None, Amount::new(100), TimeMs::new(1000));
        assert_eq!(donation.room(), Amount::new(100));
        assert!(donation.is_open());

        donation.add_investment(Amount::new(40));
        assert_eq!(donation.room(), Amount::new(60));
        assert!(donation.is_open());
    }

    #[test]
    fn test_to_update_carries_observed_invested() {
        let mut donation = Donation::new(7, None, Amount::new(100), TimeMs::new(1000));
        let observed = donation.invested_amount();
        donation.add_investment(Amount::new(100));
        donation.close(TimeMs::new(5000));

        let update = donation.to_update(observed);
        assert_eq!(update.kind, EntityKind::Donation);
        assert_eq!(update.id, 7);
        assert_eq!(update.invested_amount, Amount::new(100));
        assert!(update.fully_invested);
        assert_eq!(update.close_date, Some(TimeMs::new(5000)));
        assert_eq!(update.observed_invested, Amount::zero());
    }
}
