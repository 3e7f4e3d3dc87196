//! The greedy matching loop at the heart of the ledger.
//!
//! Pure in-memory computation: the engine never holds a storage
//! handle. The caller loads candidates in creation order, hands them
//! over together with a single `now` timestamp, and persists the
//! mutation set the engine reports back.

use crate::domain::{Amount, EntityKind, LedgerEntity, TimeMs};
use thiserror::Error;

/// An invariant was violated after the matching loop.
///
/// Indicates a logic bug, never a user error; surfaced loudly and
/// never silently corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{kind} {id} violates ledger invariants: invested {invested} of {full}, closed={closed}"
)]
pub struct ConsistencyFault {
    pub kind: EntityKind,
    pub id: i64,
    pub invested: Amount,
    pub full: Amount,
    pub closed: bool,
}

/// Distribute the trigger's shortfall across open candidates,
/// oldest-first.
///
/// Each candidate receives `min(remaining, candidate_room)`; every
/// unit moved into a candidate is simultaneously moved into the
/// trigger. A candidate that fills is closed at `now`; the trigger
/// closes and the loop stops the instant its own target is reached,
/// leaving later candidates untouched. First-come-first-served
/// fairness, not optimal packing.
///
/// Returns the indices of candidates that actually received or
/// supplied funds; the caller assembles the mutation set from those
/// plus the trigger. An already-satisfied trigger or an empty
/// candidate list yields an empty touched set.
pub fn allocate<T, C>(
    trigger: &mut T,
    candidates: &mut [C],
    now: TimeMs,
) -> Result<Vec<usize>, ConsistencyFault>
where
    T: LedgerEntity,
    C: LedgerEntity,
{
    let mut touched = Vec::new();
    let mut remaining = trigger.room();

    for (idx, candidate) in candidates.iter_mut().enumerate() {
        if remaining.is_zero() {
            break;
        }

        // The selector only hands out open candidates, and an open
        // candidate always has room; skip without touching if one
        // slips through anyway.
        let delta = remaining.min(candidate.room());
        if delta.is_zero() {
            continue;
        }

        candidate.add_investment(delta);
        trigger.add_investment(delta);
        remaining -= delta;

        if candidate.invested_amount() == candidate.full_amount() {
            candidate.close(now);
        }
        touched.push(idx);

        if trigger.invested_amount() == trigger.full_amount() {
            trigger.close(now);
            break;
        }
    }

    check_invariants(trigger)?;
    for &idx in &touched {
        check_invariants(&candidates[idx])?;
    }

    Ok(touched)
}

/// Verify the at-rest invariants on one entity.
fn check_invariants<E: LedgerEntity>(entity: &E) -> Result<(), ConsistencyFault> {
    let invested = entity.invested_amount();
    let full = entity.full_amount();
    let consistent = invested >= Amount::zero()
        && invested <= full
        && entity.fully_invested() == (invested == full)
        && entity.close_date().is_some() == entity.fully_invested();

    if consistent {
        Ok(())
    } else {
        Err(ConsistencyFault {
            kind: entity.kind(),
            id: entity.id(),
            invested,
            full,
            closed: entity.fully_invested(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Donation, Project};

    const NOW: TimeMs = TimeMs(10_000);

    fn project(id: i64, full: i64, created: i64) -> Project {
        Project::new(
            id,
            format!("project-{id}"),
            "test project",
            Amount::new(full),
            TimeMs::new(created),
        )
    }

    fn donation(id: i64, full: i64, created: i64) -> Donation {
        Donation::new(id, None, Amount::new(full), TimeMs::new(created))
    }

    #[test]
    fn project_fills_from_oldest_donations_first() {
        // Scenario A: project 100 against donations 60 (older) and 50.
        let mut trigger = project(1, 100, 3000);
        let mut candidates = vec![donation(1, 60, 1000), donation(2, 50, 2000)];

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();
        assert_eq!(touched, vec![0, 1]);

        assert_eq!(candidates[0].invested_amount, Amount::new(60));
        assert!(candidates[0].fully_invested);
        assert_eq!(candidates[0].close_date, Some(NOW));

        assert_eq!(candidates[1].invested_amount, Amount::new(40));
        assert!(!candidates[1].fully_invested);
        assert!(candidates[1].close_date.is_none());

        assert_eq!(trigger.invested_amount, Amount::new(100));
        assert!(trigger.fully_invested);
        assert_eq!(trigger.close_date, Some(NOW));
    }

    #[test]
    fn no_candidates_leaves_trigger_unchanged() {
        // Scenario B: donation with no open projects.
        let mut trigger = donation(1, 30, 1000);
        let mut candidates: Vec<Project> = Vec::new();

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();
        assert!(touched.is_empty());
        assert_eq!(trigger.invested_amount, Amount::zero());
        assert!(!trigger.fully_invested);
    }

    #[test]
    fn exact_match_closes_both_sides_at_same_instant() {
        // Scenario C: donation 20 against a single project 20.
        let mut trigger = donation(1, 20, 2000);
        let mut candidates = vec![project(1, 20, 1000)];

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();
        assert_eq!(touched, vec![0]);

        assert!(trigger.fully_invested);
        assert!(candidates[0].fully_invested);
        assert_eq!(trigger.close_date, candidates[0].close_date);
        assert_eq!(trigger.close_date, Some(NOW));
    }

    #[test]
    fn satisfied_trigger_leaves_later_candidates_untouched() {
        // Order fairness: a shortfall covered by the first two
        // candidates must not reach the third.
        let mut trigger = project(1, 15, 4000);
        let mut candidates = vec![
            donation(1, 10, 1000),
            donation(2, 10, 2000),
            donation(3, 10, 3000),
        ];

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();
        assert_eq!(touched, vec![0, 1]);

        assert_eq!(candidates[0].invested_amount, Amount::new(10));
        assert_eq!(candidates[1].invested_amount, Amount::new(5));
        assert_eq!(candidates[2].invested_amount, Amount::zero());
        assert!(candidates[2].close_date.is_none());
    }

    #[test]
    fn fully_invested_trigger_is_a_no_op() {
        let mut trigger = project(1, 50, 1000);
        trigger.add_investment(Amount::new(50));
        trigger.close(TimeMs::new(5000));

        let mut candidates = vec![donation(1, 10, 2000)];
        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();

        assert!(touched.is_empty());
        assert_eq!(candidates[0].invested_amount, Amount::zero());
        assert_eq!(trigger.close_date, Some(TimeMs::new(5000)));
    }

    #[test]
    fn partially_invested_trigger_only_draws_its_shortfall() {
        // Re-entrant call: the trigger already holds 30 of 100.
        let mut trigger = project(1, 100, 1000);
        trigger.add_investment(Amount::new(30));

        let mut candidates = vec![donation(1, 200, 2000)];
        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();

        assert_eq!(touched, vec![0]);
        assert_eq!(trigger.invested_amount, Amount::new(100));
        assert!(trigger.fully_invested);
        assert_eq!(candidates[0].invested_amount, Amount::new(70));
        assert!(!candidates[0].fully_invested);
    }

    #[test]
    fn zero_room_candidate_is_skipped_without_being_touched() {
        // Defensive: a full-but-unclosed candidate should never reach
        // the engine, but if it does it must not enter the touched set.
        let mut stale = donation(1, 10, 1000);
        stale.add_investment(Amount::new(10));
        // fully_invested deliberately left false to model the stale row

        let mut trigger = project(1, 20, 3000);
        let mut candidates = vec![stale, donation(2, 20, 2000)];

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();
        assert_eq!(touched, vec![1]);
        assert_eq!(trigger.invested_amount, Amount::new(20));
        assert_eq!(candidates[1].invested_amount, Amount::new(20));
    }

    #[test]
    fn money_is_conserved_and_monotone() {
        let mut trigger = project(1, 75, 5000);
        let mut candidates = vec![
            donation(1, 20, 1000),
            donation(2, 40, 2000),
            donation(3, 30, 3000),
        ];
        let before: Vec<Amount> = candidates.iter().map(|d| d.invested_amount).collect();

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();

        let mut moved = Amount::zero();
        for (idx, candidate) in candidates.iter().enumerate() {
            assert!(candidate.invested_amount >= before[idx]);
            moved += candidate.invested_amount - before[idx];
        }
        assert_eq!(moved, trigger.invested_amount);
        assert_eq!(touched, vec![0, 1, 2]);
        assert_eq!(candidates[2].invested_amount, Amount::new(15));
    }

    #[test]
    fn donation_spreads_across_multiple_projects() {
        let mut trigger = donation(1, 100, 5000);
        let mut candidates = vec![project(1, 30, 1000), project(2, 30, 2000), project(3, 30, 3000)];

        let touched = allocate(&mut trigger, &mut candidates, NOW).unwrap();
        assert_eq!(touched, vec![0, 1, 2]);

        for candidate in &candidates {
            assert!(candidate.fully_invested);
            assert_eq!(candidate.close_date, Some(NOW));
        }
        assert_eq!(trigger.invested_amount, Amount::new(90));
        assert!(!trigger.fully_invested);
    }
}
