//! Allocation runs: select open candidates, run the matching loop,
//! commit the mutation set, re-read the trigger.

use crate::db::{CommitError, Repository};
use crate::domain::{Amount, Donation, EntityKind, LedgerEntity, LedgerUpdate, Project, TimeMs};
use crate::engine::{allocate, ConsistencyFault};
use std::sync::Arc;
use thiserror::Error;

/// Attempts per run before a commit conflict is surfaced.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),
    #[error("{kind} {id} disappeared during allocation")]
    TriggerVanished { kind: EntityKind, id: i64 },
}

/// Executes one allocation run per created entity.
///
/// The run reads the open counter-entities, computes the allocation in
/// memory, and persists the whole mutation set atomically. On a commit
/// conflict the run is repeated against freshly re-read state, a
/// bounded number of times; the engine itself never retries and never
/// touches storage.
#[derive(Clone)]
pub struct AllocationRunner {
    repo: Arc<Repository>,
}

impl AllocationRunner {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Allocate open donations into a newly created project and
    /// return the project as re-read after commit.
    pub async fn run_for_project(&self, project: Project) -> Result<Project, RunError> {
        let id = project.id;
        let mut trigger = project;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut candidates = self.repo.list_open_donations().await?;
            let updates = build_mutation_set(&mut trigger, &mut candidates)?;

            match self.repo.commit_allocation(&updates).await {
                Ok(()) => {
                    return self
                        .repo
                        .get_project(id)
                        .await?
                        .ok_or(RunError::TriggerVanished {
                            kind: EntityKind::Project,
                            id,
                        });
                }
                Err(CommitError::Conflict) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(id, attempt, "allocation commit conflict, re-reading state");
                    trigger = self
                        .repo
                        .get_project(id)
                        .await?
                        .ok_or(RunError::TriggerVanished {
                            kind: EntityKind::Project,
                            id,
                        })?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CommitError::Conflict.into())
    }

    /// Allocate a newly created donation across open projects and
    /// return the donation as re-read after commit.
    pub async fn run_for_donation(&self, donation: Donation) -> Result<Donation, RunError> {
        let id = donation.id;
        let mut trigger = donation;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut candidates = self.repo.list_open_projects().await?;
            let updates = build_mutation_set(&mut trigger, &mut candidates)?;

            match self.repo.commit_allocation(&updates).await {
                Ok(()) => {
                    return self
                        .repo
                        .get_donation(id)
                        .await?
                        .ok_or(RunError::TriggerVanished {
                            kind: EntityKind::Donation,
                            id,
                        });
                }
                Err(CommitError::Conflict) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(id, attempt, "allocation commit conflict, re-reading state");
                    trigger = self
                        .repo
                        .get_donation(id)
                        .await?
                        .ok_or(RunError::TriggerVanished {
                            kind: EntityKind::Donation,
                            id,
                        })?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CommitError::Conflict.into())
    }
}

/// Run the matching loop and assemble the mutation set: every touched
/// candidate plus the trigger itself, each carrying the invested
/// amount observed at read time for the commit guard.
fn build_mutation_set<T, C>(
    trigger: &mut T,
    candidates: &mut [C],
) -> Result<Vec<LedgerUpdate>, ConsistencyFault>
where
    T: LedgerEntity,
    C: LedgerEntity,
{
    let now = TimeMs::now();
    let trigger_observed = trigger.invested_amount();
    let observed: Vec<Amount> = candidates.iter().map(|c| c.invested_amount()).collect();

    let touched = allocate(trigger, candidates, now)?;

    let mut updates = Vec::with_capacity(touched.len() + 1);
    for &idx in &touched {
        updates.push(candidates[idx].to_update(observed[idx]));
    }
    // Re-saving an unchanged trigger is a harmless no-op write.
    updates.push(trigger.to_update(trigger_observed));

    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup() -> (AllocationRunner, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));
        (AllocationRunner::new(repo.clone()), repo, temp_dir)
    }

    #[tokio::test]
    async fn test_project_run_consumes_open_donations() {
        let (runner, repo, _temp) = setup().await;

        let d1 = repo
            .insert_donation(None, Amount::new(60), TimeMs::new(1000))
            .await
            .unwrap();
        let d2 = repo
            .insert_donation(None, Amount::new(50), TimeMs::new(2000))
            .await
            .unwrap();

        let project = repo
            .insert_project("shelter", "a roof", Amount::new(100), TimeMs::new(3000))
            .await
            .unwrap();
        let project = runner.run_for_project(project).await.unwrap();

        assert_eq!(project.invested_amount, Amount::new(100));
        assert!(project.fully_invested);
        assert!(project.close_date.is_some());

        let d1 = repo.get_donation(d1.id).await.unwrap().unwrap();
        assert_eq!(d1.invested_amount, Amount::new(60));
        assert!(d1.fully_invested);
        assert_eq!(d1.close_date, project.close_date);

        let d2 = repo.get_donation(d2.id).await.unwrap().unwrap();
        assert_eq!(d2.invested_amount, Amount::new(40));
        assert!(!d2.fully_invested);
        assert!(d2.close_date.is_none());
    }

    #[tokio::test]
    async fn test_donation_run_with_no_open_projects_is_a_no_op() {
        let (runner, repo, _temp) = setup().await;

        let donation = repo
            .insert_donation(Some("idle"), Amount::new(30), TimeMs::new(1000))
            .await
            .unwrap();
        let donation = runner.run_for_donation(donation).await.unwrap();

        assert_eq!(donation.invested_amount, Amount::zero());
        assert!(!donation.fully_invested);
        assert!(donation.close_date.is_none());
    }

    #[tokio::test]
    async fn test_donation_run_fills_oldest_project_first() {
        let (runner, repo, _temp) = setup().await;

        let older = repo
            .insert_project("older", "o", Amount::new(20), TimeMs::new(1000))
            .await
            .unwrap();
        let newer = repo
            .insert_project("newer", "n", Amount::new(20), TimeMs::new(2000))
            .await
            .unwrap();

        let donation = repo
            .insert_donation(None, Amount::new(25), TimeMs::new(3000))
            .await
            .unwrap();
        let donation = runner.run_for_donation(donation).await.unwrap();

        assert_eq!(donation.invested_amount, Amount::new(25));
        assert!(donation.fully_invested);

        let older = repo.get_project(older.id).await.unwrap().unwrap();
        assert!(older.fully_invested);
        let newer = repo.get_project(newer.id).await.unwrap().unwrap();
        assert_eq!(newer.invested_amount, Amount::new(5));
        assert!(!newer.fully_invested);
    }

    #[tokio::test]
    async fn test_runs_accumulate_across_creations() {
        let (runner, repo, _temp) = setup().await;

        let project = repo
            .insert_project("shelter", "a roof", Amount::new(100), TimeMs::new(1000))
            .await
            .unwrap();
        let project = runner.run_for_project(project).await.unwrap();
        assert_eq!(project.invested_amount, Amount::zero());

        for (i, amount) in [40i64, 40, 40].iter().enumerate() {
            let donation = repo
                .insert_donation(None, Amount::new(*amount), TimeMs::new(2000 + i as i64))
                .await
                .unwrap();
            runner.run_for_donation(donation).await.unwrap();
        }

        let project = repo.get_project(project.id).await.unwrap().unwrap();
        assert_eq!(project.invested_amount, Amount::new(100));
        assert!(project.fully_invested);

        // The third donation only placed its remainder's worth.
        let donations = repo.list_donations().await.unwrap();
        assert_eq!(donations[2].invested_amount, Amount::new(20));
        assert!(!donations[2].fully_invested);
    }
}
