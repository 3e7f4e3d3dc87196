//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database
//! operations. Methods are organized across submodules by entity kind:
//! - `projects.rs` - Project rows
//! - `donations.rs` - Donation rows
//!
//! The commit boundary for allocation runs lives here: a mutation set
//! spanning both tables is applied in one transaction, guarded against
//! concurrent runs.

mod donations;
mod projects;

use crate::domain::{EntityKind, LedgerUpdate};
use sqlx::sqlite::SqlitePool;
use thiserror::Error;

/// Failure modes of the allocation commit.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Another run modified one of the rows between read and commit.
    /// The caller must retry against freshly re-read state.
    #[error("ledger state changed concurrently during allocation commit")]
    Conflict,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist an allocation run's mutation set atomically.
    ///
    /// Every update is applied in a single transaction: either all
    /// rows are durably written or none are. Each UPDATE is guarded on
    /// the invested amount observed when the entity was read; a guard
    /// that matches no row means a concurrent run got there first, the
    /// transaction is rolled back and `CommitError::Conflict` is
    /// returned.
    ///
    /// # Errors
    /// Returns `CommitError::Conflict` on a stale read, or the
    /// underlying `sqlx::Error` if the transaction fails.
    pub async fn commit_allocation(&self, updates: &[LedgerUpdate]) -> Result<(), CommitError> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for update in updates {
            let sql = match update.kind {
                EntityKind::Project => {
                    "UPDATE projects SET invested_amount = ?, fully_invested = ?, close_date = ? \
                     WHERE id = ? AND invested_amount = ?"
                }
                EntityKind::Donation => {
                    "UPDATE donations SET invested_amount = ?, fully_invested = ?, close_date = ? \
                     WHERE id = ? AND invested_amount = ?"
                }
            };

            let result = sqlx::query(sql)
                .bind(update.invested_amount.as_i64())
                .bind(update.fully_invested)
                .bind(update.close_date.map(|t| t.as_i64()))
                .bind(update.id)
                .bind(update.observed_invested.as_i64())
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls it back.
                return Err(CommitError::Conflict);
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
