//! Donation row operations for the repository.

use crate::domain::{Amount, Donation, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

fn donation_from_row(row: &SqliteRow) -> Donation {
    Donation {
        id: row.get("id"),
        comment: row.get("comment"),
        full_amount: Amount::new(row.get("full_amount")),
        invested_amount: Amount::new(row.get("invested_amount")),
        fully_invested: row.get("fully_invested"),
        create_date: TimeMs::new(row.get("create_date")),
        close_date: row
            .get::<Option<i64>, _>("close_date")
            .map(TimeMs::new),
    }
}

impl Repository {
    /// Insert a new donation and return it with its assigned id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_donation(
        &self,
        comment: Option<&str>,
        full_amount: Amount,
        create_date: TimeMs,
    ) -> Result<Donation, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO donations (comment, full_amount, invested_amount, fully_invested, create_date)
            VALUES (?, ?, 0, 0, ?)
            "#,
        )
        .bind(comment)
        .bind(full_amount.as_i64())
        .bind(create_date.as_i64())
        .execute(self.pool())
        .await?;

        Ok(Donation::new(
            result.last_insert_rowid(),
            comment.map(str::to_string),
            full_amount,
            create_date,
        ))
    }

    /// Get a donation by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_donation(&self, id: i64) -> Result<Option<Donation>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, comment, full_amount, invested_amount,
                   fully_invested, create_date, close_date
            FROM donations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(donation_from_row))
    }

    /// List all donations, oldest row first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_donations(&self) -> Result<Vec<Donation>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, comment, full_amount, invested_amount,
                   fully_invested, create_date, close_date
            FROM donations
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(donation_from_row).collect())
    }

    /// List open donations in allocation order: ascending creation
    /// time, ties broken by ascending id so results are stable
    /// run-to-run.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_open_donations(&self) -> Result<Vec<Donation>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, comment, full_amount, invested_amount,
                   fully_invested, create_date, close_date
            FROM donations
            WHERE fully_invested = 0
            ORDER BY create_date ASC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(donation_from_row).collect())
    }
}
