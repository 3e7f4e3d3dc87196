//! Project row operations for the repository.

use crate::domain::{Amount, Project, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

fn project_from_row(row: &SqliteRow) -> Project {
    Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
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
    /// Insert a new project and return it with its assigned id.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including a name
    /// uniqueness violation, which the API layer checks beforehand).
    pub async fn insert_project(
        &self,
        name: &str,
        description: &str,
        full_amount: Amount,
        create_date: TimeMs,
    ) -> Result<Project, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, full_amount, invested_amount, fully_invested, create_date)
            VALUES (?, ?, ?, 0, 0, ?)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(full_amount.as_i64())
        .bind(create_date.as_i64())
        .execute(self.pool())
        .await?;

        Ok(Project::new(
            result.last_insert_rowid(),
            name,
            description,
            full_amount,
            create_date,
        ))
    }

    /// Get a project by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_project(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, full_amount, invested_amount,
                   fully_invested, create_date, close_date
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(project_from_row))
    }

    /// Look up a project id by its unique name.
    pub async fn project_id_by_name(&self, name: &str) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|r| r.get("id")))
    }

    /// List all projects, oldest row first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, full_amount, invested_amount,
                   fully_invested, create_date, close_date
            FROM projects
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// List open projects in allocation order: ascending creation
    /// time, ties broken by ascending id so results are stable
    /// run-to-run.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_open_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, full_amount, invested_amount,
                   fully_invested, create_date, close_date
            FROM projects
            WHERE fully_invested = 0
            ORDER BY create_date ASC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// Write back a project's editable and allocation fields.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_project(&self, project: &Project) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE projects
            SET name = ?, description = ?, full_amount = ?,
                invested_amount = ?, fully_invested = ?, close_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.full_amount.as_i64())
        .bind(project.invested_amount.as_i64())
        .bind(project.fully_invested)
        .bind(project.close_date.map(|t| t.as_i64()))
        .bind(project.id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete a project by id. Returns whether a row was removed.
    pub async fn delete_project(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
