use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::config::{MAX_NAME_LENGTH, MIN_NAME_LENGTH};
use crate::domain::{Amount, LedgerEntity, Project, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub full_amount: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub full_amount: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub full_amount: i64,
    pub invested_amount: i64,
    pub fully_invested: bool,
    pub create_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<i64>,
}

impl From<Project> for ProjectDto {
    fn from(project: Project) -> Self {
        ProjectDto {
            id: project.id,
            name: project.name,
            description: project.description,
            full_amount: project.full_amount.as_i64(),
            invested_amount: project.invested_amount.as_i64(),
            fully_invested: project.fully_invested,
            create_date: project.create_date.as_i64(),
            close_date: project.close_date.map(|t| t.as_i64()),
        }
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let length = name.chars().count();
    if length < MIN_NAME_LENGTH || length > MAX_NAME_LENGTH {
        return Err(AppError::Unprocessable(format!(
            "name must be between {} and {} characters",
            MIN_NAME_LENGTH, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.is_empty() {
        return Err(AppError::Unprocessable(
            "description must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_full_amount(full_amount: i64) -> Result<Amount, AppError> {
    if full_amount <= 0 {
        return Err(AppError::Unprocessable(
            "fullAmount must be positive".into(),
        ));
    }
    Ok(Amount::new(full_amount))
}

async fn check_name_free(state: &AppState, name: &str) -> Result<(), AppError> {
    if state.repo.project_id_by_name(name).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "a project named {:?} already exists",
            name
        )));
    }
    Ok(())
}

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectDto>>, AppError> {
    let projects = state.repo.list_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectDto::from).collect()))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProject>,
) -> Result<Json<ProjectDto>, AppError> {
    validate_name(&body.name)?;
    validate_description(&body.description)?;
    let full_amount = validate_full_amount(body.full_amount)?;
    check_name_free(&state, &body.name).await?;

    let project = state
        .repo
        .insert_project(&body.name, &body.description, full_amount, TimeMs::now())
        .await?;
    let project = state.runner.run_for_project(project).await?;

    Ok(Json(project.into()))
}

pub async fn update_project(
    Path(project_id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateProject>,
) -> Result<Json<ProjectDto>, AppError> {
    let mut project = state
        .repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {} does not exist", project_id)))?;

    if project.fully_invested {
        return Err(AppError::BadRequest(
            "a closed project cannot be edited".into(),
        ));
    }

    if let Some(name) = body.name {
        validate_name(&name)?;
        if name != project.name {
            check_name_free(&state, &name).await?;
        }
        project.name = name;
    }

    if let Some(description) = body.description {
        validate_description(&description)?;
        project.description = description;
    }

    if let Some(full_amount) = body.full_amount {
        let full_amount = validate_full_amount(full_amount)?;
        if full_amount < project.invested_amount {
            return Err(AppError::Unprocessable(format!(
                "the target amount cannot be below the {} already invested",
                project.invested_amount
            )));
        }
        project.full_amount = full_amount;
        // Lowering the target to exactly the invested amount closes
        // the project on the spot.
        if project.invested_amount == project.full_amount {
            project.close(TimeMs::now());
        }
    }

    state.repo.update_project(&project).await?;
    Ok(Json(project.into()))
}

pub async fn delete_project(
    Path(project_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProjectDto>, AppError> {
    let project = state
        .repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {} does not exist", project_id)))?;

    if !project.invested_amount.is_zero() {
        return Err(AppError::BadRequest(
            "a project holding donations cannot be deleted, only closed".into(),
        ));
    }

    state.repo.delete_project(project_id).await?;
    Ok(Json(project.into()))
}
