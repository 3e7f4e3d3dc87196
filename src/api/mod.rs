pub mod donations;
pub mod health;
pub mod projects;

use crate::db::Repository;
use crate::orchestration::AllocationRunner;
use axum::routing::{get, patch};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub runner: AllocationRunner,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        let runner = AllocationRunner::new(repo.clone());
        Self { repo, runner }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:project_id",
            patch(projects::update_project).delete(projects::delete_project),
        )
        .route(
            "/donations",
            get(donations::list_donations).post(donations::create_donation),
        )
        .layer(cors)
        .with_state(state)
}
