use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Amount, Donation, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateDonation {
    pub full_amount: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDto {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub full_amount: i64,
    pub invested_amount: i64,
    pub fully_invested: bool,
    pub create_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<i64>,
}

impl From<Donation> for DonationDto {
    fn from(donation: Donation) -> Self {
        DonationDto {
            id: donation.id,
            comment: donation.comment,
            full_amount: donation.full_amount.as_i64(),
            invested_amount: donation.invested_amount.as_i64(),
            fully_invested: donation.fully_invested,
            create_date: donation.create_date.as_i64(),
            close_date: donation.close_date.map(|t| t.as_i64()),
        }
    }
}

pub async fn list_donations(
    State(state): State<AppState>,
) -> Result<Json<Vec<DonationDto>>, AppError> {
    let donations = state.repo.list_donations().await?;
    Ok(Json(donations.into_iter().map(DonationDto::from).collect()))
}

pub async fn create_donation(
    State(state): State<AppState>,
    Json(body): Json<CreateDonation>,
) -> Result<Json<DonationDto>, AppError> {
    if body.full_amount <= 0 {
        return Err(AppError::Unprocessable(
            "fullAmount must be positive".into(),
        ));
    }

    let donation = state
        .repo
        .insert_donation(
            body.comment.as_deref(),
            Amount::new(body.full_amount),
            TimeMs::now(),
        )
        .await?;
    let donation = state.runner.run_for_donation(donation).await?;

    Ok(Json(donation.into()))
}
