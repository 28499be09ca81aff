use axum::{extract::State, Json};

use super::{extract::QueryParams, gate::CurrentUser, AppState};
use crate::models::reports::{MonthlySummary, SummaryQuery};
use crate::services::{ask, reports::ReportRequest, ServiceError};

pub async fn monthly_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> Result<Json<MonthlySummary>, ServiceError> {
    let summary = ask(&state.channels.reports, "Reports", |response| {
        ReportRequest::MonthlySummary {
            owner_id: user.id,
            year: query.year,
            month: query.month,
            response,
        }
    })
    .await?;

    Ok(Json(summary))
}
