use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::reports::{MonthlySummary, Period};
use crate::repositories::reports::ReportRepository;

pub enum ReportRequest {
    MonthlySummary {
        owner_id: i64,
        year: String,
        month: String,
        response: oneshot::Sender<Result<MonthlySummary, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ReportRequestHandler {
    repository: ReportRepository,
}

impl ReportRequestHandler {
    pub fn new(sql_conn: SqlitePool) -> Self {
        let repository = ReportRepository::new(sql_conn);

        ReportRequestHandler { repository }
    }

    async fn monthly_summary(
        &self,
        owner_id: i64,
        year: &str,
        month: &str,
    ) -> Result<MonthlySummary, ServiceError> {
        let period = Period::parse(year, month)?;

        let entries = self
            .repository
            .month_entries(owner_id, &period)
            .await
            .map_err(|e| ServiceError::repository("ReportService", e))?;

        Ok(MonthlySummary::from_entries(entries)?)
    }
}

#[async_trait]
impl RequestHandler<ReportRequest> for ReportRequestHandler {
    async fn handle_request(&self, request: ReportRequest) {
        match request {
            ReportRequest::MonthlySummary {
                owner_id,
                year,
                month,
                response,
            } => {
                let summary = self.monthly_summary(owner_id, &year, &month).await;
                let _ = response.send(summary);
            }
        }
    }
}

pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        ReportService {}
    }
}

#[async_trait]
impl Service<ReportRequest, ReportRequestHandler> for ReportService {}
