use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use super::tokens::TokenService;
use super::{Channels, ErrorKind, ServiceError};

mod categories;
mod expenses;
mod extract;
mod gate;
mod reports;
mod users;


#[derive(Clone)]
pub struct AppState {
    channels: Channels,
    tokens: TokenService,
}

impl AppState {
    pub fn new(channels: Channels, tokens: TokenService) -> Self {
        Self { channels, tokens }
    }
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::DuplicateEmail
            | ServiceError::DuplicateCategory
            | ServiceError::CategoryNotFound
            | ServiceError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ServiceError::ExpenseNotFound => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Database(_)
            | ServiceError::Internal(_)
            | ServiceError::Communication(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let detail = match kind {
            ErrorKind::Dependency => {
                log::error!("Request failed: {self}");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        let body = Json(json!({
            "detail": detail,
            "kind": kind.as_str(),
        }));

        match self {
            ServiceError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                body,
            )
                .into_response(),
            _ => (self.status(), body).into_response(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(users::register))
        .route("/api/token", post(users::login))
        .route("/api/addcategories", post(categories::create_category))
        .route("/api/getcategories", get(categories::list_categories))
        .route("/api/addexpenses", post(expenses::create_expense))
        .route("/api/getexpenses", get(expenses::list_expenses))
        .route("/api/editexpenses/{expense_id}", put(expenses::update_expense))
        .route(
            "/api/deleteexpenses/{expense_id}",
            delete(expenses::delete_expense),
        )
        .route("/api/reports/monthly_summary", get(reports::monthly_summary))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(listen: &str, state: AppState) -> Result<(), anyhow::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
