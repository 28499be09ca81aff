use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};

use crate::models::ValidationError;
use crate::repositories::RepositoryError;
use crate::settings::Settings;

pub mod categories;
pub mod expenses;
pub mod http;
pub mod reports;
pub mod tokens;
pub mod users;

const CHANNEL_CAPACITY: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Category already exists")]
    DuplicateCategory,
    #[error("category_id not found")]
    CategoryNotFound,
    #[error("Expense not found")]
    ExpenseNotFound,
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Could not validate credentials (token invalid or expired)")]
    Unauthorized,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

/// Stable, machine-checkable error classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Auth,
    Dependency,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict_error",
            ErrorKind::NotFound => "not_found_error",
            ErrorKind::Auth => "auth_error",
            ErrorKind::Dependency => "dependency_error",
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) | ServiceError::CategoryNotFound => ErrorKind::Validation,
            ServiceError::DuplicateEmail | ServiceError::DuplicateCategory => ErrorKind::Conflict,
            ServiceError::ExpenseNotFound => ErrorKind::NotFound,
            ServiceError::InvalidCredentials | ServiceError::Unauthorized => ErrorKind::Auth,
            ServiceError::Database(_)
            | ServiceError::Internal(_)
            | ServiceError::Communication(_, _) => ErrorKind::Dependency,
        }
    }

    fn repository(service: &str, error: RepositoryError) -> Self {
        log::error!("{service}: {error}");
        ServiceError::Database(error.to_string())
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

/// Sends a request built around a fresh reply channel and waits for the
/// service's answer.
pub async fn ask<T, R>(
    channel: &mpsc::Sender<T>,
    service: &str,
    request: impl FnOnce(oneshot::Sender<Result<R, ServiceError>>) -> T,
) -> Result<R, ServiceError> {
    let (response_tx, response_rx) = oneshot::channel();

    channel
        .send(request(response_tx))
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?;

    response_rx
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?
}

/// Senders for every running service.
#[derive(Clone)]
pub struct Channels {
    pub users: mpsc::Sender<users::UserRequest>,
    pub categories: mpsc::Sender<categories::CategoryRequest>,
    pub expenses: mpsc::Sender<expenses::ExpenseRequest>,
    pub reports: mpsc::Sender<reports::ReportRequest>,
}

pub fn spawn_services(pool: SqlitePool, tokens: tokens::TokenService) -> Channels {
    let (user_tx, mut user_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (category_tx, mut category_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (expense_tx, mut expense_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (report_tx, mut report_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let mut user_service = users::UserService::new();
    let mut category_service = categories::CategoryService::new();
    let mut expense_service = expenses::ExpenseService::new();
    let mut report_service = reports::ReportService::new();

    log::info!("Starting user service.");
    let user_pool = pool.clone();
    tokio::spawn(async move {
        user_service
            .run(users::UserRequestHandler::new(user_pool, tokens), &mut user_rx)
            .await;
    });

    log::info!("Starting category service.");
    let category_pool = pool.clone();
    tokio::spawn(async move {
        category_service
            .run(
                categories::CategoryRequestHandler::new(category_pool),
                &mut category_rx,
            )
            .await;
    });

    log::info!("Starting expense service.");
    let expense_pool = pool.clone();
    tokio::spawn(async move {
        expense_service
            .run(
                expenses::ExpenseRequestHandler::new(expense_pool),
                &mut expense_rx,
            )
            .await;
    });

    log::info!("Starting report service.");
    tokio::spawn(async move {
        report_service
            .run(reports::ReportRequestHandler::new(pool), &mut report_rx)
            .await;
    });

    Channels {
        users: user_tx,
        categories: category_tx,
        expenses: expense_tx,
        reports: report_tx,
    }
}

pub async fn start_services(pool: SqlitePool, settings: Settings) -> Result<(), anyhow::Error> {
    let tokens = tokens::TokenService::from_settings(&settings.auth)?;
    let channels = spawn_services(pool, tokens.clone());

    log::info!("Starting HTTP server.");
    http::start_http_server(&settings.http.listen, http::AppState::new(channels, tokens)).await
}
