use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::expenses::{Expense, ExpenseUpdate, NewExpense};
use crate::repositories::{expenses::ExpenseRepository, RepositoryError};

/// Every request carries the authenticated owner; no operation reaches a row
/// owned by someone else.
pub enum ExpenseRequest {
    Create {
        owner_id: i64,
        expense: NewExpense,
        response: oneshot::Sender<Result<Expense, ServiceError>>,
    },
    List {
        owner_id: i64,
        response: oneshot::Sender<Result<Vec<Expense>, ServiceError>>,
    },
    Update {
        owner_id: i64,
        expense_id: i64,
        changes: ExpenseUpdate,
        response: oneshot::Sender<Result<Expense, ServiceError>>,
    },
    Delete {
        owner_id: i64,
        expense_id: i64,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

fn from_repository(error: RepositoryError) -> ServiceError {
    match error {
        RepositoryError::MissingReference(_) => ServiceError::CategoryNotFound,
        e => ServiceError::repository("ExpenseService", e),
    }
}

#[derive(Clone)]
pub struct ExpenseRequestHandler {
    repository: ExpenseRepository,
}

impl ExpenseRequestHandler {
    pub fn new(sql_conn: SqlitePool) -> Self {
        let repository = ExpenseRepository::new(sql_conn);

        ExpenseRequestHandler { repository }
    }

    async fn create_expense(&self, owner_id: i64, expense: NewExpense) -> Result<Expense, ServiceError> {
        expense.validate()?;

        let created = self
            .repository
            .insert_expense(owner_id, &expense)
            .await
            .map_err(from_repository)?;

        log::info!("Created expense {} for user {}.", created.id, owner_id);
        Ok(created)
    }

    async fn list_expenses(&self, owner_id: i64) -> Result<Vec<Expense>, ServiceError> {
        self.repository
            .list_expenses(owner_id)
            .await
            .map_err(from_repository)
    }

    async fn update_expense(
        &self,
        owner_id: i64,
        expense_id: i64,
        changes: ExpenseUpdate,
    ) -> Result<Expense, ServiceError> {
        let current = self
            .repository
            .get_expense(owner_id, expense_id)
            .await
            .map_err(from_repository)?
            .ok_or(ServiceError::ExpenseNotFound)?;

        let changes = changes.validate()?;
        if changes.is_empty() {
            return Ok(current);
        }

        let updated = self
            .repository
            .update_expense(owner_id, expense_id, changes)
            .await
            .map_err(from_repository)?
            .ok_or(ServiceError::ExpenseNotFound)?;

        log::info!("Updated expense {} for user {}.", expense_id, owner_id);
        Ok(updated)
    }

    async fn delete_expense(&self, owner_id: i64, expense_id: i64) -> Result<(), ServiceError> {
        let deleted = self
            .repository
            .delete_expense(owner_id, expense_id)
            .await
            .map_err(from_repository)?;
        if !deleted {
            return Err(ServiceError::ExpenseNotFound);
        }

        log::info!("Deleted expense {} for user {}.", expense_id, owner_id);
        Ok(())
    }
}

#[async_trait]
impl RequestHandler<ExpenseRequest> for ExpenseRequestHandler {
    async fn handle_request(&self, request: ExpenseRequest) {
        match request {
            ExpenseRequest::Create {
                owner_id,
                expense,
                response,
            } => {
                let expense = self.create_expense(owner_id, expense).await;
                let _ = response.send(expense);
            }
            ExpenseRequest::List { owner_id, response } => {
                let expenses = self.list_expenses(owner_id).await;
                let _ = response.send(expenses);
            }
            ExpenseRequest::Update {
                owner_id,
                expense_id,
                changes,
                response,
            } => {
                let expense = self.update_expense(owner_id, expense_id, changes).await;
                let _ = response.send(expense);
            }
            ExpenseRequest::Delete {
                owner_id,
                expense_id,
                response,
            } => {
                let result = self.delete_expense(owner_id, expense_id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct ExpenseService;

impl ExpenseService {
    pub fn new() -> Self {
        ExpenseService {}
    }
}

#[async_trait]
impl Service<ExpenseRequest, ExpenseRequestHandler> for ExpenseService {}
