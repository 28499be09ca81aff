use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::{
    extract::{JsonBody, PathParam},
    gate::CurrentUser,
    AppState,
};
use crate::models::expenses::{Expense, ExpenseUpdate, NewExpense};
use crate::services::{ask, expenses::ExpenseRequest, ServiceError};

pub async fn create_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(expense): JsonBody<NewExpense>,
) -> Result<Json<Expense>, ServiceError> {
    let expense = ask(&state.channels.expenses, "Expenses", |response| {
        ExpenseRequest::Create {
            owner_id: user.id,
            expense,
            response,
        }
    })
    .await?;

    Ok(Json(expense))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Expense>>, ServiceError> {
    let expenses = ask(&state.channels.expenses, "Expenses", |response| {
        ExpenseRequest::List {
            owner_id: user.id,
            response,
        }
    })
    .await?;

    Ok(Json(expenses))
}

pub async fn update_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(expense_id): PathParam<i64>,
    JsonBody(changes): JsonBody<ExpenseUpdate>,
) -> Result<Json<Expense>, ServiceError> {
    let expense = ask(&state.channels.expenses, "Expenses", |response| {
        ExpenseRequest::Update {
            owner_id: user.id,
            expense_id,
            changes,
            response,
        }
    })
    .await?;

    Ok(Json(expense))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(expense_id): PathParam<i64>,
) -> Result<Json<Value>, ServiceError> {
    ask(&state.channels.expenses, "Expenses", |response| {
        ExpenseRequest::Delete {
            owner_id: user.id,
            expense_id,
            response,
        }
    })
    .await?;

    Ok(Json(json!({"detail": "Expense deleted"})))
}
