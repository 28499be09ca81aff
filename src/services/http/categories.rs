use axum::{extract::State, Json};

use super::{extract::JsonBody, gate::CurrentUser, AppState};
use crate::models::categories::{Category, NewCategory};
use crate::services::{ask, categories::CategoryRequest, ServiceError};

pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(category): JsonBody<NewCategory>,
) -> Result<Json<Category>, ServiceError> {
    log::debug!("User {} creating category '{}'.", user.id, category.name);
    let category = ask(&state.channels.categories, "Categories", |response| {
        CategoryRequest::Create { category, response }
    })
    .await?;

    Ok(Json(category))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Category>>, ServiceError> {
    let categories = ask(&state.channels.categories, "Categories", |response| {
        CategoryRequest::List { response }
    })
    .await?;

    Ok(Json(categories))
}
