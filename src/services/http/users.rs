use axum::{extract::State, Json};

use super::extract::{FormBody, JsonBody};
use super::AppState;
use crate::models::{
    auth::AccessToken,
    users::{LoginForm, NewUser, User},
};
use crate::services::{ask, users::UserRequest, ServiceError};

pub async fn register(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<NewUser>,
) -> Result<Json<User>, ServiceError> {
    let user = ask(&state.channels.users, "Users", |response| UserRequest::Register {
        user,
        response,
    })
    .await?;

    Ok(Json(user))
}

pub async fn login(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Json<AccessToken>, ServiceError> {
    let token = ask(&state.channels.users, "Users", |response| UserRequest::Login {
        form,
        response,
    })
    .await?;

    Ok(Json(token))
}
