use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::AppState;
use crate::models::users::User;
use crate::services::{ask, users::UserRequest, ServiceError};

/// The caller behind a valid bearer token. Extracting it is what makes a
/// route protected.
pub struct CurrentUser(pub User);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ServiceError::Unauthorized)?;
        let user_id = state.tokens.validate(token).map_err(|e| {
            log::warn!("Rejected bearer token: {e}");
            ServiceError::Unauthorized
        })?;

        let user = ask(&state.channels.users, "Users", |response| UserRequest::GetUser {
            id: user_id,
            response,
        })
        .await?;

        match user {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                log::warn!("Token subject {user_id} has no user.");
                Err(ServiceError::Unauthorized)
            }
        }
    }
}
