use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::oneshot;

use super::tokens::TokenService;
use super::{RequestHandler, Service, ServiceError};
use crate::models::auth::AccessToken;
use crate::models::users;
use crate::repositories::{users::UserRepository, RepositoryError};

pub enum UserRequest {
    Register {
        user: users::NewUser,
        response: oneshot::Sender<Result<users::User, ServiceError>>,
    },
    Login {
        form: users::LoginForm,
        response: oneshot::Sender<Result<AccessToken, ServiceError>>,
    },
    GetUser {
        id: i64,
        response: oneshot::Sender<Result<Option<users::User>, ServiceError>>,
    },
}

/// Checked in place of a stored hash when no account matches the login
/// email. Uses the default Argon2 parameters.
const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| ServiceError::Internal(format!("Could not generate salt: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| ServiceError::Internal(format!("Could not encode salt: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Could not hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: UserRepository,
    tokens: TokenService,
}

impl UserRequestHandler {
    pub fn new(sql_conn: SqlitePool, tokens: TokenService) -> Self {
        let repository = UserRepository::new(sql_conn);

        UserRequestHandler { repository, tokens }
    }

    async fn register(&self, user: users::NewUser) -> Result<users::User, ServiceError> {
        user.validate()?;

        // Hashing runs on the blocking pool.
        let password = user.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))??;

        let created = self
            .repository
            .insert_user(&user.name, &user.email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => ServiceError::DuplicateEmail,
                e => ServiceError::repository("UserService", e),
            })?;

        log::info!("Registered user {}.", created.id);
        Ok(created)
    }

    /// Unknown email and wrong password fail the same way.
    async fn login(&self, form: users::LoginForm) -> Result<AccessToken, ServiceError> {
        let credentials = self
            .repository
            .get_credentials_by_email(&form.username)
            .await
            .map_err(|e| ServiceError::repository("UserService", e))?;
        let (user_id, password_hash) = match credentials {
            Some(credentials) => (Some(credentials.user.id), credentials.password_hash),
            None => (None, UNKNOWN_USER_HASH.to_string()),
        };

        let password = form.password;
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let user_id = match user_id {
            Some(user_id) if verified => user_id,
            Some(user_id) => {
                log::warn!("Failed login for user {user_id}.");
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                log::warn!("Failed login for an unknown email.");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = self
            .tokens
            .issue(user_id, self.tokens.default_ttl())
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(AccessToken::bearer(token))
    }

    async fn get_user(&self, id: i64) -> Result<Option<users::User>, ServiceError> {
        self.repository
            .get_user_by_id(id)
            .await
            .map_err(|e| ServiceError::repository("UserService", e))
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::Register { user, response } => {
                let user = self.register(user).await;
                let _ = response.send(user);
            }
            UserRequest::Login { form, response } => {
                let token = self.login(form).await;
                let _ = response.send(token);
            }
            UserRequest::GetUser { id, response } => {
                let user = self.get_user(id).await;
                let _ = response.send(user);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::models::ValidationError;
    use crate::repositories::testing::memory_pool;

    async fn handler() -> UserRequestHandler {
        let tokens = TokenService::new(b"test-secret", Algorithm::HS256, Duration::hours(8)).unwrap();
        UserRequestHandler::new(memory_pool().await, tokens)
    }

    fn new_user(email: &str, password: &str) -> users::NewUser {
        users::NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_form(username: &str, password: &str) -> users::LoginForm {
        users::LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn stored_hash_is_salted_argon2() {
        let handler = handler().await;
        let user = handler
            .register(new_user("ana@example.com", "secret1"))
            .await
            .unwrap();

        let credentials = handler
            .repository
            .get_credentials_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(credentials.user, user);
        assert!(credentials.password_hash.starts_with("$argon2id$"));
        assert!(!credentials.password_hash.contains("secret1"));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let handler = handler().await;
        handler
            .register(new_user("ana@example.com", "secret1"))
            .await
            .unwrap();

        let result = handler
            .register(new_user("ana@example.com", "another1"))
            .await;

        assert!(matches!(result, Err(ServiceError::DuplicateEmail)));
        // The first password still works, so the row was not replaced.
        assert!(handler
            .login(login_form("ana@example.com", "secret1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn overlong_password_is_refused_before_hashing() {
        let handler = handler().await;

        let result = handler
            .register(new_user("ana@example.com", &"x".repeat(73)))
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::PasswordTooLong(72)))
        ));
        assert_eq!(handler.get_user(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn login_issues_a_token_for_the_user() {
        let handler = handler().await;
        let user = handler
            .register(new_user("ana@example.com", "secret1"))
            .await
            .unwrap();

        let token = handler
            .login(login_form("ana@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(handler.tokens.validate(&token.access_token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let handler = handler().await;
        handler
            .register(new_user("ana@example.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = handler
            .login(login_form("ana@example.com", "wrong-password"))
            .await
            .unwrap_err();
        let unknown_email = handler
            .login(login_form("bo@example.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown_email, ServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[test]
    fn unknown_user_hash_costs_the_same_as_a_real_one() {
        let parsed = PasswordHash::new(UNKNOWN_USER_HASH).unwrap();
        let params = argon2::Params::try_from(&parsed).unwrap();
        let defaults = argon2::Params::default();

        assert_eq!(parsed.algorithm, argon2::Algorithm::Argon2id.ident());
        assert_eq!(params.m_cost(), defaults.m_cost());
        assert_eq!(params.t_cost(), defaults.t_cost());
        assert_eq!(params.p_cost(), defaults.p_cost());
        assert!(!verify_password("secret1", UNKNOWN_USER_HASH));
    }
}
