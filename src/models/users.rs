use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

pub const MIN_PASSWORD_CHARS: usize = 6;
/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is valid"));

/// Public identity of a registered user. Never carries the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A user row together with its stored hash, for login only.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if !EMAIL.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_CHARS));
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::PasswordTooLong(MAX_PASSWORD_BYTES));
        }

        Ok(())
    }
}

/// OAuth2 password-grant form. `username` carries the email.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn new_user(name: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[rstest]
    #[case(new_user("Ana", "ana@example.com", "secret1"), Ok(()))]
    #[case(new_user(" ", "ana@example.com", "secret1"), Err(ValidationError::EmptyField("name")))]
    #[case(
        new_user("Ana", "ana.example.com", "secret1"),
        Err(ValidationError::InvalidEmail("ana.example.com".to_string()))
    )]
    #[case(new_user("Ana", "ana@example.com", "short"), Err(ValidationError::PasswordTooShort(6)))]
    fn validates_registration(#[case] user: NewUser, #[case] expected: Result<(), ValidationError>) {
        assert_eq!(user.validate(), expected);
    }

    #[test]
    fn password_limit_counts_bytes() {
        let at_limit = new_user("Ana", "ana@example.com", &"a".repeat(72));
        let multibyte = new_user("Ana", "ana@example.com", &"é".repeat(37));

        assert_eq!(at_limit.validate(), Ok(()));
        assert_eq!(
            multibyte.validate(),
            Err(ValidationError::PasswordTooLong(72))
        );
    }
}
