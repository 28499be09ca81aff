use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::RepositoryError;
use crate::models::users;

#[derive(Clone)]
pub struct UserRepository {
    conn: SqlitePool,
}

fn user_from_row(row: &SqliteRow) -> Result<users::User, RepositoryError> {
    Ok(users::User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
    })
}

impl UserRepository {
    pub fn new(conn: SqlitePool) -> Self {
        Self { conn }
    }

    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::User, RepositoryError> {
        let row = sqlx::query(
            r#"
                INSERT INTO users (name, email, password_hash)
                VALUES (?, ?, ?)
                RETURNING id, name, email
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email"))?;

        user_from_row(&row)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<users::User>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<users::UserCredentials>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email, password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.conn)
            .await?;

        match row {
            Some(row) => Ok(Some(users::UserCredentials {
                user: user_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }
}
