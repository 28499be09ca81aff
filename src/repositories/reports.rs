use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};

use super::RepositoryError;
use crate::models::reports::Period;

#[derive(Clone)]
pub struct ReportRepository {
    conn: SqlitePool,
}

impl ReportRepository {
    pub fn new(conn: SqlitePool) -> Self {
        Self { conn }
    }

    /// `(category_name, amount)` for each of the owner's expenses dated in
    /// `period`. Summing happens on the caller's side.
    pub async fn month_entries(
        &self,
        owner_id: i64,
        period: &Period,
    ) -> Result<Vec<(String, Decimal)>, RepositoryError> {
        let rows = sqlx::query(
            r#"
                SELECT c.name AS category_name, e.amount AS amount
                FROM expenses e
                JOIN categories c ON e.category_id = c.id
                WHERE e.user_id = ?
                  AND substr(e.date, 1, 8) = ?
            "#,
        )
        .bind(owner_id)
        .bind(period.date_prefix())
        .fetch_all(&self.conn)
        .await?;

        rows.iter()
            .map(|row| {
                let category_name: String = row.try_get("category_name")?;
                let amount: String = row.try_get("amount")?;
                let amount = Decimal::from_str_exact(&amount)
                    .map_err(|e| RepositoryError::Mapping(format!("amount '{amount}': {e}")))?;

                Ok((category_name, amount))
            })
            .collect()
    }
}
