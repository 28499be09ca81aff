use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::RepositoryError;
use crate::models::expenses::{Amount, Expense, ExpenseChanges, NewExpense};

const COLUMNS: &str = "id, user_id, category_id, amount, date, note";

#[derive(Clone)]
pub struct ExpenseRepository {
    conn: SqlitePool,
}

fn expense_from_row(row: &SqliteRow) -> Result<Expense, RepositoryError> {
    let amount: String = row.try_get("amount")?;
    let amount: Amount = amount
        .parse()
        .map_err(|e| RepositoryError::Mapping(format!("amount '{amount}': {e}")))?;

    Ok(Expense {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        category_id: row.try_get("category_id")?,
        amount,
        date: row.try_get("date")?,
        note: row.try_get("note")?,
    })
}

impl ExpenseRepository {
    pub fn new(conn: SqlitePool) -> Self {
        Self { conn }
    }

    /// Inserts only when the category exists; the check and the write are one
    /// statement.
    pub async fn insert_expense(
        &self,
        owner_id: i64,
        expense: &NewExpense,
    ) -> Result<Expense, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
                INSERT INTO expenses (user_id, category_id, amount, date, note)
                SELECT ?, id, ?, ?, ? FROM categories WHERE id = ?
                RETURNING {COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(expense.amount.to_string())
        .bind(&expense.date)
        .bind(&expense.note)
        .bind(expense.category_id)
        .fetch_optional(&self.conn)
        .await?;

        match row {
            Some(row) => expense_from_row(&row),
            None => Err(RepositoryError::MissingReference("category")),
        }
    }

    pub async fn list_expenses(&self, owner_id: i64) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM expenses WHERE user_id = ? ORDER BY date DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.conn)
        .await?;

        rows.iter().map(expense_from_row).collect()
    }

    pub async fn get_expense(
        &self,
        owner_id: i64,
        expense_id: i64,
    ) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM expenses WHERE id = ? AND user_id = ?"
        ))
        .bind(expense_id)
        .bind(owner_id)
        .fetch_optional(&self.conn)
        .await?;

        row.as_ref().map(expense_from_row).transpose()
    }

    async fn category_exists(&self, category_id: i64) -> Result<bool, RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
            .bind(category_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(found.is_some())
    }

    /// Writes only the changed columns. `Ok(None)` when the caller does not
    /// own an expense with this id.
    pub async fn update_expense(
        &self,
        owner_id: i64,
        expense_id: i64,
        changes: ExpenseChanges,
    ) -> Result<Option<Expense>, RepositoryError> {
        if changes.is_empty() {
            return self.get_expense(owner_id, expense_id).await;
        }

        // Categories are never deleted, so the check cannot go stale.
        if let Some(category_id) = changes.category_id {
            if !self.category_exists(category_id).await? {
                return Err(RepositoryError::MissingReference("category"));
            }
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE expenses SET ");
        let mut set = query.separated(", ");
        if let Some(category_id) = changes.category_id {
            set.push("category_id = ").push_bind_unseparated(category_id);
        }
        if let Some(amount) = changes.amount {
            set.push("amount = ").push_bind_unseparated(amount.to_string());
        }
        if let Some(date) = changes.date {
            set.push("date = ").push_bind_unseparated(date);
        }
        if let Some(note) = changes.note {
            set.push("note = ").push_bind_unseparated(note);
        }
        query
            .push(" WHERE id = ")
            .push_bind(expense_id)
            .push(" AND user_id = ")
            .push_bind(owner_id)
            .push(format!(" RETURNING {COLUMNS}"));

        let row = query.build().fetch_optional(&self.conn).await?;

        row.as_ref().map(expense_from_row).transpose()
    }

    /// `Ok(false)` when the caller does not own an expense with this id.
    pub async fn delete_expense(&self, owner_id: i64, expense_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
            .bind(expense_id)
            .bind(owner_id)
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
