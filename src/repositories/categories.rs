use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::RepositoryError;
use crate::models::categories;

#[derive(Clone)]
pub struct CategoryRepository {
    conn: SqlitePool,
}

fn category_from_row(row: &SqliteRow) -> Result<categories::Category, RepositoryError> {
    Ok(categories::Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

impl CategoryRepository {
    pub fn new(conn: SqlitePool) -> Self {
        Self { conn }
    }

    /// The unique index on `name` decides races between concurrent inserts.
    pub async fn insert_category(&self, name: &str) -> Result<categories::Category, RepositoryError> {
        let row = sqlx::query("INSERT INTO categories (name) VALUES (?) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.conn)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category name"))?;

        category_from_row(&row)
    }

    pub async fn list_categories(&self) -> Result<Vec<categories::Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.conn)
            .await?;

        rows.iter().map(category_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::repositories::testing::memory_pool;

    use super::*;

    #[tokio::test]
    async fn lists_by_name() {
        let repository = CategoryRepository::new(memory_pool().await);
        for name in ["Transport", "Food", "Rent"] {
            repository.insert_category(name).await.unwrap();
        }

        let names: Vec<String> = repository
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Food", "Rent", "Transport"]);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let repository = CategoryRepository::new(memory_pool().await);
        repository.insert_category("Food").await.unwrap();

        let result = repository.insert_category("Food").await;

        assert!(matches!(
            result,
            Err(RepositoryError::Duplicate("category name"))
        ));
    }
}
