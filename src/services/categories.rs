use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::categories;
use crate::repositories::{categories::CategoryRepository, RepositoryError};

pub enum CategoryRequest {
    Create {
        category: categories::NewCategory,
        response: oneshot::Sender<Result<categories::Category, ServiceError>>,
    },
    List {
        response: oneshot::Sender<Result<Vec<categories::Category>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct CategoryRequestHandler {
    repository: CategoryRepository,
}

impl CategoryRequestHandler {
    pub fn new(sql_conn: SqlitePool) -> Self {
        let repository = CategoryRepository::new(sql_conn);

        CategoryRequestHandler { repository }
    }

    async fn create_category(
        &self,
        category: categories::NewCategory,
    ) -> Result<categories::Category, ServiceError> {
        category.validate()?;

        let created = self
            .repository
            .insert_category(&category.name)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => ServiceError::DuplicateCategory,
                e => ServiceError::repository("CategoryService", e),
            })?;

        log::info!("Created category {} ({}).", created.id, created.name);
        Ok(created)
    }

    async fn list_categories(&self) -> Result<Vec<categories::Category>, ServiceError> {
        self.repository
            .list_categories()
            .await
            .map_err(|e| ServiceError::repository("CategoryService", e))
    }
}

#[async_trait]
impl RequestHandler<CategoryRequest> for CategoryRequestHandler {
    async fn handle_request(&self, request: CategoryRequest) {
        match request {
            CategoryRequest::Create { category, response } => {
                let category = self.create_category(category).await;
                let _ = response.send(category);
            }
            CategoryRequest::List { response } => {
                let categories = self.list_categories().await;
                let _ = response.send(categories);
            }
        }
    }
}

pub struct CategoryService;

impl CategoryService {
    pub fn new() -> Self {
        CategoryService {}
    }
}

#[async_trait]
impl Service<CategoryRequest, CategoryRequestHandler> for CategoryService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;
    use crate::repositories::testing::memory_pool;

    fn named(name: &str) -> categories::NewCategory {
        categories::NewCategory {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn concurrent_duplicates_yield_one_conflict() {
        let handler = CategoryRequestHandler::new(memory_pool().await);
        let first = tokio::spawn({
            let handler = handler.clone();
            async move { handler.create_category(named("Food")).await }
        });
        let second = tokio::spawn({
            let handler = handler.clone();
            async move { handler.create_category(named("Food")).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ServiceError::DuplicateCategory))));
        assert_eq!(handler.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_a_validation_error() {
        let handler = CategoryRequestHandler::new(memory_pool().await);

        let result = handler.create_category(named("  ")).await;

        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::EmptyField("name")))
        ));
    }
}
