pub mod categories;
pub mod database;
pub mod expenses;
pub mod reports;
pub mod users;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write.
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),
    /// A foreign key points at a row that does not exist.
    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    /// A stored row could not be converted into its record type.
    #[error("Row mapping error: {0}")]
    Mapping(String),
}

impl RepositoryError {
    /// Classifies a failed write, turning unique violations into
    /// `Duplicate(field)`.
    fn from_write(error: sqlx::Error, field: &'static str) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate(field),
            _ => Self::Database(error),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnDecode { .. } => {
                Self::Mapping(error.to_string())
            }
            _ => Self::Database(error),
        }
    }
}
