use thiserror::Error;

use crate::db_types::User;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}

/// Storage for user records. Credentials are stored as opaque hashes; hashing and verification happen elsewhere.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a user. Fails with [`UserApiError::LoginTaken`] if the login exists.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, UserApiError>;

    async fn fetch_user(&self, login: &str) -> Result<Option<User>, UserApiError>;
}
