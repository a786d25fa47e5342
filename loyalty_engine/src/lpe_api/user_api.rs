use std::fmt::Debug;

use log::*;

use crate::{
    db_types::User,
    traits::{BalanceLedger, UserApiError, UserManagement},
};

/// `UserApi` registers and looks up users. Credentials arrive already hashed.
pub struct UserApi<B> {
    db: B,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> UserApi<B>
where B: UserManagement + BalanceLedger
{
    /// Creates the user, and opens an empty balance for them.
    pub async fn register_user(&self, login: &str, password_hash: &str) -> Result<User, UserApiError> {
        let user = self.db.create_user(login, password_hash).await?;
        self.db.open_balance(login).await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        info!("🔑️ New user registered: {login}");
        Ok(user)
    }

    pub async fn fetch_user(&self, login: &str) -> Result<Option<User>, UserApiError> {
        self.db.fetch_user(login).await
    }
}
