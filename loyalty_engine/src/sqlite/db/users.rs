use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::User, traits::UserApiError};

/// Inserts a new user. A duplicate login is reported as `LoginTaken`.
pub async fn insert_user(
    login: &str,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<User, UserApiError> {
    let user: Option<User> = sqlx::query_as(
        r#"
            INSERT INTO users (login, password_hash, created_at) VALUES ($1, $2, $3)
            ON CONFLICT (login) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(login)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    match user {
        Some(user) => {
            debug!("🗃️ User {login} created with id {}", user.id);
            Ok(user)
        },
        None => Err(UserApiError::LoginTaken(login.to_string())),
    }
}

pub async fn fetch_user(login: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(user)
}
