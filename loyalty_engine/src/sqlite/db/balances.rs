use log::trace;
use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::Balance;

/// Creates a zero balance for `login` if there isn't one already.
pub async fn open_balance(login: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO balances (login, current) VALUES ($1, 0) ON CONFLICT (login) DO NOTHING")
        .bind(login)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_current(login: &str, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    let current = sqlx::query_scalar::<_, i64>("SELECT current FROM balances WHERE login = $1")
        .bind(login)
        .fetch_optional(conn)
        .await?
        .unwrap_or_default();
    Ok(Points::from_hundredths(current))
}

/// The sum of all withdrawals made by `login`. Zero if there are none.
pub async fn withdrawn_total(login: &str, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(withdrawn), 0) FROM orders WHERE login = $1")
        .bind(login)
        .fetch_one(conn)
        .await?;
    Ok(Points::from_hundredths(total))
}

pub async fn fetch_balance(login: &str, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let current = fetch_current(login, &mut *conn).await?;
    let withdrawn = withdrawn_total(login, conn).await?;
    Ok(Balance { current, withdrawn })
}

/// Adds `delta` (which may be negative) to the balance in a single statement, and returns the new balance.
///
/// The arithmetic happens inside the database, so concurrent adjustments for the same user never lose updates.
pub async fn adjust_balance(login: &str, delta: Points, conn: &mut SqliteConnection) -> Result<Points, sqlx::Error> {
    open_balance(login, &mut *conn).await?;
    let current = sqlx::query_scalar::<_, i64>(
        "UPDATE balances SET current = current + $1 WHERE login = $2 RETURNING current",
    )
    .bind(delta.value())
    .bind(login)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Balance for {login} adjusted by {delta} to {}", Points::from_hundredths(current));
    Ok(Points::from_hundredths(current))
}

/// Subtracts `amount` from the balance, but only if the balance covers it.
///
/// Returns the new balance, or `None` if the balance was insufficient, in which case nothing was changed.
pub async fn debit_if_sufficient(
    login: &str,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<Points>, sqlx::Error> {
    open_balance(login, &mut *conn).await?;
    let current = sqlx::query_scalar::<_, i64>(
        "UPDATE balances SET current = current - $1 WHERE login = $2 AND current >= $1 RETURNING current",
    )
    .bind(amount.value())
    .bind(login)
    .fetch_optional(conn)
    .await?;
    Ok(current.map(Points::from_hundredths))
}
