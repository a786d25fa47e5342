use chrono::Utc;
use log::{debug, trace};
use loyalty_common::Points;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    traits::{RegisterOrderResult, RegistryError},
};

/// Registers the order, unless the order number is already taken.
///
/// The insert and the ownership check are a single statement, so two connections racing on the same order number
/// cannot both succeed. If the number exists and belongs to `order.login`, the existing order is returned as
/// `AlreadyOwnedBySelf`. If it belongs to someone else, `OrderOwnedByOther` is returned.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<RegisterOrderResult, RegistryError> {
    let number = order.order_number.clone();
    let login = order.login.clone();
    if let Some(inserted) = insert_if_absent(order, conn).await? {
        debug!("🗃️ Order [{number}] registered for {login} with id {}", inserted.id);
        return Ok(RegisterOrderResult::Inserted(inserted));
    }
    let existing = fetch_order_by_number(&number, conn).await?.ok_or_else(|| {
        RegistryError::DatabaseError(format!("Order {number} conflicted on insert, but could not be found"))
    })?;
    if existing.login == login {
        trace!("🗃️ Order [{number}] was already registered by {login}");
        Ok(RegisterOrderResult::AlreadyOwnedBySelf(existing))
    } else {
        debug!("🗃️ {login} tried to register order [{number}], which belongs to another user");
        Err(RegistryError::OrderOwnedByOther(number))
    }
}

async fn insert_if_absent(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                login,
                status,
                withdrawn,
                uploaded_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(order.login)
    .bind(OrderStatusType::New)
    .bind(order.withdrawn.value())
    .bind(order.uploaded_at)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches the accrual orders (`withdrawals = false`) or the withdrawals (`withdrawals = true`) for the user.
///
/// Results are ordered by `uploaded_at` in ascending order.
pub async fn fetch_orders_for_login(
    login: &str,
    withdrawals: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE login = ");
    builder.push_bind(login);
    if withdrawals {
        builder.push(" AND withdrawn > 0");
    } else {
        builder.push(" AND withdrawn = 0");
    }
    builder.push(" ORDER BY uploaded_at ASC, id ASC");
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Fetched {} {} for {login}", orders.len(), if withdrawals { "withdrawals" } else { "orders" });
    Ok(orders)
}

/// Moves an accrual order to `new_status`, but only if its current status is one of `from`.
///
/// Withdrawals are never matched. Returns the owner's login if the order was updated, and `None` if it was not
/// found or was not in one of the `from` states. Callers use the return value to decide whether side effects (such as
/// crediting the ledger) are due, which makes repeated transitions harmless.
pub async fn transition_status(
    order_number: &OrderNumber,
    new_status: OrderStatusType,
    accrual: Option<Points>,
    from: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(new_status);
    builder.push(", accrual = COALESCE(");
    builder.push_bind(accrual.map(|a| a.value()));
    builder.push(", accrual), updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(" WHERE order_number = ");
    builder.push_bind(order_number.as_str());
    builder.push(" AND withdrawn = 0 AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(") RETURNING login");
    let login = builder.build_query_scalar::<String>().fetch_optional(conn).await?;
    if login.is_some() {
        trace!("🗃️ Order [{order_number}] moved to {new_status}");
    }
    Ok(login)
}
