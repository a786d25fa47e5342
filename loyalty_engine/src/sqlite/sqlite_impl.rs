//! `SqliteDatabase` is the production backend of the loyalty engine.
//!
//! It implements all the traits defined in the [`crate::traits`] module on top of a pooled SQLite connection.
use std::fmt::Debug;

use log::*;
use loyalty_common::Points;
use sqlx::{migrate, SqlitePool};

use super::db::{balances, create_if_missing, db_url, new_pool, orders, users};
use crate::{
    accrual::AccrualResult,
    db_types::{Balance, NewOrder, Order, OrderNumber, OrderStatusType, User},
    traits::{
        AccrualUpdate,
        BalanceLedger,
        LedgerError,
        LoyaltyDatabase,
        LoyaltyDatabaseError,
        OrderRegistry,
        RegisterOrderResult,
        RegistryError,
        UserApiError,
        UserManagement,
        WithdrawalResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the `DATABASE_URI` environment variable or the default url.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database file if it is missing, connects to it, and brings the schema up to date.
    pub async fn create_and_migrate(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        create_if_missing(url).await?;
        let db = Self::new_with_url(url, max_connections).await?;
        db.migrate().await?;
        Ok(db)
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl OrderRegistry for SqliteDatabase {
    async fn register_order(&self, order: NewOrder) -> Result<RegisterOrderResult, RegistryError> {
        let mut conn = self.pool.acquire().await?;
        orders::idempotent_insert(order, &mut conn).await
    }

    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, RegistryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, login: &str) -> Result<Vec<Order>, RegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_login(login, false, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_withdrawals_for_user(&self, login: &str) -> Result<Vec<Order>, RegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_login(login, true, &mut conn).await?;
        Ok(orders)
    }
}

impl BalanceLedger for SqliteDatabase {
    async fn open_balance(&self, login: &str) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        balances::open_balance(login, &mut conn).await?;
        Ok(())
    }

    async fn fetch_balance(&self, login: &str) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(login, &mut conn).await?;
        Ok(balance)
    }

    async fn check_withdrawable(&self, login: &str, amount: Points) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let available = balances::fetch_current(login, &mut conn).await?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance { requested: amount, available });
        }
        Ok(())
    }

    async fn increase_balance(&self, login: &str, amount: Points) -> Result<Points, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let balance = balances::adjust_balance(login, amount, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn decrease_balance(&self, login: &str, amount: Points) -> Result<Points, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let balance = balances::adjust_balance(login, -amount, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn apply_accrual(
        &self,
        order_number: &OrderNumber,
        result: AccrualResult,
    ) -> Result<AccrualUpdate, LoyaltyDatabaseError> {
        use OrderStatusType::*;
        let (new_status, accrual, from) = match result {
            AccrualResult::Registered => return Ok(AccrualUpdate::Unchanged),
            AccrualResult::Processing => (Processing, None, &[New][..]),
            AccrualResult::Invalid => (Invalid, None, &[New, Processing][..]),
            AccrualResult::Processed(amount) => (Processed, Some(amount), &[New, Processing][..]),
        };
        let mut tx = self.pool.begin().await?;
        let owner = orders::transition_status(order_number, new_status, accrual, from, &mut tx).await?;
        let update = match (owner, accrual) {
            (None, _) => AccrualUpdate::Unchanged,
            (Some(login), Some(amount)) => {
                let balance = balances::adjust_balance(&login, amount, &mut tx).await?;
                debug!("🗃️ Order [{order_number}] processed. {login} credited with {amount}. New balance: {balance}");
                AccrualUpdate::Credited { login, amount }
            },
            (Some(_), None) => AccrualUpdate::StatusChanged(new_status),
        };
        tx.commit().await?;
        Ok(update)
    }

    async fn withdraw(&self, order: NewOrder) -> Result<WithdrawalResult, LoyaltyDatabaseError> {
        let amount = order.withdrawn;
        if !amount.is_positive() {
            return Err(LoyaltyDatabaseError::InvalidWithdrawalAmount(amount));
        }
        let login = order.login.clone();
        let mut tx = self.pool.begin().await?;
        let Some(balance) = balances::debit_if_sufficient(&login, amount, &mut tx).await? else {
            let available = balances::fetch_current(&login, &mut tx).await?;
            tx.rollback().await?;
            debug!("🗃️ {login} cannot withdraw {amount}. Only {available} is available");
            return Err(LoyaltyDatabaseError::InsufficientBalance { requested: amount, available });
        };
        match orders::idempotent_insert(order, &mut tx).await {
            Ok(RegisterOrderResult::Inserted(order)) => {
                tx.commit().await?;
                debug!("🗃️ {login} withdrew {amount} against order [{}]. New balance: {balance}", order.order_number);
                Ok(WithdrawalResult::Recorded { order, balance })
            },
            Ok(RegisterOrderResult::AlreadyOwnedBySelf(order)) => {
                tx.rollback().await?;
                debug!("🗃️ {login} already used order [{}]. The withdrawal was not repeated", order.order_number);
                Ok(WithdrawalResult::AlreadyRecorded(order))
            },
            Err(e) => {
                tx.rollback().await?;
                Err(e.into())
            },
        }
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(login, password_hash, &mut conn).await
    }

    async fn fetch_user(&self, login: &str) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(login, &mut conn).await?;
        Ok(user)
    }
}
