//! An in-memory storage backend.
//!
//! `MemoryDatabase` implements the same traits as [`crate::SqliteDatabase`] with the same semantics. All state lives
//! behind a single lock, so every operation is trivially atomic. It is intended for tests, as is
//! [`StubAccrualResolver`].
mod resolver;

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use log::*;
use loyalty_common::Points;
pub use resolver::StubAccrualResolver;
use tokio::sync::Mutex;

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

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    orders: Vec<Order>,
    balances: HashMap<String, Points>,
}

impl MemoryState {
    fn find_order(&self, order_number: &OrderNumber) -> Option<&Order> {
        self.orders.iter().find(|o| &o.order_number == order_number)
    }

    fn register(&mut self, order: NewOrder) -> Result<RegisterOrderResult, RegistryError> {
        if let Some(existing) = self.find_order(&order.order_number) {
            return if existing.login == order.login {
                Ok(RegisterOrderResult::AlreadyOwnedBySelf(existing.clone()))
            } else {
                Err(RegistryError::OrderOwnedByOther(order.order_number))
            };
        }
        let inserted = Order {
            id: self.orders.len() as i64 + 1,
            order_number: order.order_number,
            login: order.login,
            status: OrderStatusType::New,
            accrual: None,
            withdrawn: order.withdrawn,
            uploaded_at: order.uploaded_at,
            updated_at: order.uploaded_at,
        };
        self.orders.push(inserted.clone());
        Ok(RegisterOrderResult::Inserted(inserted))
    }

    fn orders_for(&self, login: &str, withdrawals: bool) -> Vec<Order> {
        let mut orders = self
            .orders
            .iter()
            .filter(|o| o.login == login && o.is_withdrawal() == withdrawals)
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        orders
    }

    fn current(&self, login: &str) -> Points {
        self.balances.get(login).copied().unwrap_or_default()
    }

    fn adjust(&mut self, login: &str, delta: Points) -> Points {
        let balance = self.balances.entry(login.to_string()).or_default();
        *balance += delta;
        *balance
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRegistry for MemoryDatabase {
    async fn register_order(&self, order: NewOrder) -> Result<RegisterOrderResult, RegistryError> {
        self.state.lock().await.register(order)
    }

    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, RegistryError> {
        Ok(self.state.lock().await.find_order(order_number).cloned())
    }

    async fn fetch_orders_for_user(&self, login: &str) -> Result<Vec<Order>, RegistryError> {
        Ok(self.state.lock().await.orders_for(login, false))
    }

    async fn fetch_withdrawals_for_user(&self, login: &str) -> Result<Vec<Order>, RegistryError> {
        Ok(self.state.lock().await.orders_for(login, true))
    }
}

impl BalanceLedger for MemoryDatabase {
    async fn open_balance(&self, login: &str) -> Result<(), LedgerError> {
        self.state.lock().await.balances.entry(login.to_string()).or_default();
        Ok(())
    }

    async fn fetch_balance(&self, login: &str) -> Result<Balance, LedgerError> {
        let state = self.state.lock().await;
        let withdrawn = state.orders.iter().filter(|o| o.login == login).map(|o| o.withdrawn).sum();
        Ok(Balance { current: state.current(login), withdrawn })
    }

    async fn check_withdrawable(&self, login: &str, amount: Points) -> Result<(), LedgerError> {
        let available = self.state.lock().await.current(login);
        if available < amount {
            return Err(LedgerError::InsufficientBalance { requested: amount, available });
        }
        Ok(())
    }

    async fn increase_balance(&self, login: &str, amount: Points) -> Result<Points, LedgerError> {
        Ok(self.state.lock().await.adjust(login, amount))
    }

    async fn decrease_balance(&self, login: &str, amount: Points) -> Result<Points, LedgerError> {
        Ok(self.state.lock().await.adjust(login, -amount))
    }
}

impl LoyaltyDatabase for MemoryDatabase {
    fn url(&self) -> &str {
        "memory://"
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
        let mut state = self.state.lock().await;
        let Some(order) = state
            .orders
            .iter_mut()
            .find(|o| &o.order_number == order_number && !o.is_withdrawal() && from.contains(&o.status))
        else {
            return Ok(AccrualUpdate::Unchanged);
        };
        order.status = new_status;
        order.accrual = accrual.or(order.accrual);
        order.updated_at = Utc::now();
        let login = order.login.clone();
        match accrual {
            Some(amount) => {
                let balance = state.adjust(&login, amount);
                trace!("🗃️ [memory] Order [{order_number}] credited {amount} to {login}. Balance: {balance}");
                Ok(AccrualUpdate::Credited { login, amount })
            },
            None => Ok(AccrualUpdate::StatusChanged(new_status)),
        }
    }

    async fn withdraw(&self, order: NewOrder) -> Result<WithdrawalResult, LoyaltyDatabaseError> {
        let amount = order.withdrawn;
        if !amount.is_positive() {
            return Err(LoyaltyDatabaseError::InvalidWithdrawalAmount(amount));
        }
        let mut state = self.state.lock().await;
        let available = state.current(&order.login);
        if available < amount {
            return Err(LoyaltyDatabaseError::InsufficientBalance { requested: amount, available });
        }
        let login = order.login.clone();
        match state.register(order)? {
            RegisterOrderResult::Inserted(order) => {
                let balance = state.adjust(&login, -amount);
                Ok(WithdrawalResult::Recorded { order, balance })
            },
            RegisterOrderResult::AlreadyOwnedBySelf(order) => Ok(WithdrawalResult::AlreadyRecorded(order)),
        }
    }
}

impl UserManagement for MemoryDatabase {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, UserApiError> {
        let mut state = self.state.lock().await;
        if state.users.contains_key(login) {
            return Err(UserApiError::LoginTaken(login.to_string()));
        }
        let user = User {
            id: state.users.len() as i64 + 1,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(login.to_string(), user.clone());
        Ok(user)
    }

    async fn fetch_user(&self, login: &str) -> Result<Option<User>, UserApiError> {
        Ok(self.state.lock().await.users.get(login).cloned())
    }
}
