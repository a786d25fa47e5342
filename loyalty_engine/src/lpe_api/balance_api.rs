use std::fmt::Debug;

use log::*;
use loyalty_common::Points;

use crate::{
    db_types::{Balance, NewOrder, Order, OrderNumber},
    lpe_api::errors::BalanceApiError,
    traits::{LoyaltyDatabase, WithdrawalResult},
};

/// `BalanceApi` reports user balances and spends them.
pub struct BalanceApi<B> {
    db: B,
}

impl<B> Debug for BalanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceApi")
    }
}

impl<B> BalanceApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> BalanceApi<B>
where B: LoyaltyDatabase
{
    pub async fn balance(&self, login: &str) -> Result<Balance, BalanceApiError> {
        let balance = self.db.fetch_balance(login).await?;
        Ok(balance)
    }

    /// Checks whether `login` could withdraw `amount` right now. Nothing is reserved.
    pub async fn check_withdrawable(&self, login: &str, amount: Points) -> Result<(), BalanceApiError> {
        self.db.check_withdrawable(login, amount).await?;
        Ok(())
    }

    /// Spends `amount` points of the user's balance against `order_number`.
    ///
    /// The order number must pass the Luhn check and the amount must be positive. The debit and the registration of
    /// the order number happen atomically: if the balance is too low, or the number belongs to someone else, nothing
    /// changes. Repeating a withdrawal the user has already made is reported as
    /// [`WithdrawalResult::AlreadyRecorded`] and is not debited again.
    pub async fn withdraw(
        &self,
        login: &str,
        order_number: &str,
        amount: Points,
    ) -> Result<WithdrawalResult, BalanceApiError> {
        let order_number = OrderNumber::parse(order_number)?;
        if !amount.is_positive() {
            return Err(BalanceApiError::InvalidAmount(amount));
        }
        let result = self.db.withdraw(NewOrder::withdrawal(order_number.clone(), login, amount)).await;
        match &result {
            Ok(WithdrawalResult::Recorded { balance, .. }) => {
                info!("💰️ {login} withdrew {amount} points against order [{order_number}]. Balance: {balance}")
            },
            Ok(WithdrawalResult::AlreadyRecorded(_)) => {
                debug!("💰️ {login} repeated the withdrawal against order [{order_number}]")
            },
            Err(e) => debug!("💰️ {login} could not withdraw {amount} points against order [{order_number}]. {e}"),
        }
        Ok(result?)
    }

    /// The user's withdrawals, oldest first. Returns [`BalanceApiError::NoWithdrawals`] if there are none.
    pub async fn withdrawals(&self, login: &str) -> Result<Vec<Order>, BalanceApiError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(login).await?;
        if withdrawals.is_empty() {
            return Err(BalanceApiError::NoWithdrawals);
        }
        Ok(withdrawals)
    }
}
