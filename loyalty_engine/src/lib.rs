//! Loyalty Points Engine
//!
//! The engine settles loyalty orders submitted by registered users. Order numbers are validated and registered with
//! single-owner semantics, their accrual is resolved asynchronously from an external accrual service, and the result
//! is credited to a per-user balance ledger that also serves withdrawals.
//!
//! The library is divided into these main sections:
//! 1. Storage backends. The behaviour every backend must provide is defined by the traits in [`mod@traits`].
//!    [`SqliteDatabase`] is the production backend. An in-memory backend, [`memory::MemoryDatabase`], is available
//!    with the `test_utils` feature.
//! 2. The accrual resolver ([`mod@accrual`]), an HTTP client for the external accrual service.
//! 3. The public API ([`mod@lpe_api`]): [`OrderFlowApi`] drives submission, listing and reconciliation,
//!    [`BalanceApi`] serves balances and withdrawals, and [`UserApi`] manages user records.
//! 4. The reconciliation work queue ([`mod@reconciliation`]), a bounded queue drained by a small pool of workers that
//!    reconcile orders after they have been accepted.
pub mod accrual;
pub mod db_types;
pub mod helpers;
pub mod lpe_api;
pub mod reconciliation;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod memory;
#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use accrual::{AccrualClient, AccrualConfig, AccrualError, AccrualResolver, AccrualResult};
pub use lpe_api::{
    balance_api::BalanceApi,
    errors::{BalanceApiError, OrderFlowError},
    order_flow_api::{OrderFlowApi, SubmitOrderOutcome},
    user_api::UserApi,
};
pub use reconciliation::{ReconcileJob, ReconciliationConfig, ReconciliationProducer, ReconciliationQueue};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
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
};
