//! # Storage backend contracts
//!
//! These traits define what a storage backend must provide to support the loyalty engine.
//!
//! * [`OrderRegistry`] maps order numbers to their owners and enforces single ownership.
//! * [`BalanceLedger`] keeps each user's balance, with increase and decrease operations that are atomic per user.
//! * [`LoyaltyDatabase`] ties the two together for the operations that must touch both in a single transaction:
//!   applying an accrual result and recording a withdrawal.
//! * [`UserManagement`] stores user records.
//!
//! [`crate::SqliteDatabase`] is the production implementation. [`crate::memory::MemoryDatabase`] implements the same
//! traits in memory for tests.
mod balance_ledger;
mod data_objects;
mod loyalty_database;
mod order_registry;
mod user_management;

pub use balance_ledger::{BalanceLedger, LedgerError};
pub use data_objects::{AccrualUpdate, RegisterOrderResult, WithdrawalResult};
pub use loyalty_database::{LoyaltyDatabase, LoyaltyDatabaseError};
pub use order_registry::{OrderRegistry, RegistryError};
pub use user_management::{UserApiError, UserManagement};
