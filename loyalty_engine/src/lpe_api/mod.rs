//! # Loyalty points engine API
//!
//! The API objects here are what the server talks to. Each one wraps a storage backend (and, for order flows, an
//! accrual resolver) and exposes the business operations of the loyalty service.
//!
//! * [`order_flow_api::OrderFlowApi`] accepts orders and reconciles them with the accrual service.
//! * [`balance_api::BalanceApi`] reports balances and handles withdrawals.
//! * [`user_api::UserApi`] registers and looks up users.
pub mod balance_api;
pub mod errors;
pub mod order_flow_api;
pub mod user_api;
