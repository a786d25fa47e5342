//! # Loyalty points server
//!
//! This crate hosts the HTTP server for the loyalty points service. It is responsible for:
//! * registering and authenticating users,
//! * accepting order numbers and reporting their accrual status,
//! * reporting balances and handling withdrawals,
//! * running the background worker that reconciles accepted orders with the accrual service.
//!
//! The business rules live in `loyalty_engine`. This crate is a thin layer of routing, serialization and
//! authentication on top of it.
//!
//! ## Configuration
//! The server is configured with command line flags and environment variables. See [cli](cli/index.html) and
//! [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/user/register` and `POST /api/user/login`: issue access tokens.
//! * `POST /api/user/orders` and `GET /api/user/orders`: upload and list orders.
//! * `GET /api/user/balance`, `POST /api/user/balance/withdraw` and `GET /api/user/withdrawals`: spend points.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod reconcile_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
