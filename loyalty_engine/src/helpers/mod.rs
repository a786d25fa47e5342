//! Stateless helper functions.
pub mod luhn;
