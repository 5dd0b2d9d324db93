//! Roommate expense splitting: groups, shared expenses, and who owes whom.
//!
//! The computation core is three pure modules: [`allocation`] splits an
//! expense into shares, [`balance`] nets a member's unpaid shares, and
//! [`exchange`] lists the outstanding debts. [`ledger`] wraps them in
//! commands over a [`store::Store`], and [`routes`] serves those over HTTP.

pub mod allocation;
pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod routes;
pub mod schemas;
pub mod store;

pub use error::{Result, SplitError};
pub use ledger::Ledger;
