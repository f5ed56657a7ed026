//! Typed HTTP client for the Algorand indexer v2 REST API.
//!
//! The indexer is a read-only query service over historical chain data.
//! This crate wraps the small slice of its surface that batch export
//! tooling needs: paginated transaction search (by time range or by
//! address), account state lookup, and a startup health probe.
//!
//! Every method performs exactly one request. Pagination loops, retry,
//! and windowing live in the callers — the client stays a thin gateway.

pub mod client;
pub mod error;
pub mod types;

pub use client::IndexerClient;
pub use error::Error;
pub use types::{Account, AccountResponse, MicroAlgos, RawTransaction, TransactionPage};
