//! HTTP client for the Memory Bank API.
//!
//! Typed access to the notes, graph and auth endpoints. Authentication and
//! the 401 policy are driven by a [`SessionContext`] supplied at build time.
//!
//! [`SessionContext`]: memorybank_core::session::SessionContext

pub mod api;
mod client;
mod error;
pub mod types;

pub use client::{ClientBuilder, DEFAULT_TIMEOUT, MemoryBankClient};
pub use error::{Error, Result};
