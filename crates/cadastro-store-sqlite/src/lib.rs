//! SQLite backend for the Cadastro partner registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every batch runs inside one
//! `rusqlite` transaction on that thread.

mod encode;
mod query;
mod schema;
mod store;
mod write;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
