//! SQLite backend for the Carelog store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every call is a closure executed
//! serially on that thread, which is what keeps reads from ever observing a
//! half-applied merge.

mod encode;
mod identity;
mod schema;
mod snapshot;
mod store;
mod write;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
