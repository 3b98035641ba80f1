//! Core types and trait definitions for the Carelog care-facility store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the date normaliser, the age buckets, the shared per-person projection and
//! every statistics view derived from it. Storage backends only fetch rows.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod bucket;
pub mod date;
pub mod error;
pub mod import;
pub mod person;
pub mod projection;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
