//! # folio-store
//!
//! Session and message persistence for the folio service.
//!
//! The [`SessionStore`] trait is the seam between the HTTP layer and
//! storage. Two backends implement it:
//!
//! - [`postgres::PgStore`] — production backend with denormalized
//!   counters and idempotent schema bootstrap
//! - [`memory::MemoryStore`] — demo mode and tests
//!
//! Ownership checks live in the store: every read/write takes the
//! requesting user (or `None` for anonymous callers) and enforces the
//! anonymous-open / owned-private rule.

#![deny(unsafe_code)]

pub mod errors;
pub mod memory;
pub mod postgres;
pub mod store;

pub use errors::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{CreateSessionOptions, DEFAULT_SESSION_TITLE, SessionStore, SessionUpdate};
