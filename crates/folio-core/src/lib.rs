//! # folio-core
//!
//! Foundation types and utilities for the folio chat service.
//!
//! This crate provides the shared vocabulary that all other folio crates
//! depend on:
//!
//! - **Chat types**: [`chat::Session`], [`chat::Message`], [`chat::SourceChunk`]
//! - **IDs**: prefixed UUIDv7 generators in [`ids`]
//! - **Retry**: [`retry::RetryConfig`] and backoff calculation
//! - **Logging**: [`logging::init_subscriber`] subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other folio crates.

#![deny(unsafe_code)]

pub mod chat;
pub mod ids;
pub mod logging;
pub mod retry;
