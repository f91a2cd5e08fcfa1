//! Managed authentication.
//!
//! Account lifecycle (signup, sign-in, refresh, sign-out) is delegated to
//! a hosted GoTrue-style provider over REST; access tokens it issues are
//! verified locally as HS256 JWTs so request handling never blocks on the
//! provider.

pub mod client;
pub mod error;
pub mod token;

pub use client::{AuthClient, ProviderUser, TokenGrant};
pub use error::{AuthError, Result};
pub use token::{AuthenticatedUser, Claims, verify_token};
