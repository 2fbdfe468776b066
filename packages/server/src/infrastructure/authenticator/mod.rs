//! `Authenticator` implementations.
//!
//! - `google`: validates an OAuth access token against Google's userinfo endpoint
//! - `static_token`: fixed token table from configuration, for development and tests

pub mod google;
pub mod static_token;

pub use google::GoogleAuthenticator;
pub use static_token::{StaticCredential, StaticTokenAuthenticator};
