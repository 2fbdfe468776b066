//! Infrastructure layer: concrete implementations of the domain's collaborator traits.

pub mod authenticator;
pub mod dto;
pub mod transport;
pub mod translator;
