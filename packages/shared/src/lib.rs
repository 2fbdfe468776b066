//! Utilities shared by the Shabe binaries: logging bootstrap and time helpers.

pub mod logger;
pub mod time;
