//! Connections to the backup service API.

pub mod client;
pub mod error;

pub use client::Connection;
pub use error::ApiStatus;
