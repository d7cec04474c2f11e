//! Authenticated sessions and the per-host session cache.

pub mod factory;
pub mod manager;

pub use factory::{HttpSessionFactory, SessionFactory};
pub use manager::StorageSessionManager;
