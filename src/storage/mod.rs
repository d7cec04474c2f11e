//! Storage nodes and their archive endpoints.

pub mod archive;
pub mod factory;

pub use archive::{
    DecryptionKeys, HttpStorageArchiveClient, RestoreJobStarted, RestoreRequest, RestoreSession,
    RestoreStatus, StorageArchiveClient,
};
pub use factory::{StorageClient, StorageClientFactory, StorageClientSource};
