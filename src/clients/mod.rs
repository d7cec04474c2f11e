//! Control-plane clients the restore flow depends on.

pub mod archive;
pub mod key_value;

pub use archive::{ArchiveClient, ArchiveService};
pub use key_value::KeyValueStoreClient;
