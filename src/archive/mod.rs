//! Browsing device archives and restoring files from them.
//!
//! The flow is: [`ArchiveAccessorManager`] opens a restore session on the
//! storage node holding a device's archive, the resulting
//! [`ArchiveAccessor`] resolves paths in the archive tree, and a
//! [`RestoreJobManager`] submits the restore job and waits for its
//! [`RestoreStream`].

pub mod accessor;
pub mod manager;
pub mod module;
pub mod node;
pub mod path;
pub mod restore;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use accessor::ArchiveAccessor;
pub use manager::{AccessorOptions, ArchiveAccessorManager};
pub use module::{ArchiveModule, RestoreOptions};
pub use node::{FileNode, FileSelection, FileSizeInfo, FileType, PathSet};
pub use path::FilePaths;
pub use restore::{PollOptions, RestoreJobManager};
pub use stream::RestoreStream;
