//! # archivelib
//!
//! Rust client library for restoring files from device backups held by an
//! archive service.
//!
//! ## Features
//!
//! - **Authentication**: local accounts (basic credentials exchanged for a
//!   JWT), legacy v1 tokens, and the temporary login tokens storage nodes
//!   accept.
//! - **Storage sessions**: the storage node holding a device's archive is
//!   discovered through the control plane; one authenticated session per
//!   node is created and shared, even under concurrent use.
//! - **Restores**:
//!   - Case-insensitive path lookup in the archive tree, with either path
//!     separator.
//!   - Several paths restored as one job (zipped), a single file as raw bytes.
//!   - Custom encryption keys, archive passwords or server-managed keys.
//!   - Result delivered as a byte stream with progress reporting.
//! - **Configuration** through [`SdkConfig`], loadable from TOML.
//!
//! ## Example
//!
//! ```no_run
//! use archivelib::{RestoreOptions, Sdk};
//!
//! # async fn example() -> archivelib::Result<()> {
//! let sdk = Sdk::from_local_account("https://console.example.com", "admin", "secret").await?;
//!
//! let stream = sdk
//!     .archive()
//!     .stream_from_backup("C:\\Users\\me\\report.docx", "device-guid", &RestoreOptions::default())
//!     .await?;
//!
//! let mut file = tokio::fs::File::create("report.docx").await?;
//! let written = stream.write_to(&mut file).await?;
//! println!("{} bytes restored", written);
//! # Ok(())
//! # }
//! ```
//!
//! Lower-level access, e.g. browsing the archive tree, goes through an
//! [`ArchiveAccessor`]:
//!
//! ```no_run
//! # async fn example(sdk: archivelib::Sdk) -> archivelib::Result<()> {
//! use archivelib::AccessorOptions;
//!
//! let accessor = sdk
//!     .archive()
//!     .get_archive_accessor("device-guid", &AccessorOptions::default())
//!     .await?;
//! for root in accessor.list_children(None).await? {
//!     println!("{} ({:?})", root.path, root.file_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod archive;
pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod http;
pub mod progress;
pub mod sdk;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use archive::{
    AccessorOptions, ArchiveAccessor, ArchiveModule, FileNode, FilePaths, FileType,
    PollOptions, RestoreOptions, RestoreStream,
};
pub use config::SdkConfig;
pub use error::{ArchiveError, Result};
pub use progress::{ProgressCallback, TransferProgress};
pub use sdk::Sdk;
