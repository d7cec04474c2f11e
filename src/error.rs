//! Error types for the archivelib library.

use thiserror::Error;

use crate::archive::FileNode;

/// Main error type for archivelib operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// A requested path has no matching node in the archive tree.
    ///
    /// `listing` holds the nodes seen at the level where matching failed and
    /// `path` the path that could not be matched.
    #[error("File not found in archive for device {device_guid} at {path}")]
    ArchiveFileNotFound {
        device_guid: String,
        path: String,
        listing: Vec<FileNode>,
    },

    /// Resolving a token or target host failed.
    #[error("{message}, caused by {source}")]
    Authentication {
        message: String,
        #[source]
        source: Box<ArchiveError>,
    },

    /// Creating an authenticated session for a host failed.
    #[error("Failed to initialize session for {host}, caused by {source}")]
    SessionInitialization {
        host: String,
        #[source]
        source: Box<ArchiveError>,
    },

    /// The server rejected the request (400).
    #[error("Bad request: {body}")]
    BadRequest { body: String },

    /// The user was already added to the target resource (400 with marker).
    #[error("User already added: {body}")]
    UserAlreadyAdded { body: String },

    /// Credentials were missing or rejected (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The caller lacks permission (403).
    #[error("Forbidden: {body}")]
    Forbidden { body: String },

    /// The server has no such resource (404).
    #[error("Not found: {body}")]
    NotFound { body: String },

    /// HTTP request failed with another status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The device has no backup destination to restore from.
    #[error("No destinations found for device {device_guid}")]
    NoDestination { device_guid: String },

    /// The restore job did not finish within the configured wait.
    #[error("Restore job {job_id} did not complete in time")]
    RestoreJobTimeout { job_id: String },

    /// Waiting for the restore job was cancelled by the caller.
    #[error("Restore job {job_id} was cancelled")]
    RestoreJobCancelled { job_id: String },

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Local I/O error while consuming a restore stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl ArchiveError {
    /// Wrap `source` as an authentication failure with a descriptive message.
    pub(crate) fn authentication(message: impl Into<String>, source: ArchiveError) -> Self {
        ArchiveError::Authentication {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Check whether this is a not-found error from path resolution.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, ArchiveError::ArchiveFileNotFound { .. })
    }
}

/// Result type alias for archivelib operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
