//! Classification of API error responses.

use crate::error::ArchiveError;

/// Body marker the server uses when a user is already a member of a resource.
const USER_ALREADY_ADDED_MARKERS: &[&str] = &["USER_ALREADY_IN_HOLD", "ALREADY_A_MEMBER"];

/// HTTP statuses the API gives a distinct meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 5xx
    ServerError,
    /// Any other non-success status
    Other,
}

impl From<u16> for ApiStatus {
    fn from(code: u16) -> Self {
        match code {
            400 => ApiStatus::BadRequest,
            401 => ApiStatus::Unauthorized,
            403 => ApiStatus::Forbidden,
            404 => ApiStatus::NotFound,
            500..=599 => ApiStatus::ServerError,
            _ => ApiStatus::Other,
        }
    }
}

impl ApiStatus {
    /// Get human-readable description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            ApiStatus::BadRequest => "Bad request",
            ApiStatus::Unauthorized => "Unauthorized",
            ApiStatus::Forbidden => "Forbidden",
            ApiStatus::NotFound => "Not found",
            ApiStatus::ServerError => "Server error",
            ApiStatus::Other => "Unexpected status",
        }
    }
}

/// Turn a failed response into a typed error, inspecting the body for known markers.
pub(crate) fn error_for_status(code: u16, body: String) -> ArchiveError {
    match ApiStatus::from(code) {
        ApiStatus::BadRequest => {
            if USER_ALREADY_ADDED_MARKERS.iter().any(|m| body.contains(m)) {
                ArchiveError::UserAlreadyAdded { body }
            } else {
                ArchiveError::BadRequest { body }
            }
        }
        ApiStatus::Unauthorized => ArchiveError::Unauthorized,
        ApiStatus::Forbidden => ArchiveError::Forbidden { body },
        ApiStatus::NotFound => ArchiveError::NotFound { body },
        ApiStatus::ServerError | ApiStatus::Other => ArchiveError::HttpError(code),
    }
}
