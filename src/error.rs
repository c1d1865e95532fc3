//! Error types cho drive-upload.
//!
//! - `ApiError`: lỗi khi gọi Google API (HTTP, status code, JSON)
//! - `AuthError`: lỗi trong quá trình xác thực OAuth
//! - `SyncError`: lỗi của một lần chạy sync, được trả về cho CLI

use std::path::PathBuf;
use thiserror::Error;

/// Lỗi khi gọi Google API (Drive hoặc OAuth token endpoint)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Đọc body của response lỗi để đưa vào message
    pub(crate) fn from_response(response: reqwest::blocking::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        ApiError::Status { status, body }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "Client secret file not found: {}. Download it from the Google Cloud console (OAuth client, Desktop app)",
        .0.display()
    )]
    MissingClientSecret(PathBuf),

    #[error("Invalid client secret file {}: {reason}", .path.display())]
    InvalidClientSecret { path: PathBuf, reason: String },

    #[error("Cannot start loopback listener: {0}")]
    Listener(String),

    #[error("Authorization callback failed: {0}")]
    Callback(String),

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("OAuth state mismatch in authorization callback")]
    StateMismatch,

    #[error("Token request failed: {0}")]
    Token(#[from] ApiError),

    #[error("Cannot access credential cache: {0}")]
    Cache(#[from] std::io::Error),

    #[error("Invalid credential cache: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Path {} does not exist", .path.display())]
    PathNotFound { path: PathBuf },

    #[error("Cannot read local folder {}: {source}", .path.display())]
    LocalScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot list remote files: {0}")]
    RemoteList(#[source] ApiError),

    #[error("Cannot resolve remote folder '{name}': {source}")]
    Folder {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("Cannot upload {}: {source}", .path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: ApiError,
    },
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
