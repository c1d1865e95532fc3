//! Sync module - Đồng bộ folder local lên Google Drive.
//!
//! Module này chứa:
//! - Credential cache và OAuth installed-app flow
//! - DriveApi trait và Google Drive client
//! - Synchronizer: so sánh local/remote và upload file còn thiếu

pub mod credential;
pub mod google_drive;
pub mod oauth;
pub mod provider;
pub mod synchronizer;

pub use credential::Credential;
pub use google_drive::GoogleDriveClient;
pub use oauth::{authorize, InstalledAppFlow, OAuthFlow};
pub use provider::{DriveApi, DriveFile, DriveFileList, DriveQuery, FileUpload};
pub use synchronizer::{
    list_local, plan_uploads, SyncObserver, SyncReport, Synchronizer, UploadedFile,
};
