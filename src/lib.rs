//! drive-upload - upload file local còn thiếu lên Google Drive.
//!
//! Mỗi lần chạy: xác thực, liệt kê file trên Drive có tên chứa chuỗi lọc,
//! liệt kê file local khớp cùng chuỗi lọc, rồi upload những file local
//! chưa có trên Drive vào folder đích.

pub mod cli;
pub mod config;
pub mod error;
pub mod sync;
pub mod utils;

pub use cli::commands::run;
pub use config::{Config, SyncSettings};
pub use error::{ApiError, AuthError, SyncError};
pub use sync::{SyncReport, Synchronizer};
