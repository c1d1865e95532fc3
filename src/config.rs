//! Config module - Quản lý cấu hình drive-upload (config.toml).
//!
//! File cấu hình là tuỳ chọn, chứa:
//! - Thư mục local, folder trên Drive và chuỗi lọc tên file
//! - Đường dẫn client secret và credential cache
//!
//! Thứ tự ưu tiên: CLI flags > config file > giá trị mặc định.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Folder mặc định trên Google Drive
pub const DEFAULT_DRIVE_FOLDER: &str = "GitBackupTest";

/// Chuỗi lọc mặc định cho tên file
pub const DEFAULT_CONTAIN_QUERY: &str = ".sql";

/// Cấu hình phần sync
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSection {
    /// Thư mục local chứa các file cần upload
    pub local_path: Option<PathBuf>,
    /// Tên folder đích trên Google Drive
    pub drive_folder: Option<String>,
    /// Chuỗi mà tên file phải chứa
    pub contain_query: Option<String>,
}

/// Cấu hình phần xác thực
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSection {
    /// File JSON OAuth client do Google cấp
    pub client_secret_path: Option<PathBuf>,
    /// File cache token
    pub token_cache_path: Option<PathBuf>,
}

/// Nội dung file config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Phiên bản config (để migrate trong tương lai)
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub auth: AuthSection,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            sync: SyncSection::default(),
            auth: AuthSection::default(),
        }
    }
}

/// Thư mục config mặc định (~/.config/drive-upload/)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("drive-upload"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// File OAuth client mặc định (trong config dir)
pub fn default_client_secret_path() -> PathBuf {
    default_config_dir().join("credentials.json")
}

pub fn default_token_cache_path() -> PathBuf {
    default_config_dir().join("token.json")
}

/// Thư mục local mặc định: Desktop của user, fallback thư mục hiện tại
pub fn default_local_path() -> PathBuf {
    dirs::desktop_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config từ file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config nếu file tồn tại, không thì dùng mặc định
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Lưu config ra file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        Ok(())
    }

    /// Gộp config với các giá trị mặc định thành settings cho một lần chạy
    pub fn into_settings(self) -> SyncSettings {
        SyncSettings {
            local_path: self.sync.local_path.unwrap_or_else(default_local_path),
            drive_folder: Some(
                self.sync
                    .drive_folder
                    .unwrap_or_else(|| DEFAULT_DRIVE_FOLDER.to_string()),
            ),
            contain_query: self
                .sync
                .contain_query
                .unwrap_or_else(|| DEFAULT_CONTAIN_QUERY.to_string()),
            client_secret_path: self
                .auth
                .client_secret_path
                .unwrap_or_else(default_client_secret_path),
            token_cache_path: self
                .auth
                .token_cache_path
                .unwrap_or_else(default_token_cache_path),
        }
    }
}

/// Settings đã resolve cho một lần chạy, truyền tường minh vào `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub local_path: PathBuf,
    /// `None` = upload vào root của Drive
    pub drive_folder: Option<String>,
    pub contain_query: String,
    pub client_secret_path: PathBuf,
    pub token_cache_path: PathBuf,
}

impl SyncSettings {
    /// Settings với các giá trị mặc định (không đọc config file)
    pub fn with_defaults() -> Self {
        Config::default().into_settings()
    }
}
