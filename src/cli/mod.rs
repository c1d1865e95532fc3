//! CLI definitions và command implementation cho drive-upload.

pub mod commands;

use crate::config::{Config, SyncSettings};
use clap::Parser;
use std::path::PathBuf;

/// Upload files from a local folder into a Google Drive folder.
///
/// The Drive API must be enabled for the Google account, and an OAuth client
/// (Desktop app) downloaded as JSON. The first run opens a browser to
/// authorize; the token is cached for later runs.
#[derive(Parser, Debug)]
#[command(name = "drive-upload")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Local folder containing the files to upload
    #[arg(long = "local_path", alias = "lp", value_name = "DIR")]
    pub local_path: Option<PathBuf>,

    /// Folder in Google Drive the files are uploaded into
    #[arg(long = "drive_folder", alias = "df", value_name = "NAME")]
    pub drive_folder: Option<String>,

    /// Substring a file name must contain to be synchronized
    #[arg(
        long = "contain_querry",
        visible_alias = "contain_query",
        alias = "cq",
        value_name = "TEXT"
    )]
    pub contain_query: Option<String>,

    /// Config file (default: <config dir>/drive-upload/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// OAuth client secret JSON from the Google Cloud console
    #[arg(long, value_name = "FILE")]
    pub client_secret: Option<PathBuf>,

    /// Token cache file
    #[arg(long, value_name = "FILE")]
    pub token_cache: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Gộp CLI flags lên trên config file
    pub fn apply_to(self, mut config: Config) -> SyncSettings {
        if self.local_path.is_some() {
            config.sync.local_path = self.local_path;
        }
        if self.drive_folder.is_some() {
            config.sync.drive_folder = self.drive_folder;
        }
        if self.contain_query.is_some() {
            config.sync.contain_query = self.contain_query;
        }
        if self.client_secret.is_some() {
            config.auth.client_secret_path = self.client_secret;
        }
        if self.token_cache.is_some() {
            config.auth.token_cache_path = self.token_cache;
        }
        config.into_settings()
    }
}
