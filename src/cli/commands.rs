//! Command implementation cho drive-upload CLI.
//!
//! `run` là entry point: nhận settings đã resolve, chạy một lần sync
//! và trả về exit status. Không có state global.

use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::sync::synchronizer::ensure_local_path;
use crate::sync::{
    authorize, GoogleDriveClient, InstalledAppFlow, SyncObserver, SyncReport, Synchronizer,
    UploadedFile,
};
use chrono::Local;
use colored::Colorize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

/// In tiến trình sync ra terminal
struct ConsoleObserver;

impl SyncObserver for ConsoleObserver {
    fn remote_listed(&mut self, names: &HashSet<String>, filter: &str) {
        println!(
            "  {} Found {} files in cloud storage containing the query: {}",
            "✓".green(),
            names.len().to_string().cyan(),
            filter
        );
        println!("{}", "Searching for files in local folder...".cyan());
    }

    fn local_listed(&mut self, files: &[PathBuf], dir: &Path, filter: &str) {
        println!(
            "  {} Found {} files in {} containing the query {}",
            "✓".green(),
            files.len().to_string().cyan(),
            dir.display(),
            filter
        );
    }

    fn uploading(&mut self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "  {} Local file {} is not in list of remote files",
            "→".cyan(),
            name.white().bold()
        );
    }

    fn uploaded(&mut self, file: &UploadedFile, folder: Option<&str>) {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "  {} File {} has been uploaded into the cloud folder {}",
            "✓".green(),
            name,
            folder.unwrap_or("(root)")
        );
    }
}

/// Xác thực rồi chạy một lần reconcile với Google Drive
pub fn sync(settings: &SyncSettings) -> Result<SyncReport, SyncError> {
    // Thư mục local phải tồn tại trước khi gọi bất kỳ network call nào
    ensure_local_path(&settings.local_path)?;

    println!("{}", "Authorizing with Google Drive...".cyan());
    let flow = InstalledAppFlow::new(&settings.client_secret_path);
    let credential = authorize(&settings.token_cache_path, &flow)?;
    println!("  {} Authorized", "✓".green());

    let mut synchronizer = Synchronizer::new(GoogleDriveClient::new(credential));

    println!("{}", "Searching for files in cloud storage...".cyan());
    synchronizer.reconcile_with(settings, &mut ConsoleObserver)
}

/// Dòng tổng kết cuối lần chạy
pub fn summary_line(report: &SyncReport) -> String {
    if report.uploaded_any() {
        format!(
            "Uploaded {} of {} local files",
            report.uploaded.len(),
            report.local_count
        )
    } else {
        "No file has been uploaded, because no file was found in the local directory \
         that was not already in the cloud storage"
            .to_string()
    }
}

/// Entry point của tool: chạy sync và trả về exit status
pub fn run(settings: &SyncSettings) -> ExitCode {
    println!();
    println!("Upload at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    match sync(settings) {
        Ok(report) => {
            let line = summary_line(&report);
            if report.uploaded_any() {
                println!("\n{}", line.green().bold());
            } else {
                println!("\n{}", line.yellow());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            eprintln!("{} {}", "✗".red(), e.to_string().red());
            ExitCode::FAILURE
        }
    }
}
