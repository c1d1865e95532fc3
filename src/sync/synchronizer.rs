//! Synchronizer - so sánh folder local với Drive và upload file còn thiếu.
//!
//! Một lần chạy: list remote → list local → tính hiệu tập hợp theo tên file
//! → upload lần lượt từng file. Không retry, lỗi đầu tiên dừng cả lần chạy.

use super::provider::{DriveApi, DriveQuery, FileUpload};
use crate::config::SyncSettings;
use crate::error::{Result, SyncError};
use crate::utils::mime_type_for;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File đã upload thành công
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: PathBuf,
    /// ID do Drive cấp
    pub file_id: String,
}

/// Kết quả một lần reconcile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Số tên file (không trùng) đã có trên Drive
    pub remote_count: usize,
    /// Số file local khớp bộ lọc
    pub local_count: usize,
    pub uploaded: Vec<UploadedFile>,
}

impl SyncReport {
    pub fn uploaded_any(&self) -> bool {
        !self.uploaded.is_empty()
    }
}

/// Nhận thông báo tiến trình từ `Synchronizer::reconcile_with`.
/// Mặc định không làm gì; CLI dùng để in tiến trình ra terminal.
pub trait SyncObserver {
    fn remote_listed(&mut self, _names: &HashSet<String>, _filter: &str) {}

    fn local_listed(&mut self, _files: &[PathBuf], _dir: &Path, _filter: &str) {}

    /// Gọi trước khi upload từng file
    fn uploading(&mut self, _path: &Path) {}

    fn uploaded(&mut self, _file: &UploadedFile, _folder: Option<&str>) {}
}

impl SyncObserver for () {}

/// Tên file (basename) dùng để so sánh với Drive
fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Các file local chưa có trên remote, giữ nguyên thứ tự local
pub fn plan_uploads(local: &[PathBuf], remote: &HashSet<String>) -> Vec<PathBuf> {
    local
        .iter()
        .filter(|path| !remote.contains(&file_name_of(path)))
        .cloned()
        .collect()
}

/// Kiểm tra thư mục local tồn tại
pub fn ensure_local_path(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(SyncError::PathNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Liệt kê file thường ngay trong `path` có tên chứa `filter`.
/// Thứ tự theo thứ tự đọc thư mục của OS.
pub fn list_local(path: &Path, filter: &str) -> Result<Vec<PathBuf>> {
    ensure_local_path(path)?;

    let scan_error = |source| SyncError::LocalScan {
        path: path.to_path_buf(),
        source,
    };
    let base = std::path::absolute(path).map_err(scan_error)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(&base).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        let file_path = entry.path();
        // is_file() đi theo symlink, symlink tới file cũng được tính
        if !file_path.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(filter) {
            files.push(file_path);
        }
    }

    info!(
        "Found {} local files in {} containing '{}'",
        files.len(),
        base.display(),
        filter
    );
    Ok(files)
}

/// Sở hữu session đã xác thực với remote
pub struct Synchronizer<D: DriveApi> {
    api: D,
    /// Folder ID đã resolve trong lần chạy này
    folder_ids: HashMap<String, String>,
}

impl<D: DriveApi> Synchronizer<D> {
    pub fn new(api: D) -> Self {
        Self {
            api,
            folder_ids: HashMap::new(),
        }
    }

    pub fn api(&self) -> &D {
        &self.api
    }

    /// Tìm folder theo tên (match đầu tiên), tạo mới nếu không có
    pub fn resolve_folder(&mut self, name: &str) -> Result<String> {
        if let Some(id) = self.folder_ids.get(name) {
            return Ok(id.clone());
        }

        let folder_error = |source| SyncError::Folder {
            name: name.to_string(),
            source,
        };

        let mut matches = Vec::new();
        for page in self.api.pages(DriveQuery::FolderNamed(name.to_string())) {
            let page = page.map_err(folder_error)?;
            matches.extend(page.files.into_iter().filter(|f| f.name == name));
        }

        let id = match matches.into_iter().next() {
            Some(folder) => {
                debug!("Found folder '{}' ({})", name, folder.id);
                folder.id
            }
            None => {
                info!("Creating folder '{}' in Google Drive", name);
                self.api.create_folder(name).map_err(folder_error)?.id
            }
        };

        self.folder_ids.insert(name.to_string(), id.clone());
        Ok(id)
    }

    /// Tên các file chưa bị xoá trên Drive có chứa `filter`, gộp từ mọi trang
    pub fn list_remote(&self, filter: &str) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        for page in self.api.pages(DriveQuery::NameContains(filter.to_string())) {
            let page = page.map_err(SyncError::RemoteList)?;
            debug!("Remote page with {} entries", page.files.len());
            names.extend(
                page.files
                    .into_iter()
                    // Drive "contains" khớp theo tiền tố từ, lọc lại cho đúng
                    .filter(|file| !file.trashed && file.name.contains(filter))
                    .map(|file| file.name),
            );
        }

        info!(
            "Found {} files in cloud storage containing '{}'",
            names.len(),
            filter
        );
        Ok(names)
    }

    /// Upload một file vào folder (hoặc root nếu `folder_name` là `None`)
    pub fn upload(&mut self, path: &Path, folder_name: Option<&str>) -> Result<String> {
        let parent_id = match folder_name {
            Some(name) => Some(self.resolve_folder(name)?),
            None => None,
        };

        let name = file_name_of(path);
        let upload = FileUpload {
            name: &name,
            parent_id: parent_id.as_deref(),
            mime_type: mime_type_for(path),
            source: path,
        };

        let file = self
            .api
            .upload_file(&upload)
            .map_err(|source| SyncError::Upload {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Uploaded {} as {}", name, file.id);
        Ok(file.id)
    }

    /// Một lần sync đầy đủ. Kiểm tra thư mục local trước mọi network call.
    pub fn reconcile_with<O: SyncObserver>(
        &mut self,
        settings: &SyncSettings,
        observer: &mut O,
    ) -> Result<SyncReport> {
        ensure_local_path(&settings.local_path)?;
        let filter = settings.contain_query.as_str();
        let folder = settings.drive_folder.as_deref();

        let remote = self.list_remote(filter)?;
        observer.remote_listed(&remote, filter);

        let local = list_local(&settings.local_path, filter)?;
        observer.local_listed(&local, &settings.local_path, filter);

        let mut report = SyncReport {
            remote_count: remote.len(),
            local_count: local.len(),
            uploaded: Vec::new(),
        };

        for path in plan_uploads(&local, &remote) {
            observer.uploading(&path);
            let file_id = self.upload(&path, folder)?;
            let uploaded = UploadedFile { path, file_id };
            observer.uploaded(&uploaded, folder);
            report.uploaded.push(uploaded);
        }

        Ok(report)
    }

    pub fn reconcile(&mut self, settings: &SyncSettings) -> Result<SyncReport> {
        self.reconcile_with(settings, &mut ())
    }
}
