//! DriveApi trait - Abstraction cho remote storage.
//!
//! Synchronizer chỉ nói chuyện với remote qua trait này.
//! `GoogleDriveClient` là implementation thật; tests dùng fake in-memory.

use crate::error::ApiError;
use serde::Deserialize;
use std::path::Path;

/// MIME type của folder trên Google Drive
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata của một file/folder trên Drive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// File đã bị xoá vào thùng rác
    #[serde(default)]
    pub trashed: bool,
}

/// Một trang kết quả của files.list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// Các kiểu tìm kiếm mà Synchronizer cần
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveQuery {
    /// Folder (chưa bị xoá) có tên đúng bằng giá trị
    FolderNamed(String),
    /// File có tên chứa chuỗi
    NameContains(String),
}

/// Yêu cầu upload một file mới
#[derive(Debug, Clone, Copy)]
pub struct FileUpload<'a> {
    /// Tên file trên Drive
    pub name: &'a str,
    /// Folder cha; `None` = root
    pub parent_id: Option<&'a str>,
    pub mime_type: &'a str,
    /// File local chứa nội dung
    pub source: &'a Path,
}

pub trait DriveApi {
    /// Lấy một trang kết quả. `page_token = None` là trang đầu tiên.
    fn list_files(
        &self,
        query: &DriveQuery,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, ApiError>;

    fn create_folder(&self, name: &str) -> Result<DriveFile, ApiError>;

    /// Tạo file mới với nội dung đọc từ `upload.source`
    fn upload_file(&self, upload: &FileUpload<'_>) -> Result<DriveFile, ApiError>;

    /// Iterator lazy qua tất cả các trang, luôn bắt đầu từ trang đầu
    fn pages(&self, query: DriveQuery) -> Pages<'_, Self>
    where
        Self: Sized,
    {
        Pages::new(self, query)
    }
}

/// Iterator qua các trang của một truy vấn. Dừng sau trang không có
/// `nextPageToken`, hoặc ngay sau lỗi đầu tiên.
pub struct Pages<'a, D> {
    api: &'a D,
    query: DriveQuery,
    page_token: Option<String>,
    done: bool,
}

impl<'a, D: DriveApi> Pages<'a, D> {
    pub fn new(api: &'a D, query: DriveQuery) -> Self {
        Self {
            api,
            query,
            page_token: None,
            done: false,
        }
    }
}

impl<D: DriveApi> Iterator for Pages<'_, D> {
    type Item = Result<DriveFileList, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.api.list_files(&self.query, self.page_token.as_deref()) {
            Ok(page) => {
                self.page_token = page
                    .next_page_token
                    .clone()
                    .filter(|token| !token.is_empty());
                self.done = self.page_token.is_none();
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Trả về các trang cố định, ghi lại page token được yêu cầu
    struct PagedApi {
        pages: Vec<DriveFileList>,
        requested: RefCell<Vec<Option<String>>>,
        fail_at: Option<usize>,
    }

    impl DriveApi for PagedApi {
        fn list_files(
            &self,
            _query: &DriveQuery,
            page_token: Option<&str>,
        ) -> Result<DriveFileList, ApiError> {
            let index = self.requested.borrow().len();
            self.requested
                .borrow_mut()
                .push(page_token.map(str::to_string));
            if self.fail_at == Some(index) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "backend error".to_string(),
                });
            }
            Ok(self.pages[index].clone())
        }

        fn create_folder(&self, _name: &str) -> Result<DriveFile, ApiError> {
            unimplemented!()
        }

        fn upload_file(&self, _upload: &FileUpload<'_>) -> Result<DriveFile, ApiError> {
            unimplemented!()
        }
    }

    fn page(names: &[&str], next: Option<&str>) -> DriveFileList {
        DriveFileList {
            files: names
                .iter()
                .map(|name| DriveFile {
                    id: format!("id-{}", name),
                    name: name.to_string(),
                    mime_type: String::new(),
                    trashed: false,
                })
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    #[test]
    fn test_pages_follow_tokens() {
        let api = PagedApi {
            pages: vec![
                page(&["a.sql"], Some("t1")),
                page(&["b.sql"], Some("t2")),
                page(&["c.sql"], None),
            ],
            requested: RefCell::new(Vec::new()),
            fail_at: None,
        };

        let names: Vec<String> = api
            .pages(DriveQuery::NameContains(".sql".to_string()))
            .map(|page| page.unwrap())
            .flat_map(|page| page.files)
            .map(|file| file.name)
            .collect();

        assert_eq!(names, vec!["a.sql", "b.sql", "c.sql"]);
        assert_eq!(
            *api.requested.borrow(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[test]
    fn test_empty_token_ends_iteration() {
        let api = PagedApi {
            pages: vec![page(&["a.sql"], Some(""))],
            requested: RefCell::new(Vec::new()),
            fail_at: None,
        };

        assert_eq!(
            api.pages(DriveQuery::NameContains("a".to_string())).count(),
            1
        );
    }

    #[test]
    fn test_error_stops_iteration() {
        let api = PagedApi {
            pages: vec![page(&["a.sql"], Some("t1")), page(&["b.sql"], None)],
            requested: RefCell::new(Vec::new()),
            fail_at: Some(1),
        };

        let results: Vec<_> = api
            .pages(DriveQuery::NameContains(".sql".to_string()))
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ApiError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn test_deserialize_file_list() {
        let json = r#"{
            "nextPageToken": "abc",
            "files": [
                {"id": "1", "name": "dump.sql", "mimeType": "application/sql", "trashed": true},
                {"id": "2", "name": "other.sql"}
            ]
        }"#;

        let list: DriveFileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("abc"));
        assert!(list.files[0].trashed);
        assert!(!list.files[1].trashed);
        assert_eq!(list.files[0].mime_type, "application/sql");
    }
}
