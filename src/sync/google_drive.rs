//! Google Drive client - implementation của `DriveApi` qua Drive API v3.
//!
//! Dùng reqwest blocking client, mỗi request gắn access token của
//! credential đã xác thực.

use super::credential::Credential;
use super::provider::{
    DriveApi, DriveFile, DriveFileList, DriveQuery, FileUpload, FOLDER_MIME_TYPE,
};
use crate::error::ApiError;
use reqwest::blocking::{Body, Client};
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::debug;

/// Google Drive API endpoints
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Các field cần cho listing
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, trashed)";

/// Upload file lớn có thể lâu hơn timeout mặc định của client
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Escape giá trị string trong query của Drive (`\` và `'`)
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

impl DriveQuery {
    /// Chuyển thành cú pháp `q` của files.list
    pub fn to_query_string(&self) -> String {
        match self {
            DriveQuery::FolderNamed(name) => format!(
                "name = '{}' and mimeType = '{}' and trashed = false",
                escape_query_value(name),
                FOLDER_MIME_TYPE
            ),
            DriveQuery::NameContains(fragment) => {
                format!("name contains '{}'", escape_query_value(fragment))
            }
        }
    }
}

/// Metadata gửi kèm khi tạo file/folder
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parents: Vec<&'a str>,
}

/// Session đã xác thực với Google Drive
pub struct GoogleDriveClient {
    credential: Credential,
    client: Client,
}

impl GoogleDriveClient {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            client: Client::new(),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn check(response: reqwest::blocking::Response) -> Result<DriveFile, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::from_response(response));
        }
        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl DriveApi for GoogleDriveClient {
    fn list_files(
        &self,
        query: &DriveQuery,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, ApiError> {
        let q = query.to_query_string();
        debug!("files.list q=\"{}\" page_token={:?}", q, page_token);

        let mut params = vec![("q", q.as_str()), ("spaces", "drive"), ("fields", LIST_FIELDS)];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .client
            .get(DRIVE_FILES_URL)
            .query(&params)
            .header("Authorization", self.credential.authorization_header())
            .send()?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response));
        }

        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn create_folder(&self, name: &str) -> Result<DriveFile, ApiError> {
        debug!("files.create folder \"{}\"", name);
        let metadata = FileMetadata {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: Vec::new(),
        };

        let response = self
            .client
            .post(DRIVE_FILES_URL)
            .query(&[("fields", "id, name, mimeType")])
            .header("Authorization", self.credential.authorization_header())
            .json(&metadata)
            .send()?;

        Self::check(response)
    }

    fn upload_file(&self, upload: &FileUpload<'_>) -> Result<DriveFile, ApiError> {
        let metadata = FileMetadata {
            name: upload.name,
            mime_type: None,
            parents: upload.parent_id.into_iter().collect(),
        };
        let metadata_json = serde_json::to_string(&metadata)?;

        let file = File::open(upload.source)?;
        let file_len = file.metadata()?.len();

        // multipart/related: phần metadata JSON rồi tới nội dung file,
        // nội dung được stream thẳng từ disk
        let boundary = format!("drive-upload-{}", uuid::Uuid::new_v4().simple());
        let head = format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{boundary}\r\nContent-Type: {mime}\r\n\r\n",
            boundary = boundary,
            metadata = metadata_json,
            mime = upload.mime_type,
        )
        .into_bytes();
        let tail = format!("\r\n--{}--\r\n", boundary).into_bytes();
        let total_len = head.len() as u64 + file_len + tail.len() as u64;

        let reader = Cursor::new(head).chain(file).chain(Cursor::new(tail));

        debug!(
            "files.create upload \"{}\" ({} bytes, {})",
            upload.name, file_len, upload.mime_type
        );
        let response = self
            .client
            .post(DRIVE_UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("fields", "id, name, mimeType")])
            .header("Authorization", self.credential.authorization_header())
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .timeout(UPLOAD_TIMEOUT)
            .body(Body::sized(reader, total_len))
            .send()?;

        Self::check(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("plain"), "plain");
        assert_eq!(escape_query_value("Finn's backups"), "Finn\\'s backups");
        assert_eq!(escape_query_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_folder_query() {
        let query = DriveQuery::FolderNamed("Backups".to_string());
        assert_eq!(
            query.to_query_string(),
            "name = 'Backups' and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_contains_query() {
        let query = DriveQuery::NameContains(".sql".to_string());
        assert_eq!(query.to_query_string(), "name contains '.sql'");
    }

    #[test]
    fn test_metadata_serialization() {
        let folder = FileMetadata {
            name: "Backups",
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: Vec::new(),
        };
        assert_eq!(
            serde_json::to_string(&folder).unwrap(),
            r#"{"name":"Backups","mimeType":"application/vnd.google-apps.folder"}"#
        );

        let file = FileMetadata {
            name: "b.sql",
            mime_type: None,
            parents: vec!["folder-1"],
        };
        assert_eq!(
            serde_json::to_string(&file).unwrap(),
            r#"{"name":"b.sql","parents":["folder-1"]}"#
        );
    }
}
