//! Bảng tra MIME type theo phần mở rộng của file.

use std::path::Path;

/// MIME type cho file không nhận diện được
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

const MIME_TYPES: &[(&str, &str)] = &[
    ("sql", "application/sql"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
];

/// MIME type dựa trên phần mở rộng cuối cùng (không phân biệt hoa thường)
pub fn mime_type_for(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_MIME_TYPE;
    };

    MIME_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(mime_type_for(Path::new("/backups/db.sql")), "application/sql");
        assert_eq!(mime_type_for(Path::new("DUMP.SQL")), "application/sql");
        assert_eq!(mime_type_for(Path::new("db.sql.gz")), "application/gzip");
    }

    #[test]
    fn test_fallback() {
        // Chỉ xét phần mở rộng cuối: report.sql.bak không phải sql
        assert_eq!(mime_type_for(Path::new("report.sql.bak")), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for(Path::new("Makefile")), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for(Path::new(".sql")), DEFAULT_MIME_TYPE);
    }
}
