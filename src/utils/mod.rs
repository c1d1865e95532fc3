//! Utility functions cho drive-upload.

pub mod browser;
pub mod mime;

pub use browser::open_browser;
pub use mime::mime_type_for;
