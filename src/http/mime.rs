//! Content-Type detection for static files.

use std::path::Path;

/// Used when the extension is unknown or missing.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Picks a `Content-Type` from the file extension (case-insensitive).
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_MIME_TYPE;
    };

    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "xml" => "application/xml",
        _ => DEFAULT_MIME_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(from_path(Path::new("index.html")), "text/html");
        assert_eq!(from_path(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(from_path(Path::new("data.json")), "application/json");
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(from_path(Path::new("archive.tar.xz")), DEFAULT_MIME_TYPE);
        assert_eq!(from_path(Path::new("Makefile")), DEFAULT_MIME_TYPE);
    }
}
