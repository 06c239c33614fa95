use std::path::{Component, Path, PathBuf};

use tracing::error;

use crate::http::mime;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Serves files from beneath `root`.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a sub-path onto a file below the root. Anything other than plain
    /// file name components (`..`, `.`, a root or a drive prefix) is refused.
    pub fn resolve(&self, sub_path: &str) -> Option<PathBuf> {
        let relative = Path::new(sub_path.trim_start_matches('/'));
        let mut path = self.root.clone();
        let mut has_name = false;

        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    path.push(name);
                    has_name = true;
                }
                _ => return None,
            }
        }

        has_name.then_some(path)
    }

    pub async fn handle(&self, sub_path: &str) -> Response {
        let Some(path) = self.resolve(sub_path) else {
            return Response::not_found();
        };

        match self.read_contained(&path).await {
            Ok(Some(contents)) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", mime::from_path(&path))
                .body(contents)
                .build(),
            Ok(None) => Response::not_found(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read static file");
                Response::internal_error()
            }
        }
    }

    /// Reads `path` if it is a regular file whose real location is still
    /// inside the root (symlinks included). `Ok(None)` means not servable.
    async fn read_contained(&self, path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        let real = match tokio::fs::canonicalize(path).await {
            Ok(real) => real,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let real_root = tokio::fs::canonicalize(&self.root).await?;

        if !real.starts_with(&real_root) {
            return Ok(None);
        }
        if !tokio::fs::metadata(&real).await?.is_file() {
            return Ok(None);
        }

        match tokio::fs::read(&real).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
