//! Static file resolution under a public root directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::http::mime::mime_type_for;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::security::is_safe_path;

const INDEX_DOCUMENT: &str = "index.html";
const CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Serves a GET or HEAD request from the root directory.
    ///
    /// Unsafe paths and unreadable files answer 403, missing files 404.
    pub async fn serve(&self, request: &Request) -> Response {
        if !matches!(request.method, Method::GET | Method::HEAD) {
            return Response::method_not_allowed("GET, HEAD");
        }

        let path = match request.path.as_str() {
            "" | "/" => "/index.html",
            other => other,
        };

        if !is_safe_path(path) {
            tracing::warn!(path = %path, "Rejected unsafe static path");
            return Response::forbidden("Access Denied");
        }

        let mut file_path = self.root.join(path.trim_start_matches('/'));
        let mut mime_source = path.to_string();

        if tokio::fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir()) {
            file_path.push(INDEX_DOCUMENT);
            mime_source = INDEX_DOCUMENT.to_string();
        }

        match tokio::fs::metadata(&file_path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Response::not_found(format!("404 Not Found: {}", path)),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Response::forbidden("Access Denied");
            }
            Err(_) => return Response::not_found(format!("404 Not Found: {}", path)),
        }

        match tokio::fs::read(&file_path).await {
            Ok(contents) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", mime_type_for(&mime_source))
                .header("Cache-Control", CACHE_CONTROL)
                .binary(contents)
                .build(),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Response::forbidden("Access Denied"),
            Err(e) => {
                tracing::error!(file = %file_path.display(), error = %e, "Failed to read static file");
                Response::internal_error("Error reading file")
            }
        }
    }

    /// Reads a named document from the root as an HTML response.
    pub async fn html_document(&self, name: &str) -> Response {
        match tokio::fs::read_to_string(self.root.join(name)).await {
            Ok(content) => Response::html(content),
            Err(e) => {
                tracing::error!(file = %name, error = %e, "Failed to read document");
                Response::not_found(format!("File not found: {}", name))
            }
        }
    }
}
