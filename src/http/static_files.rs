//! Static file resolution.
//!
//! # Responsibilities
//! - Map a request path to a file under the root directory
//! - Resolve the content type from the MIME table
//! - Inject the live-reload client into HTML
//! - Render the 404 and 500 pages
//!
//! # Design Decisions
//! - A missing file is an expected outcome: 404 page, debug log only
//! - Any other failure becomes a 500 page naming the URL and the error
//! - Subfolder removal is a literal first-occurrence substring removal,
//!   applied to both the root directory and the URL path
//! - Unknown extensions are served as `text/html` with a warning
//! - Paths containing `..` segments are answered with the 404 page

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::http::inject::HtmlInjector;
use crate::mime::MimeTable;

const HTML: &str = "text/html";
const NOT_FOUND_PAGE: &str =
    "<!DOCTYPE html><html><head><title>Not Found</title></head><body><h1>Page not found</h1></body></html>";

/// Failures while resolving a file.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("no file at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file read from disk, ready to be sent.
#[derive(Debug)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content_type: String,
    pub body: Vec<u8>,
    pub injected: bool,
}

/// Resolves request paths against the site root.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    root: String,
    subfolder: Option<String>,
    mime: Arc<MimeTable>,
    injector: Option<HtmlInjector>,
}

impl StaticResolver {
    pub fn new(root: impl Into<String>, subfolder: Option<String>, mime: Arc<MimeTable>) -> Self {
        Self {
            root: root.into(),
            subfolder: subfolder.filter(|s| !s.is_empty()),
            mime,
            injector: None,
        }
    }

    /// Inject the live-reload client into HTML responses.
    pub fn with_injector(mut self, injector: HtmlInjector) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Directory files are read from, after subfolder removal.
    pub fn root_dir(&self) -> PathBuf {
        match &self.subfolder {
            Some(sub) => PathBuf::from(self.root.replacen(sub.as_str(), "", 1)),
            None => PathBuf::from(&self.root),
        }
    }

    /// Filesystem path and URL path (used for the extension) for `url_path`.
    pub fn candidate(&self, url_path: &str) -> (PathBuf, String) {
        let mut path = url_path.to_string();
        if path.ends_with('/') {
            path.push_str("index.html");
        }
        if let Some(sub) = &self.subfolder {
            path = path.replacen(sub.as_str(), "", 1);
        }

        let file = self.root_dir().join(path.trim_start_matches('/'));
        (file, path)
    }

    /// Content type for a URL path: text after its last `.`.
    pub fn content_type(&self, url_path: &str) -> String {
        let extension = url_path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match self.mime.lookup(extension) {
            Some(mime) => mime.mime_type.clone(),
            None => {
                tracing::warn!(
                    path = %url_path,
                    extension = %extension,
                    "Unknown file extension, serving as text/html"
                );
                HTML.to_string()
            }
        }
    }

    /// Locate and read the file for `url_path`.
    pub async fn resolve(&self, url_path: &str) -> Result<StaticFile, ServeError> {
        let (path, url_path) = self.candidate(url_path);
        if escapes_root(&url_path) {
            return Err(ServeError::NotFound { path });
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ServeError::NotFound { path }),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ServeError::NotFound { path }),
            Err(source) => return Err(ServeError::Io { path, source }),
        }

        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(source) => return Err(ServeError::Io { path, source }),
        };

        let content_type = self.content_type(&url_path);
        let mut file = StaticFile {
            path,
            content_type,
            body,
            injected: false,
        };

        if file.content_type == HTML {
            if let Some(injector) = &self.injector {
                match injector.inject(&file.body) {
                    Ok(body) => {
                        file.body = body;
                        file.injected = true;
                    }
                    Err(e) => {
                        tracing::debug!(path = %file.path.display(), error = %e, "Skipping live-reload injection");
                    }
                }
            }
        }

        Ok(file)
    }

    /// Resolve `url_path` and render the response. `requested` is the
    /// original URL, shown on the 500 page.
    pub async fn serve(&self, url_path: &str, requested: &str) -> Response<Body> {
        match self.resolve(url_path).await {
            Ok(file) => {
                tracing::debug!(
                    path = %file.path.display(),
                    content_type = %file.content_type,
                    injected = file.injected,
                    "Serving file"
                );
                let content_type = HeaderValue::from_str(&file.content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static(HTML));
                let mut response = Response::new(Body::from(file.body));
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
                response
            }
            Err(ServeError::NotFound { path }) => {
                tracing::debug!(url = %requested, path = %path.display(), "File not found");
                not_found()
            }
            Err(e) => {
                tracing::error!(url = %requested, error = %e, "Failed to serve file");
                internal_error(requested, &e)
            }
        }
    }
}

fn escapes_root(url_path: &str) -> bool {
    Path::new(url_path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// The fixed 404 page.
pub fn not_found() -> Response<Body> {
    html_response(StatusCode::NOT_FOUND, NOT_FOUND_PAGE.to_string())
}

/// 500 page naming the requested URL and the error.
pub fn internal_error(requested: &str, error: &dyn std::fmt::Display) -> Response<Body> {
    let page = format!(
        "<!DOCTYPE html><html><head><title>Internal Server Error</title></head><body>\
         <h1>500 Internal Server Error</h1><p>Error serving {}</p><pre>{}</pre></body></html>",
        escape_html(requested),
        escape_html(&error.to_string()),
    );
    html_response(StatusCode::INTERNAL_SERVER_ERROR, page)
}

fn html_response(status: StatusCode, page: String) -> Response<Body> {
    let mut response = Response::new(Body::from(page));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML));
    response
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::{MimeTable, MimeType};
    use std::fs;
    use tempfile::TempDir;

    fn mime() -> Arc<MimeTable> {
        Arc::new(MimeTable::new(vec![
            MimeType::new("text/html", "HTML", &["html"]),
            MimeType::new("text/css", "CSS", &["css"]),
        ]))
    }

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html><body>home</body></html>").unwrap();
        fs::write(dir.path().join("style.css"), "body{}").unwrap();
        fs::write(dir.path().join("notes.xyz"), "plain").unwrap();
        fs::write(dir.path().join("fragment.html"), "<p>no body</p>").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "<body>docs</body>").unwrap();
        dir
    }

    fn resolver(dir: &TempDir) -> StaticResolver {
        StaticResolver::new(dir.path().to_string_lossy(), None, mime())
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = site();
        let response = resolver(&dir).serve("/", "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(body_string(response).await, "<html><body>home</body></html>");
    }

    #[tokio::test]
    async fn test_nested_directory_index() {
        let dir = site();
        let file = resolver(&dir).resolve("/docs/").await.unwrap();
        assert_eq!(file.body, b"<body>docs</body>");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_html() {
        let dir = site();
        let response = resolver(&dir).serve("/nope.html", "/nope.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert!(body_string(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_directory_without_slash_is_404() {
        let dir = site();
        let err = resolver(&dir).resolve("/docs").await.unwrap_err();
        assert!(matches!(err, ServeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_content_type_from_table() {
        let dir = site();
        let file = resolver(&dir).resolve("/style.css").await.unwrap();
        assert_eq!(file.content_type, "text/css");
    }

    #[tokio::test]
    async fn test_unknown_extension_defaults_to_html() {
        let dir = site();
        let file = resolver(&dir).resolve("/notes.xyz").await.unwrap();
        assert_eq!(file.content_type, "text/html");
        assert_eq!(file.body, b"plain");
    }

    #[tokio::test]
    async fn test_html_is_injected_when_enabled() {
        let dir = site();
        let resolver = resolver(&dir).with_injector(HtmlInjector::new("/c.js", "/ws"));

        let file = resolver.resolve("/index.html").await.unwrap();
        assert!(file.injected);
        let text = String::from_utf8(file.body).unwrap();
        assert!(text.contains("<script data-devserve-reload src=\"/c.js\"></script>"));
        assert!(text.contains("home"));

        let css = resolver.resolve("/style.css").await.unwrap();
        assert!(!css.injected);
        assert_eq!(css.body, b"body{}");
    }

    #[tokio::test]
    async fn test_failed_injection_serves_original_bytes() {
        let dir = site();
        let resolver = resolver(&dir).with_injector(HtmlInjector::new("/c.js", "/ws"));

        let file = resolver.resolve("/fragment.html").await.unwrap();
        assert!(!file.injected);
        assert_eq!(file.body, b"<p>no body</p>");
    }

    #[tokio::test]
    async fn test_subfolder_is_stripped_from_root_and_url() {
        let dir = site();
        let root = dir.path().join("blog");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("post.html"), "<body>post</body>").unwrap();

        // Root ".../blog" loses "/blog"; URL "/blog/blog/post.html" loses its first "/blog".
        let resolver = StaticResolver::new(
            root.to_string_lossy(),
            Some("/blog".to_string()),
            mime(),
        );
        let (candidate, url) = resolver.candidate("/blog/blog/post.html");
        assert_eq!(url, "/blog/post.html");
        assert_eq!(candidate, dir.path().join("blog/post.html"));

        let file = resolver.resolve("/blog/blog/post.html").await.unwrap();
        assert_eq!(file.body, b"<body>post</body>");
    }

    #[tokio::test]
    async fn test_parent_segments_cannot_leave_root() {
        let dir = site();
        let root = dir.path().join("public");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("page.html"), "inside").unwrap();
        fs::write(dir.path().join("secret.html"), "outside").unwrap();
        let resolver = StaticResolver::new(root.to_string_lossy(), None, mime());

        let err = resolver.resolve("/../secret.html").await.unwrap_err();
        assert!(matches!(err, ServeError::NotFound { .. }));

        let response = resolver.serve("/docs/../../secret.html", "/docs/../../secret.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!body_string(response).await.contains("outside"));

        let file = resolver.resolve("/page.html").await.unwrap();
        assert_eq!(file.body, b"inside");
    }

    #[tokio::test]
    async fn test_io_failure_is_500_with_url_and_error() {
        let dir = site();
        // Paths with an interior NUL byte are rejected by the OS layer.
        let response = resolver(&dir).serve("/bad\0name.html", "/bad%00name.html?x=<y>").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");

        let body = body_string(response).await;
        assert!(body.contains("/bad%00name.html?x=&lt;y&gt;"));
        assert!(body.contains("failed to read"));
    }
}
