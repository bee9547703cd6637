//! Request/response types and artifact serving

use crate::mime::content_type;
use crate::range::ByteRange;
use tracing::{debug, error};
use wharf_config::MiddlewareConfig;
use wharf_core::ArtifactPath;
use wharf_vfs::{VfsError, VirtualFileSystem};

/// An incoming request, reduced to what serving needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header named `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}

/// A response produced for an accepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn not_found() -> Self {
        text_response(404, "Not Found")
    }

    /// Answer for requests still waiting when the coordinator shuts down
    pub fn unavailable() -> Self {
        text_response(503, "Service Unavailable")
    }

    fn internal_error() -> Self {
        text_response(500, "Internal Server Error")
    }
}

/// Outcome of offering a request to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Not ours; the next handler in line should take it
    PassThrough,
    /// Accepted; the response arrives through the callback
    Accepted,
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn text_response(status: u16, text: &str) -> Response {
    Response::new(status)
        .with_header("Content-Type", "text/plain; charset=utf-8")
        .with_header("Content-Length", text.len().to_string())
        .with_body(text.as_bytes().to_vec())
}

/// Build the response for `path` as it currently exists in `fs`
pub(crate) fn serve_artifact(
    fs: &dyn VirtualFileSystem,
    config: &MiddlewareConfig,
    request: &Request,
    path: &ArtifactPath,
) -> Response {
    let Some(path) = locate_file(fs, config, path) else {
        debug!(target: "wharf::serve", url = %request.url, path = %path, "artifact missing");
        return Response::not_found();
    };

    let content = match fs.read_file(path.as_path()) {
        Ok(content) => content,
        Err(err) if err.is_not_found() => return Response::not_found(),
        Err(err) => return read_failure(&path, &err),
    };

    let len = content.len() as u64;
    let range = ByteRange::parse(request.header("Range"), len);
    let mut response = match range {
        ByteRange::Full => Response::new(200)
            .with_header("Content-Length", len.to_string())
            .with_body(content),
        ByteRange::Partial { start, end } => {
            let body = content[start as usize..=end as usize].to_vec();
            Response::new(206)
                .with_header("Content-Length", body.len().to_string())
                .with_body(body)
        }
        ByteRange::Unsatisfiable => Response::new(416).with_header("Content-Length", "0"),
    };

    if let Some(value) = range.content_range(len) {
        response = response.with_header("Content-Range", value);
    }
    if range != ByteRange::Unsatisfiable {
        response = response
            .with_header("Content-Type", content_type(&path, &config.mime_types))
            .with_header("Accept-Ranges", "bytes");
    }
    for (name, value) in &config.headers {
        response = response.with_header(name.clone(), value.clone());
    }
    if request.is_head() {
        response.body.clear();
    }

    debug!(
        target: "wharf::serve",
        url = %request.url,
        path = %path,
        status = response.status,
        "served"
    );
    response
}

/// The file to serve for `path`: itself, or its index when it is a directory
fn locate_file(
    fs: &dyn VirtualFileSystem,
    config: &MiddlewareConfig,
    path: &ArtifactPath,
) -> Option<ArtifactPath> {
    let meta = fs.stat(path.as_path()).ok()?;
    if meta.is_file() {
        return Some(path.clone());
    }
    if !meta.is_dir() {
        return None;
    }

    let index = path.join(config.index.as_deref()?)?;
    fs.is_file(index.as_path()).then_some(index)
}

fn read_failure(path: &ArtifactPath, err: &VfsError) -> Response {
    error!(target: "wharf::serve", path = %path, error = %err, "failed to read artifact");
    Response::internal_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wharf_vfs::MemoryFileSystem;

    fn fs() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("/dist/main.js", b"console.log(1);".to_vec()),
            ("/dist/docs/index.html", b"<h1>docs</h1>".to_vec()),
            ("/dist/empty/.keep", Vec::new()),
        ])
        .unwrap()
    }

    fn serve(request: Request, path: &str) -> Response {
        serve_with(&MiddlewareConfig::default(), request, path)
    }

    fn serve_with(config: &MiddlewareConfig, request: Request, path: &str) -> Response {
        serve_artifact(&fs(), config, &request, &ArtifactPath::new(path).unwrap())
    }

    #[test]
    fn test_serves_file() {
        let response = serve(Request::get("/main.js"), "/dist/main.js");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"console.log(1);");
        assert_eq!(response.header("content-length"), Some("15"));
        assert!(response.header("Content-Type").unwrap().contains("javascript"));
        assert_eq!(response.header("Accept-Ranges"), Some("bytes"));
    }

    #[test]
    fn test_missing_artifact_is_404() {
        let response = serve(Request::get("/gone.js"), "/dist/gone.js");
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_directory_serves_index() {
        let response = serve(Request::get("/docs"), "/dist/docs");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"<h1>docs</h1>");
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));

        let response = serve(Request::get("/empty"), "/dist/empty");
        assert_eq!(response.status, 404);

        let config = MiddlewareConfig {
            index: None,
            ..MiddlewareConfig::default()
        };
        assert_eq!(serve_with(&config, Request::get("/docs"), "/dist/docs").status, 404);
    }

    #[test]
    fn test_head_keeps_length_without_body() {
        let response = serve(Request::new("HEAD", "/main.js"), "/dist/main.js");
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.header("Content-Length"), Some("15"));
    }

    #[test]
    fn test_range_requests() {
        let request = Request::get("/main.js").with_header("Range", "bytes=0-6");
        let response = serve(request, "/dist/main.js");
        assert_eq!(response.status, 206);
        assert_eq!(response.body, b"console");
        assert_eq!(response.header("Content-Range"), Some("bytes 0-6/15"));
        assert_eq!(response.header("Content-Length"), Some("7"));

        let request = Request::get("/main.js").with_header("range", "bytes=50-60");
        let response = serve(request, "/dist/main.js");
        assert_eq!(response.status, 416);
        assert_eq!(response.header("Content-Range"), Some("bytes */15"));
        assert!(response.body.is_empty());

        let request = Request::get("/main.js").with_header("Range", "bytes=0-1,3-4");
        assert_eq!(serve(request, "/dist/main.js").status, 200);
    }

    #[test]
    fn test_configured_headers_and_mime_types() {
        let mut config = MiddlewareConfig::default();
        config
            .headers
            .insert("X-Served-By".to_string(), "wharf".to_string());
        config
            .mime_types
            .insert("js".to_string(), "application/x-test".to_string());

        let response = serve_with(&config, Request::get("/main.js"), "/dist/main.js");
        assert_eq!(response.header("x-served-by"), Some("wharf"));
        assert_eq!(response.header("Content-Type"), Some("application/x-test"));
    }

    #[test]
    fn test_read_failure_is_500() {
        struct Unreadable;
        impl VirtualFileSystem for Unreadable {
            fn read_file(&self, _: &Path) -> wharf_vfs::VfsResult<Vec<u8>> {
                Err(VfsError::PermissionDenied {
                    path: "/dist/main.js".into(),
                })
            }
            fn write_file(&self, _: &Path, _: &[u8]) -> wharf_vfs::VfsResult<()> {
                Ok(())
            }
            fn stat(&self, _: &Path) -> wharf_vfs::VfsResult<wharf_vfs::Metadata> {
                Ok(wharf_vfs::Metadata {
                    kind: wharf_vfs::FileKind::File,
                    size: 1,
                    modified: std::time::SystemTime::UNIX_EPOCH,
                })
            }
            fn create_dir_all(&self, _: &Path) -> wharf_vfs::VfsResult<()> {
                Ok(())
            }
            fn remove_file(&self, _: &Path) -> wharf_vfs::VfsResult<()> {
                Ok(())
            }
            fn read_dir(&self, _: &Path) -> wharf_vfs::VfsResult<Vec<String>> {
                Ok(Vec::new())
            }
        }

        let response = serve_artifact(
            &Unreadable,
            &MiddlewareConfig::default(),
            &Request::get("/main.js"),
            &ArtifactPath::new("/dist/main.js").unwrap(),
        );
        assert_eq!(response.status, 500);
    }
}
