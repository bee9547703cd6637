//! Path normalization shared by every backend

use crate::error::{VfsError, VfsResult};
use std::path::Path;

/// Normalize a path into the `/a/b/c` form used as storage key.
///
/// Backslashes become separators, empty and `.` segments are dropped and `..`
/// pops a segment. A path that climbs above the root is rejected.
///
/// ```
/// use wharf_vfs::normalize_path;
/// use std::path::Path;
///
/// assert_eq!(normalize_path(Path::new("dist//js/./app.js")).unwrap(), "/dist/js/app.js");
/// assert_eq!(normalize_path(Path::new("/dist/js/../")).unwrap(), "/dist");
/// ```
pub fn normalize_path(path: &Path) -> VfsResult<String> {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(VfsError::InvalidPath {
                        path: raw.clone(),
                        reason: String::from("escapes root"),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Strict ancestors of a normalized path, root first.
///
/// `/a/b/c` yields `/`, `/a`, `/a/b`.
pub(crate) fn ancestors(normalized: &str) -> Vec<&str> {
    if normalized == "/" {
        return Vec::new();
    }
    let mut result = vec!["/"];
    for (idx, ch) in normalized.char_indices().skip(1) {
        if ch == '/' {
            result.push(&normalized[..idx]);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_path(Path::new("")).unwrap(), "/");
        assert_eq!(normalize_path(Path::new("/")).unwrap(), "/");
        assert_eq!(normalize_path(Path::new("./")).unwrap(), "/");
    }

    #[test]
    fn test_normalize_windows_separators() {
        assert_eq!(
            normalize_path(Path::new("dist\\css\\site.css")).unwrap(),
            "/dist/css/site.css"
        );
    }

    #[test]
    fn test_normalize_rejects_escape() {
        let err = normalize_path(Path::new("/dist/../../etc/passwd")).unwrap_err();
        assert!(matches!(err, VfsError::InvalidPath { .. }));
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("/a/b/c"), vec!["/", "/a", "/a/b"]);
        assert_eq!(ancestors("/a"), vec!["/"]);
        assert!(ancestors("/").is_empty());
    }
}
