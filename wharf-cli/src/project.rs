//! Project file
//!
//! ```json
//! {
//!   "targets": [
//!     { "name": "web", "source": "public", "outputPath": "/dist", "publicPath": "/app/" }
//!   ],
//!   "middleware": { "publicPath": "/app/", "logLevel": "debug" }
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use wharf_config::{MiddlewareConfig, WatchOptions};
use wharf_core::TargetConfig;

/// Project file contents
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// Directories to build, one per target
    pub targets: Vec<ProjectTarget>,
    /// Middleware options
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// One target of the project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTarget {
    pub name: String,
    /// Source directory, relative to the project file
    pub source: PathBuf,
    /// Where the target's output lands inside the in-memory file system
    #[serde(default = "default_output_path")]
    pub output_path: String,
    pub public_path: Option<String>,
    pub watch_options: Option<WatchOptions>,
}

fn default_output_path() -> String {
    String::from("/dist")
}

impl ProjectTarget {
    pub fn to_target_config(&self) -> TargetConfig {
        TargetConfig {
            name: self.name.clone(),
            output_path: self.output_path.clone(),
            public_path: self.public_path.clone(),
            watch_options: self.watch_options.clone(),
        }
    }
}

/// Read and validate a project file
pub fn read_project_file(path: &Path) -> Result<ProjectFile, String> {
    if !path.exists() {
        return Err(format!(
            "'{}' not found\n\nhint: create it with a 'targets' list",
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let project: ProjectFile = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;

    if project.targets.is_empty() {
        return Err(format!("'{}' declares no targets", path.display()));
    }
    if let Some(target) = project.targets.iter().find(|t| t.name.is_empty()) {
        return Err(format!(
            "'{}': target with source '{}' has an empty name",
            path.display(),
            target.source.display()
        ));
    }

    Ok(project)
}

/// Resolve a target's source directory relative to the project file
pub fn resolve_source_dir(project_path: &Path, source: &Path) -> PathBuf {
    let base_dir = project_path.parent().unwrap_or(Path::new("."));
    base_dir.join(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wharf.json");
        std::fs::write(
            &path,
            r#"{
                "targets": [{ "name": "web", "source": "public", "publicPath": "/app/" }],
                "middleware": { "publicPath": "/app/" }
            }"#,
        )
        .unwrap();

        let project = read_project_file(&path).unwrap();
        assert_eq!(project.targets.len(), 1);
        assert_eq!(project.targets[0].output_path, "/dist");
        assert_eq!(project.middleware.public_path, "/app/");
        assert_eq!(project.middleware.index.as_deref(), Some("index.html"));

        let target = project.targets[0].to_target_config();
        assert_eq!(target.public_path.as_deref(), Some("/app/"));
        assert_eq!(
            resolve_source_dir(&path, &project.targets[0].source),
            dir.path().join("public")
        );
    }

    #[test]
    fn test_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(read_project_file(&missing).unwrap_err().contains("not found"));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{ "targets": [] }"#).unwrap();
        assert!(read_project_file(&empty).unwrap_err().contains("no targets"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        assert!(read_project_file(&broken).unwrap_err().contains("cannot parse"));
    }
}
