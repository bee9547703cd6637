//! Request URL to artifact path resolution

use crate::compiler::TargetConfig;
use crate::pattern::FilenamePattern;
use std::fmt;
use std::path::Path;
use tracing::trace;
use wharf_config::MiddlewareConfig;
use wharf_vfs::normalize_path;

/// Normalized absolute path of an artifact inside the output file system
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Normalize `path`; `None` if it climbs above the root
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        normalize_path(path.as_ref()).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// The path of `name` inside this directory
    pub fn join(&self, name: &str) -> Option<Self> {
        Self::new(format!("{}/{}", self.0, name))
    }

    /// Extension without the dot
    pub fn extension(&self) -> Option<&str> {
        self.as_path().extension().and_then(|ext| ext.to_str())
    }
}

impl AsRef<Path> for ArtifactPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A target as the resolver sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub name: String,
    pub output_path: ArtifactPath,
    pub public_path: Option<String>,
}

impl WatchTarget {
    /// `None` if the output path cannot be normalized
    pub fn from_config(config: &TargetConfig) -> Option<Self> {
        Some(Self {
            name: config.name.clone(),
            output_path: ArtifactPath::new(&config.output_path)?,
            public_path: config.public_path.as_deref().map(normalize_public_path),
        })
    }
}

/// Where a request URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Name of the target that owns the artifact
    pub target: String,
    pub path: ArtifactPath,
}

/// Maps request URLs onto artifact paths
#[derive(Debug, Clone)]
pub struct FilenameResolver {
    targets: Vec<WatchTarget>,
    public_path: String,
    index: Option<String>,
    filter: Option<FilenamePattern>,
}

impl FilenameResolver {
    pub fn new(targets: Vec<WatchTarget>, config: &MiddlewareConfig) -> Self {
        Self {
            targets,
            public_path: normalize_public_path(&config.public_path),
            index: config.index.clone().filter(|index| !index.is_empty()),
            filter: config.filename.as_deref().map(FilenamePattern::compile),
        }
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    /// Resolve `url`; `None` when this middleware does not serve it
    pub fn resolve(&self, url: &str) -> Option<Resolution> {
        let path = request_path(url);
        let (target, prefix) = self.select_target(path)?;
        let remainder = strip_public_path(path, prefix)?;
        let decoded = urlencoding::decode(remainder).ok()?;

        let mut relative = decoded.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str(self.index.as_deref()?);
        }

        if let Some(filter) = &self.filter {
            if !filter.is_match(&relative) {
                trace!(target: "wharf::serve", url, pattern = %filter, "filtered out");
                return None;
            }
        }

        // Normalizing the relative part alone rejects anything climbing out
        // of the target's output directory.
        let inside = normalize_path(Path::new(&relative)).ok()?;
        let path = target.output_path.join(&inside)?;

        trace!(target: "wharf::serve", url, target_name = %target.name, path = %path, "resolved");
        Some(Resolution {
            target: target.name.clone(),
            path,
        })
    }

    fn select_target(&self, path: &str) -> Option<(&WatchTarget, &str)> {
        if let [only] = self.targets.as_slice() {
            return Some((only, self.public_path.as_str()));
        }

        if let Some(target) = self.targets.iter().find(|target| {
            target
                .public_path
                .as_deref()
                .is_some_and(|prefix| strip_public_path(path, prefix).is_some())
        }) {
            return target.public_path.as_deref().map(|prefix| (target, prefix));
        }

        self.targets
            .iter()
            .find(|target| target.public_path.is_none())
            .map(|target| (target, self.public_path.as_str()))
    }
}

/// Path component of a request URL: no query, no fragment, no scheme or host
fn request_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let url = &url[..end];

    match url.find("://") {
        Some(scheme_end) => {
            let after = &url[scheme_end + 3..];
            after.find('/').map_or("/", |slash| &after[slash..])
        }
        None => url,
    }
}

/// Absolute, with exactly one trailing slash
fn normalize_public_path(public_path: &str) -> String {
    let path = request_path(public_path).trim_matches('/');
    if path.is_empty() {
        String::from("/")
    } else {
        format!("/{}/", path)
    }
}

/// What follows `prefix` in `path`, matching whole segments only: `/app/`
/// owns `/app` and `/app/x.js` but not `/apple.js`.
fn strip_public_path<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix.trim_end_matches('/'))?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}
