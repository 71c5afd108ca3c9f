use crate::error::ServerResult;
use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Path, PathBuf};

/// Maps request paths to on-disk paths inside the served root.
///
/// The traversal check is made against the canonicalized absolute path, not
/// the raw string: `..` segments, percent-encoded variants of them, and
/// symlinks pointing outside the root all collapse to a canonical path that
/// simply fails the prefix test. Rejection carries no detail, so a caller
/// answering 404 cannot be used to probe what exists outside the root.
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver over the served root, which must exist
    pub fn new<P: AsRef<Path>>(root: P) -> ServerResult<Self> {
        let root = fs::canonicalize(root)?;
        Ok(Self { root })
    }

    /// The canonical served root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw request path to a canonical path under the root.
    ///
    /// Returns `None` for anything that cannot be served: bad
    /// percent-encoding, nonexistent targets, and canonical paths that
    /// escape the root all look the same from the outside.
    pub fn resolve(&self, raw_path: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(raw_path).decode_utf8().ok()?;

        // Everything from '?' or '#' on is not part of the filesystem path
        let path_only = decoded
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or("/");
        let relative = path_only.trim_start_matches('/');

        let joined = self.root.join(relative);
        let canonical = fs::canonicalize(joined).ok()?;

        if canonical.starts_with(&self.root) {
            Some(canonical)
        } else {
            None
        }
    }

    /// The root-relative form of a resolved path, with forward slashes.
    ///
    /// Used as the key into the access counter; `canonical` must have come
    /// out of `resolve`.
    pub fn relative_to_root(&self, canonical: &Path) -> String {
        let relative = canonical.strip_prefix(&self.root).unwrap_or(canonical);
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        parts.join("/")
    }
}
