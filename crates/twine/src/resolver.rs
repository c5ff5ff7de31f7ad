//! Directive argument resolution.
//!
//! Turns the literal argument of a directive call into the candidate path (or
//! glob pattern) the file loader will look up. The rule order is load-bearing:
//! base-path resolution happens before extension normalization and before the
//! user transform, so a transform always receives a fully qualified `.js`
//! path.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use log::trace;

/// User-supplied path rewrite hook, e.g. for aliasing. Receives the
/// extension-qualified candidate and the base path.
pub type PathTransform = Box<dyn Fn(&Path, &Path) -> PathBuf + Send + Sync>;

pub struct PathResolver<'a> {
    root: PathBuf,
    base_path: PathBuf,
    source_ext: String,
    transform: Option<&'a (dyn Fn(&Path, &Path) -> PathBuf + Send + Sync)>,
}

impl fmt::Debug for PathResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("root", &self.root)
            .field("base_path", &self.base_path)
            .field("source_ext", &self.source_ext)
            .field("transform", &self.transform.map(|_| "..."))
            .finish()
    }
}

impl<'a> PathResolver<'a> {
    /// `root` is the process working directory; `base_path` is already
    /// absolute (root-joined by the caller).
    pub fn new(
        root: PathBuf,
        base_path: PathBuf,
        source_ext: impl Into<String>,
        transform: Option<&'a (dyn Fn(&Path, &Path) -> PathBuf + Send + Sync)>,
    ) -> Self {
        Self {
            root,
            base_path,
            source_ext: source_ext.into(),
            transform,
        }
    }

    /// Resolve a directive argument to a candidate path or glob pattern.
    ///
    /// `including_file` is the base-relative path of the file the directive
    /// appeared in. The result is absolute but not existence-checked.
    pub fn resolve(&self, argument: &str, including_file: &Path) -> PathBuf {
        let mut candidate = if argument.starts_with("./") || argument.starts_with("../") {
            let dir = including_file.parent().unwrap_or_else(|| Path::new(""));
            dir.join(argument)
        } else {
            PathBuf::from(argument)
        };
        candidate = self.base_path.join(candidate);
        candidate.set_extension(&self.source_ext);
        if let Some(transform) = self.transform {
            candidate = transform(&candidate, &self.base_path);
        }
        let absolute = if candidate.is_absolute() {
            candidate
        } else {
            self.root.join(candidate)
        };
        let resolved = normalize_path(&absolute);
        trace!(
            "resolved `{argument}` (from `{}`) -> `{}`",
            including_file.display(),
            resolved.display()
        );
        resolved
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into their
/// parent. No filesystem access, so symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut result = if let Some(component @ Component::Prefix(..)) = components.peek().copied() {
        components.next();
        PathBuf::from(component.as_os_str())
    } else {
        PathBuf::new()
    };
    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => result.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolver<'a>(
        base: &str,
        transform: Option<&'a (dyn Fn(&Path, &Path) -> PathBuf + Send + Sync)>,
    ) -> PathResolver<'a> {
        PathResolver::new(
            PathBuf::from("/work"),
            normalize_path(&Path::new("/work").join(base)),
            "js",
            transform,
        )
    }

    #[test]
    fn plain_arguments_resolve_against_the_base_path() {
        let r = resolver("fixtures", None);
        assert_eq!(
            r.resolve("a", Path::new("entry.js")),
            PathBuf::from("/work/fixtures/a.js")
        );
    }

    #[test]
    fn relative_arguments_join_the_including_directory() {
        let r = resolver("", None);
        assert_eq!(
            r.resolve("./b", Path::new("lib/entry.js")),
            PathBuf::from("/work/lib/b.js")
        );
        assert_eq!(
            r.resolve("../c", Path::new("lib/entry.js")),
            PathBuf::from("/work/c.js")
        );
    }

    #[test]
    fn relative_arguments_stay_under_the_base_path() {
        let r = resolver("fixtures", None);
        assert_eq!(
            r.resolve("./b", Path::new("entry.js")),
            PathBuf::from("/work/fixtures/b.js")
        );
    }

    #[test]
    fn extensions_are_normalized() {
        let r = resolver("", None);
        assert_eq!(
            r.resolve("a.js", Path::new("entry.js")),
            PathBuf::from("/work/a.js")
        );
        assert_eq!(
            r.resolve("dir/*", Path::new("entry.js")),
            PathBuf::from("/work/dir/*.js")
        );
    }

    #[test]
    fn transform_sees_an_extension_qualified_path() {
        let transform: PathTransform = Box::new(|path, _base| {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("js"));
            Path::new("aliased").join(path.file_name().unwrap_or_default())
        });
        let r = resolver("", Some(transform.as_ref()));
        assert_eq!(
            r.resolve("a", Path::new("entry.js")),
            PathBuf::from("/work/aliased/a.js")
        );
    }

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize_path(Path::new("a/./b")), PathBuf::from("a/b"));
    }
}
