//! File loader collaborator.
//!
//! Turns paths and glob patterns into [`SourceFile`] records. Glob matches
//! are returned in lexicographic path order so bundle output is stable across
//! platforms and filesystems.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use globset::Glob;
use ignore::WalkBuilder;
use log::{debug, trace};

use crate::{
    error::{Result, TwineError},
    resolver,
};

const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// One loaded source file.
///
/// `relative_path` is relative to the configured base path and is the unique
/// key used for include-once tracking and source-map attribution.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub base_path: PathBuf,
    pub relative_path: PathBuf,
    pub contents: String,
}

/// Loads files relative to the process working directory, keyed against a
/// base path.
#[derive(Debug)]
pub struct FileLoader {
    root: PathBuf,
    base_path: PathBuf,
}

impl FileLoader {
    /// `root` is the process working directory; `base_path` (possibly empty)
    /// is joined onto it to form the key base.
    pub fn new(root: PathBuf, base_path: &Path) -> Self {
        let base_path = resolver::normalize_path(&root.join(base_path));
        Self { root, base_path }
    }

    /// Strip the base path (or the working directory) from an absolute path,
    /// producing the canonical include-once key.
    pub fn relativize(&self, path: &Path) -> PathBuf {
        let normalized = resolver::normalize_path(path);
        if let Ok(stripped) = normalized.strip_prefix(&self.base_path) {
            return stripped.to_path_buf();
        }
        if let Ok(stripped) = normalized.strip_prefix(&self.root) {
            return stripped.to_path_buf();
        }
        normalized
    }

    /// Load a single concrete file.
    pub fn load(&self, path: &Path) -> Result<SourceFile> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let absolute = resolver::normalize_path(&absolute);
        let contents = fs::read_to_string(&absolute).map_err(|source| TwineError::Io {
            path: absolute.clone(),
            source,
        })?;
        let relative_path = self.relativize(&absolute);
        trace!("loaded `{}` ({} bytes)", relative_path.display(), contents.len());
        Ok(SourceFile {
            base_path: self.base_path.clone(),
            relative_path,
            contents,
        })
    }

    /// Whether a candidate contains glob metacharacters.
    pub fn is_pattern(candidate: &str) -> bool {
        candidate.contains(GLOB_CHARS)
    }

    /// Expand a path-or-pattern into ordered file records.
    ///
    /// A plain path loads exactly one file; a glob pattern is matched against
    /// a filesystem walk rooted at the pattern's literal prefix.
    pub fn load_matches(&self, candidate: &str) -> Result<Vec<SourceFile>> {
        if !Self::is_pattern(candidate) {
            return Ok(vec![self.load(Path::new(candidate))?]);
        }

        let pattern_path = Path::new(candidate);
        let absolute = if pattern_path.is_absolute() {
            pattern_path.to_path_buf()
        } else {
            self.root.join(pattern_path)
        };
        let pattern_text = absolute.to_string_lossy();
        let matcher = Glob::new(&pattern_text)
            .map_err(|err| {
                TwineError::Configuration(format!("invalid glob pattern `{candidate}`: {err}"))
            })?
            .compile_matcher();

        let walk_root = literal_prefix(&absolute);
        let mut paths = Vec::new();
        for entry in WalkBuilder::new(&walk_root).standard_filters(false).build() {
            let entry = entry.map_err(|err| TwineError::Io {
                path: walk_root.clone(),
                source: std::io::Error::other(err),
            })?;
            if entry.file_type().is_some_and(|ft| ft.is_file()) && matcher.is_match(entry.path()) {
                paths.push(entry.path().to_path_buf());
            }
        }
        paths.sort();
        debug!("pattern `{candidate}` matched {} file(s)", paths.len());
        paths.iter().map(|path| self.load(path)).collect()
    }
}

/// Longest leading run of pattern components without glob metacharacters.
fn literal_prefix(pattern: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(part) = component {
            if part.to_string_lossy().contains(GLOB_CHARS) {
                break;
            }
        }
        prefix.push(component);
    }
    if prefix.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn relativizes_against_the_base_path() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/app.js"), "app();").unwrap();

        let loader = FileLoader::new(tmp.path().to_path_buf(), Path::new("src"));
        let file = loader.load(Path::new("src/app.js")).unwrap();
        assert_eq!(file.relative_path, PathBuf::from("app.js"));
        assert_eq!(file.contents, "app();");
    }

    #[test]
    fn missing_file_reports_its_path() {
        let tmp = TempDir::new().unwrap();
        let loader = FileLoader::new(tmp.path().to_path_buf(), Path::new(""));
        let err = loader.load(Path::new("nope.js")).unwrap_err();
        match err {
            TwineError::Io { path, .. } => assert!(path.ends_with("nope.js")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn glob_matches_are_lexicographic() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("glob");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.js"), "b();").unwrap();
        fs::write(dir.join("a.js"), "a();").unwrap();
        fs::write(dir.join("c.txt"), "not js").unwrap();

        let loader = FileLoader::new(tmp.path().to_path_buf(), Path::new(""));
        let files = loader.load_matches("glob/*.js").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("glob/a.js"), PathBuf::from("glob/b.js")]
        );
    }

    #[test]
    fn plain_path_is_not_treated_as_a_pattern() {
        assert!(!FileLoader::is_pattern("lib/util.js"));
        assert!(FileLoader::is_pattern("lib/*.js"));
        assert!(FileLoader::is_pattern("lib/util-?.js"));
    }
}
