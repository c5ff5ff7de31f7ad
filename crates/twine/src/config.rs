//! Bundler configuration.
//!
//! The serde surface covers everything expressible in a `twine.toml`; the
//! function-valued hooks (`filepath_transform`, custom `process`) are set on
//! the [`crate::orchestrator::Bundler`] builder instead.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    error::{Result, TwineError},
    loader::SourceFile,
    template::TemplateData,
};

/// Default wrapping template: every section gets its own anonymous
/// invocation scope.
pub const DEFAULT_TEMPLATE: &str = "(function() {\n<%= src %>\n})();";

/// Default separator inserted between consecutive sections.
pub const DEFAULT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root against which directive arguments are resolved.
    pub base_path: PathBuf,
    /// Wrapping template; must interpolate `src` exactly once.
    pub template: String,
    /// Text inserted between consecutive sections (never after the last).
    pub separator: String,
    /// Files included verbatim, never scanned for nested directives.
    pub skip_files: Vec<PathBuf>,
    /// Name of the include directive.
    pub directive: String,
    /// Canonical source extension appended to directive arguments.
    pub source_ext: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::new(),
            template: DEFAULT_TEMPLATE.to_owned(),
            separator: DEFAULT_SEPARATOR.to_owned(),
            skip_files: Vec::new(),
            directive: "require".to_owned(),
            source_ext: "js".to_owned(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| TwineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|err| {
            TwineError::Configuration(format!("failed to parse `{}`: {err}", path.display()))
        })
    }
}

/// Content-processing hook applied to a file's raw contents before scanning.
#[derive(Default)]
pub enum ContentProcess {
    /// No processing (the default).
    #[default]
    Disabled,
    /// Expand the file contents as a template with the given data.
    Template(TemplateData),
    /// Arbitrary transformation of the loaded file.
    Custom(ProcessFn),
}

pub type ProcessFn = Box<dyn Fn(&SourceFile) -> Result<String> + Send + Sync>;

impl fmt::Debug for ContentProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Template(data) => f.debug_tuple("Template").field(data).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = Config::default();
        assert_eq!(config.base_path, PathBuf::new());
        assert_eq!(config.template, DEFAULT_TEMPLATE);
        assert_eq!(config.separator, "\n\n");
        assert!(config.skip_files.is_empty());
        assert_eq!(config.directive, "require");
        assert_eq!(config.source_ext, "js");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config =
            toml::from_str("base_path = \"lib\"\nseparator = \"\\n\"\n").unwrap();
        assert_eq!(config.base_path, PathBuf::from("lib"));
        assert_eq!(config.separator, "\n");
        assert_eq!(config.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("no_such_option = true\n").is_err());
    }
}
