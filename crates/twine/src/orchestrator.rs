//! Bundle orchestration.
//!
//! [`Bundler`] owns the configuration and the function-valued hooks, validates
//! everything that can be validated before any file I/O, and runs one bundle
//! operation end to end: load, assemble, render. Every invocation owns a
//! fresh include-once set; nothing is shared across runs.

use std::{fmt, path::PathBuf};

use log::{debug, info};

use crate::{
    assembler::{IncludeSet, Section, SectionAssembler},
    config::{Config, ContentProcess},
    emitter::{self, Bundle},
    error::{Result, TwineError},
    loader::FileLoader,
    resolver::{PathResolver, PathTransform},
    template::{self, MicroTemplate, TemplateEngine},
};

pub struct Bundler {
    config: Config,
    transform: Option<PathTransform>,
    process: ContentProcess,
    engine: Box<dyn TemplateEngine + Send + Sync>,
}

impl fmt::Debug for Bundler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundler")
            .field("config", &self.config)
            .field("transform", &self.transform.as_ref().map(|_| "..."))
            .field("process", &self.process)
            .finish()
    }
}

impl Bundler {
    /// Build a bundler, rejecting invalid configuration eagerly.
    pub fn new(config: Config) -> Result<Self> {
        if config.directive.is_empty() {
            return Err(TwineError::Configuration(
                "directive name must not be empty".to_owned(),
            ));
        }
        // The wrapping template must interpolate `src` exactly once.
        template::find_marker(&config.template, template::SRC_MARKER)?;
        Ok(Self {
            config,
            transform: None,
            process: ContentProcess::Disabled,
            engine: Box::new(MicroTemplate),
        })
    }

    /// Install a path rewrite hook applied to every resolved directive
    /// argument.
    #[must_use]
    pub fn with_filepath_transform(mut self, transform: PathTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Install a content-processing hook applied before scanning.
    #[must_use]
    pub fn with_process(mut self, process: ContentProcess) -> Self {
        self.process = process;
        self
    }

    /// Replace the template engine used for wrapping and processing.
    #[must_use]
    pub fn with_template_engine(mut self, engine: Box<dyn TemplateEngine + Send + Sync>) -> Self {
        self.engine = engine;
        self
    }

    /// Run one bundle operation over an entry file or glob pattern.
    pub fn bundle(&self, entry: &str) -> Result<Bundle> {
        let sections = self.assemble(entry)?;
        info!("assembled {} section(s) from `{entry}`", sections.len());
        emitter::render(
            &sections,
            &self.config.template,
            &self.config.separator,
            self.engine.as_ref(),
        )
    }

    /// Run one bundle operation and return only the flattened text.
    pub fn bundle_to_string(&self, entry: &str) -> Result<String> {
        Ok(self.bundle(entry)?.code)
    }

    fn assemble(&self, entry: &str) -> Result<Vec<Section>> {
        let root = std::env::current_dir().map_err(|source| TwineError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        let loader = FileLoader::new(root.clone(), &self.config.base_path);

        // Skip entries are given relative to the working directory; key them
        // the same way loaded files are keyed.
        let skip_files = self
            .config
            .skip_files
            .iter()
            .map(|path| loader.relativize(&root.join(path)))
            .collect();
        debug!("skip list: {skip_files:?}");

        let base_abs = crate::resolver::normalize_path(&root.join(&self.config.base_path));
        let resolver = PathResolver::new(
            root,
            base_abs,
            self.config.source_ext.clone(),
            self.transform.as_deref(),
        );

        let assembler = SectionAssembler::new(
            &loader,
            &resolver,
            &self.config.directive,
            &skip_files,
            &self.process,
            self.engine.as_ref(),
        );
        let mut state = IncludeSet::default();
        assembler.assemble_pattern(entry, &mut state)
    }
}
