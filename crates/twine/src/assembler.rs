//! Section assembly: the depth-first directive expansion.
//!
//! Recursively turns a source file (or glob pattern) into the ordered list of
//! attributed [`Section`]s that make up the bundle. Each directive call site
//! is replaced in place by its dependency's fully expanded sections; code
//! before, between and after call sites is preserved exactly. The include-once
//! set is insert-before-recurse, which is what terminates cycles: the inner
//! visit to a file already in flight looks like a plain duplicate and
//! contributes nothing.

use std::{fmt, hash::BuildHasherDefault, path::PathBuf};

use indexmap::IndexSet;
use log::{debug, trace};
use rustc_hash::FxHasher;

use crate::{
    config::ContentProcess,
    error::{Result, ScanError, TwineError},
    loader::{FileLoader, SourceFile},
    resolver::PathResolver,
    scanner,
    template::TemplateEngine,
};

pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Paths already dispatched for resolution in the current bundle run.
/// Insert-only; owned by the top-level bundle operation.
pub type IncludeSet = FxIndexSet<PathBuf>;

/// A contiguous slice of output attributable to one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub origin: PathBuf,
    /// 1-based line in the origin file where this slice begins. Text after a
    /// spliced directive call starts mid-file, not at line 1.
    pub start_line: u32,
    pub text: String,
}

/// Outcome of assembling one concrete file.
#[derive(Debug)]
pub enum Assembled {
    Sections(Vec<Section>),
    /// The file was already included; it contributes zero sections.
    Skipped,
}

pub struct SectionAssembler<'a> {
    loader: &'a FileLoader,
    resolver: &'a PathResolver<'a>,
    directive: &'a str,
    skip_files: &'a FxIndexSet<PathBuf>,
    process: &'a ContentProcess,
    engine: &'a dyn TemplateEngine,
}

impl fmt::Debug for SectionAssembler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionAssembler")
            .field("directive", &self.directive)
            .field("skip_files", &self.skip_files)
            .field("process", &self.process)
            .finish()
    }
}

impl<'a> SectionAssembler<'a> {
    pub fn new(
        loader: &'a FileLoader,
        resolver: &'a PathResolver<'a>,
        directive: &'a str,
        skip_files: &'a FxIndexSet<PathBuf>,
        process: &'a ContentProcess,
        engine: &'a dyn TemplateEngine,
    ) -> Self {
        Self {
            loader,
            resolver,
            directive,
            skip_files,
            process,
            engine,
        }
    }

    /// Assemble everything a path-or-pattern expands to, in loader order.
    ///
    /// A pattern is never itself a dedup key; each concrete match is keyed
    /// individually, and skipped matches are filtered out.
    pub fn assemble_pattern(
        &self,
        candidate: &str,
        state: &mut IncludeSet,
    ) -> Result<Vec<Section>> {
        let mut sections = Vec::new();
        for file in self.loader.load_matches(candidate)? {
            match self.assemble_file(file, state)? {
                Assembled::Sections(nested) => sections.extend(nested),
                Assembled::Skipped => {}
            }
        }
        Ok(sections)
    }

    /// Assemble one concrete file into sections.
    pub fn assemble_file(
        &self,
        file: SourceFile,
        state: &mut IncludeSet,
    ) -> Result<Assembled> {
        if state.contains(&file.relative_path) {
            trace!("`{}` already included, skipping", file.relative_path.display());
            return Ok(Assembled::Skipped);
        }
        // Mark in flight before recursing so circular references terminate.
        state.insert(file.relative_path.clone());

        if self.skip_files.contains(&file.relative_path) {
            debug!("`{}` is skip-listed, included verbatim", file.relative_path.display());
            return Ok(Assembled::Sections(vec![Section {
                origin: file.relative_path,
                start_line: 1,
                text: file.contents,
            }]));
        }

        let contents = self.preprocess(&file)?;
        let calls = scanner::scan(&contents, self.directive).map_err(|err| match err {
            ScanError::Parse(parse) => TwineError::Parse {
                file: file.relative_path.clone(),
                offset: parse.offset,
                line: parse.line,
                column: parse.column,
                message: parse.message,
            },
            ScanError::UnsupportedArgument { kind } => TwineError::UnsupportedArgument {
                file: file.relative_path.clone(),
                kind,
            },
        })?;
        debug!(
            "`{}`: {} directive call(s)",
            file.relative_path.display(),
            calls.len()
        );

        if calls.is_empty() {
            return Ok(Assembled::Sections(vec![Section {
                origin: file.relative_path,
                start_line: 1,
                text: contents,
            }]));
        }

        let bytes = contents.as_bytes();
        let mut sections = Vec::new();
        let mut cursor = 0usize;
        for call in &calls {
            let (start, end) = call.range;
            if start < cursor {
                // Overlapping ranges cannot come out of the scanner; be safe.
                continue;
            }
            if cursor < start {
                sections.push(Section {
                    origin: file.relative_path.clone(),
                    start_line: line_at(&contents, cursor),
                    text: contents[cursor..start].to_owned(),
                });
            }
            for argument in &call.arguments {
                let candidate = self
                    .resolver
                    .resolve(&argument.to_path_string(), &file.relative_path);
                let nested =
                    self.assemble_pattern(&candidate.to_string_lossy(), state)?;
                sections.extend(nested);
            }
            cursor = end;
            // A directive used as a whole statement leaves no dangling
            // punctuation or blank line behind.
            if bytes.get(cursor) == Some(&b';') {
                cursor += 1;
            }
            if bytes.get(cursor) == Some(&b'\r') && bytes.get(cursor + 1) == Some(&b'\n') {
                cursor += 2;
            } else if bytes.get(cursor) == Some(&b'\n') {
                cursor += 1;
            }
        }
        if cursor < contents.len() {
            sections.push(Section {
                origin: file.relative_path.clone(),
                start_line: line_at(&contents, cursor),
                text: contents[cursor..].to_owned(),
            });
        }
        Ok(Assembled::Sections(sections))
    }

    fn preprocess(&self, file: &SourceFile) -> Result<String> {
        match self.process {
            ContentProcess::Disabled => Ok(file.contents.clone()),
            ContentProcess::Template(data) => self.engine.expand(&file.contents, data),
            ContentProcess::Custom(hook) => hook(file),
        }
    }
}

/// 1-based line number of the byte at `offset` within `contents`.
fn line_at(contents: &str, offset: usize) -> u32 {
    contents[..offset].matches('\n').count() as u32 + 1
}
