//! Bundle rendering and source-map construction.
//!
//! Wraps every section individually in the configured template (per-fragment
//! isolation is deliberate semantics: with the default invocation wrapper,
//! each file chunk gets its own scope), joins the wrapped fragments with the
//! separator, and attributes every output line back to its originating file
//! and 1-based line through the generated source map.

use std::{fmt, path::PathBuf};

use sourcemap::{SourceMap, SourceMapBuilder};

use crate::{
    assembler::Section,
    error::Result,
    template::{self, TemplateData, TemplateEngine},
};

/// Count of template lines strictly before/after the substitution marker.
/// Computed once per bundle run and reused for every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOffsets {
    pub before: usize,
    pub after: usize,
}

impl LineOffsets {
    /// Locate the `src` marker in `template` and count surrounding newlines.
    pub fn of_template(template: &str) -> Result<Self> {
        let (start, end) = template::find_marker(template, template::SRC_MARKER)?;
        Ok(Self {
            before: template[..start].matches('\n').count(),
            after: template[end..].matches('\n').count(),
        })
    }
}

/// Atomic unit of source-map construction: one run of output text, either
/// attributed to an original file line or synthetic (template boilerplate,
/// separators).
#[derive(Debug, Clone, PartialEq)]
pub struct MappedChunk {
    /// 1-based line in the originating file; `None` for synthetic text.
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub source: Option<PathBuf>,
    pub text: String,
}

impl MappedChunk {
    fn synthetic(text: String) -> Self {
        Self {
            line: None,
            column: None,
            source: None,
            text,
        }
    }
}

/// Finished bundle: flattened text plus its source map.
pub struct Bundle {
    pub code: String,
    pub map: SourceMap,
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("code", &self.code)
            .field("sources", &self.map.get_source_count())
            .finish()
    }
}

/// Render sections to the final artifact.
pub fn render(
    sections: &[Section],
    template: &str,
    separator: &str,
    engine: &dyn TemplateEngine,
) -> Result<Bundle> {
    let offsets = LineOffsets::of_template(template)?;
    let mut chunks: Vec<MappedChunk> = Vec::new();

    for (index, section) in sections.iter().enumerate() {
        if index > 0 && !separator.is_empty() {
            chunks.push(MappedChunk::synthetic(separator.to_owned()));
        }

        let mut data = TemplateData::default();
        data.insert(template::SRC_MARKER.to_owned(), section.text.clone());
        let wrapped = engine.expand(template, &data)?;

        let lines: Vec<&str> = wrapped.split_inclusive('\n').collect();
        let mapped_end = lines.len().saturating_sub(offsets.after);
        for (k, line) in lines.iter().enumerate() {
            if k >= offsets.before && k < mapped_end {
                chunks.push(MappedChunk {
                    line: Some(section.start_line + (k - offsets.before) as u32),
                    column: Some(0),
                    source: Some(section.origin.clone()),
                    text: (*line).to_owned(),
                });
            } else {
                chunks.push(MappedChunk::synthetic((*line).to_owned()));
            }
        }
    }

    Ok(build(&chunks))
}

/// Concatenate chunks and feed every attributed one to the map builder.
fn build(chunks: &[MappedChunk]) -> Bundle {
    let mut code = String::new();
    let mut builder = SourceMapBuilder::new(None);
    let mut dst_line: u32 = 0;
    let mut dst_col: u32 = 0;

    for chunk in chunks {
        if let (Some(line), Some(source)) = (chunk.line, chunk.source.as_ref()) {
            let source_text = source.to_string_lossy();
            builder.add(
                dst_line,
                dst_col,
                line - 1,
                chunk.column.unwrap_or(0),
                Some(&source_text),
                None,
                false,
            );
        }
        for c in chunk.text.chars() {
            if c == '\n' {
                dst_line += 1;
                dst_col = 0;
            } else {
                dst_col += 1;
            }
        }
        code.push_str(&chunk.text);
    }

    Bundle {
        code,
        map: builder.into_sourcemap(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::template::MicroTemplate;

    fn section(origin: &str, text: &str) -> Section {
        section_at(origin, 1, text)
    }

    fn section_at(origin: &str, start_line: u32, text: &str) -> Section {
        Section {
            origin: PathBuf::from(origin),
            start_line,
            text: text.to_owned(),
        }
    }

    #[test]
    fn offsets_count_newlines_around_the_marker() {
        let offsets = LineOffsets::of_template("(function() {\n<%= src %>\n})();").unwrap();
        assert_eq!(offsets, LineOffsets { before: 1, after: 1 });

        let identity = LineOffsets::of_template("<%= src %>").unwrap();
        assert_eq!(identity, LineOffsets { before: 0, after: 0 });
    }

    #[test]
    fn identity_template_concatenates_with_separator() {
        let sections = [section("a.js", "a();\n"), section("b.js", "b();\n")];
        let bundle = render(&sections, "<%= src %>", "\n", &MicroTemplate).unwrap();
        assert_eq!(bundle.code, "a();\n\nb();\n");
    }

    #[test]
    fn separator_is_not_appended_after_the_last_section() {
        let sections = [section("a.js", "a();")];
        let bundle = render(&sections, "<%= src %>", "!!!!", &MicroTemplate).unwrap();
        assert_eq!(bundle.code, "a();");
    }

    #[test]
    fn wrapper_lines_are_synthetic() {
        let sections = [section("a.js", "one();\ntwo();")];
        let bundle = render(
            &sections,
            "(function() {\n<%= src %>\n})();",
            "\n\n",
            &MicroTemplate,
        )
        .unwrap();
        assert_eq!(bundle.code, "(function() {\none();\ntwo();\n})();");

        // Output line 0 is boilerplate; lines 1 and 2 map back to a.js.
        assert!(bundle.map.lookup_token(0, 0).is_none());
        let token = bundle.map.lookup_token(1, 0).expect("line 1 is mapped");
        assert_eq!(token.get_source(), Some("a.js"));
        assert_eq!(token.get_src_line(), 0);
        let token = bundle.map.lookup_token(2, 0).expect("line 2 is mapped");
        assert_eq!(token.get_src_line(), 1);
    }

    #[test]
    fn mapping_survives_multiple_sections() {
        let sections = [
            section("first.js", "f1();\nf2();\n"),
            section("second.js", "s1();\n"),
        ];
        let bundle = render(
            &sections,
            "(function() {\n<%= src %>\n})();",
            "\n\n",
            &MicroTemplate,
        )
        .unwrap();
        // Layout: wrapper, f1, f2, "", wrapper ... -> second.js body is at
        // output line 7 (0-based).
        let token = bundle.map.lookup_token(7, 0).expect("second body mapped");
        assert_eq!(token.get_source(), Some("second.js"));
        assert_eq!(token.get_src_line(), 0);
    }

    #[test]
    fn sections_starting_midfile_keep_their_line_numbers() {
        // The two entry.js sections are the halves around a spliced call:
        // the remainder resumes at line 3 of the original file.
        let sections = [
            section_at("entry.js", 1, "foo();\n"),
            section_at("bar.js", 1, "qux();\n"),
            section_at("entry.js", 3, "baz();\n"),
        ];
        let bundle = render(&sections, "<%= src %>", "", &MicroTemplate).unwrap();
        assert_eq!(bundle.code, "foo();\nqux();\nbaz();\n");

        let token = bundle.map.lookup_token(0, 0).expect("line 0 mapped");
        assert_eq!(token.get_source(), Some("entry.js"));
        assert_eq!(token.get_src_line(), 0);
        let token = bundle.map.lookup_token(2, 0).expect("line 2 mapped");
        assert_eq!(token.get_source(), Some("entry.js"));
        assert_eq!(token.get_src_line(), 2);
    }

    #[test]
    fn every_non_synthetic_line_round_trips() {
        let sections = [
            section("x.js", "x1();\nx2();\nx3();\n"),
            section("y.js", "y1();\n"),
        ];
        let template = "(function() {\n<%= src %>\n})();";
        let bundle = render(&sections, template, "\n\n", &MicroTemplate).unwrap();

        let expected = [
            (1, "x.js", 1),
            (2, "x.js", 2),
            (3, "x.js", 3),
            (8, "y.js", 1),
        ];
        for (out_line, source, src_line) in expected {
            let token = bundle
                .map
                .lookup_token(out_line, 0)
                .unwrap_or_else(|| panic!("line {out_line} should be mapped"));
            assert_eq!(token.get_source(), Some(source), "line {out_line}");
            assert_eq!(token.get_src_line() + 1, src_line, "line {out_line}");
        }
    }
}
