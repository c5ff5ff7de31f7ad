//! Template engine collaborator.
//!
//! The wrapping template and the optional content-processing hook both go
//! through this interface. The default engine understands the three classic
//! delimiter forms: `<%= name %>` (raw interpolation), `<%- name %>`
//! (HTML-escaped interpolation) and `<% ... %>` (free code, recognized and
//! dropped; this engine does not evaluate code).

use indexmap::IndexMap;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TwineError};

/// Name of the substitution marker every wrapping template must interpolate.
pub const SRC_MARKER: &str = "src";

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<%([-=]?)([\s\S]*?)%>").expect("tag pattern is valid"));

/// Values bound during one expansion.
pub type TemplateData = IndexMap<String, String>;

pub trait TemplateEngine {
    /// Expand `template`, substituting interpolations from `data`.
    fn expand(&self, template: &str, data: &TemplateData) -> Result<String>;
}

/// Default logic-lite engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroTemplate;

impl TemplateEngine for MicroTemplate {
    fn expand(&self, template: &str, data: &TemplateData) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in TAG.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&template[last..whole.start()]);
            let name = caps[2].trim();
            match &caps[1] {
                "=" => out.push_str(lookup(data, name)),
                "-" => out.push_str(&html_escape(lookup(data, name))),
                _ => {} // free code block: emits nothing
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

fn lookup<'a>(data: &'a TemplateData, name: &str) -> &'a str {
    match data.get(name) {
        Some(value) => value,
        None => {
            warn!("template references unbound name `{name}`");
            ""
        }
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for the escaped interpolation form.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Locate the single interpolation tag binding `marker` in `template`,
/// returning the byte range of the whole tag.
///
/// A template with zero or more than one `marker` interpolation is rejected;
/// this check runs before any file I/O.
pub fn find_marker(template: &str, marker: &str) -> Result<(usize, usize)> {
    let mut found = None;
    for caps in TAG.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let interpolates = matches!(&caps[1], "=" | "-");
        if interpolates && caps[2].trim() == marker {
            if found.is_some() {
                return Err(TwineError::Configuration(format!(
                    "template interpolates `{marker}` more than once"
                )));
            }
            found = Some((whole.start(), whole.end()));
        }
    }
    found.ok_or_else(|| {
        TwineError::Configuration(format!(
            "template does not interpolate the `{marker}` substitution marker"
        ))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn data(pairs: &[(&str, &str)]) -> TemplateData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn raw_interpolation_substitutes_verbatim() {
        let out = MicroTemplate
            .expand("a <%= x %> b", &data(&[("x", "<1 & 2>")]))
            .unwrap();
        assert_eq!(out, "a <1 & 2> b");
    }

    #[test]
    fn escaped_interpolation_escapes_html() {
        let out = MicroTemplate
            .expand("<%- x %>", &data(&[("x", "<a href=\"q\">&</a>")]))
            .unwrap();
        assert_eq!(out, "&lt;a href=&quot;q&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn code_blocks_emit_nothing() {
        let out = MicroTemplate
            .expand("x<% if (a) { %>y<% } %>z", &data(&[]))
            .unwrap();
        assert_eq!(out, "xyz");
    }

    #[test]
    fn unbound_names_expand_empty() {
        let out = MicroTemplate.expand("[<%= missing %>]", &data(&[])).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn default_wrapper_expands_each_fragment() {
        let out = MicroTemplate
            .expand(
                crate::config::DEFAULT_TEMPLATE,
                &data(&[("src", "var a = 1;")]),
            )
            .unwrap();
        assert_eq!(out, "(function() {\nvar a = 1;\n})();");
    }

    #[test]
    fn find_marker_requires_exactly_one_interpolation() {
        assert_eq!(find_marker("<%= src %>", "src").unwrap(), (0, 10));
        assert!(find_marker("no marker here", "src").is_err());
        assert!(find_marker("<%= src %><%- src %>", "src").is_err());
        // A code block mentioning the marker does not count.
        assert!(find_marker("<% src %>", "src").is_err());
    }

    #[test]
    fn marker_position_ignores_other_tags() {
        let (start, end) = find_marker("<% header %>\n<%= src %>\n", "src").unwrap();
        assert_eq!((start, end), (13, 23));
    }
}
