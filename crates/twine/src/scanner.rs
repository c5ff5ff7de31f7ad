//! Directive scan over one source fragment.
//!
//! Walks the syntax tree with the fixed child table from [`crate::ast`] and
//! collects every call site whose callee names the include directive. A
//! function declaration or variable declarator that binds the directive name
//! shadows it: the declaration itself and everything after it in the same
//! child list are excluded from the scan, so nothing nested below the shadow
//! is ever visited. Results are sorted by ascending start offset, ties broken
//! by ascending end offset.

use std::collections::VecDeque;

use crate::{
    ast::{LiteralValue, Node, NodeKind},
    error::ScanError,
    parser,
};

/// One qualifying directive call site.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveCall {
    /// Half-open byte range of the call expression.
    pub range: (usize, usize),
    /// Literal argument values, in argument order.
    pub arguments: Vec<LiteralValue>,
}

/// Scan `source` for calls to `directive_name`.
///
/// Fails with [`ScanError::Parse`] on malformed source and with
/// [`ScanError::UnsupportedArgument`] when a qualifying call carries a
/// non-literal argument. Traversal order is not textual order; the collected
/// calls are sorted before being returned.
pub fn scan(source: &str, directive_name: &str) -> Result<Vec<DirectiveCall>, ScanError> {
    let program = parser::parse_program(source)?;

    let mut calls = Vec::new();
    let mut queue: VecDeque<&Node> = VecDeque::new();
    queue.push_back(&program);

    while let Some(node) = queue.pop_front() {
        for child in node.children() {
            if child.declared_name() == Some(directive_name) {
                // From this point on, every directive-named call in this
                // scope refers to the local binding.
                break;
            }

            if let NodeKind::Call { callee, arguments } = &child.kind {
                if callee.identifier_name() == Some(directive_name) {
                    let mut literals = Vec::with_capacity(arguments.len());
                    for argument in arguments {
                        match &argument.kind {
                            NodeKind::Literal(value) => literals.push(value.clone()),
                            _ => {
                                return Err(ScanError::UnsupportedArgument {
                                    kind: argument.category(),
                                });
                            }
                        }
                    }
                    calls.push(DirectiveCall {
                        range: child.range,
                        arguments: literals,
                    });
                }
            }

            // Directive calls may be nested, so the call's own children
            // (its arguments) are still traversed.
            queue.push_back(child);
        }
    }

    calls.sort_by(|a, b| {
        a.range
            .0
            .cmp(&b.range.0)
            .then_with(|| a.range.1.cmp(&b.range.1))
    });
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn paths(source: &str) -> Vec<String> {
        scan(source, "require")
            .unwrap()
            .into_iter()
            .flat_map(|call| call.arguments)
            .map(|value| value.to_path_string())
            .collect()
    }

    #[test]
    fn finds_top_level_directives_in_order() {
        let source = "require('a');\nvar x = 1;\nrequire('b');\nrequire('c');";
        assert_eq!(paths(source), vec!["a", "b", "c"]);
    }

    #[test]
    fn ranges_cover_the_call_expression_only() {
        let calls = scan("foo();\nrequire('./bar');\nbaz();", "require").unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].range, (7, 23));
    }

    #[test]
    fn finds_directives_inside_control_flow() {
        let source = "if (a) { require('a'); } else { require('b'); }\n\
                      while (c) { require('c'); }\n\
                      do { require('d'); } while (e);\n\
                      switch (f) { case 1: require('e'); break; default: require('f'); }\n\
                      try { require('g'); } catch (err) { require('h'); } finally { require('i'); }";
        let mut found = paths(source);
        found.sort();
        assert_eq!(found, vec!["a", "b", "c", "d", "e", "f", "g", "h", "i"]);
    }

    #[test]
    fn finds_directives_in_expressions_and_literals() {
        let source = "var a = flag && require('a');\n\
                      var b = cond ? require('b') : require('c');\n\
                      var c = [require('d'), { deep: require('e') }];\n\
                      fn(require('f'), 1 + require('g'));";
        let mut found = paths(source);
        found.sort();
        assert_eq!(found, vec!["a", "b", "c", "d", "e", "f", "g"]);
    }

    #[test]
    fn shadowing_function_declaration_excludes_nested_calls() {
        let source = "function require(path) { require('not-a-directive'); }\nafter();";
        assert_eq!(paths(source), Vec::<String>::new());
    }

    #[test]
    fn shadowing_variable_declarator_excludes_nested_calls() {
        let source = "var require = function(path) { return require('nope'); };";
        assert_eq!(paths(source), Vec::<String>::new());
    }

    #[test]
    fn siblings_before_the_shadow_are_still_scanned() {
        let source = "require('before');\nfunction require(p) {}\nrequire('after');";
        assert_eq!(paths(source), vec!["before"]);
    }

    #[test]
    fn deeply_nested_shadow_is_respected() {
        let source = "function outer() {\n\
                      \tfunction inner() {\n\
                      \t\tvar require = shim;\n\
                      \t\trequire('hidden');\n\
                      \t}\n\
                      }\n\
                      require('visible');";
        assert_eq!(paths(source), vec!["visible"]);
    }

    #[test]
    fn member_calls_are_not_directives() {
        let source = "foo.require('a');\nrequire.async('b');";
        assert_eq!(paths(source), Vec::<String>::new());
    }

    #[test]
    fn non_literal_argument_is_a_hard_failure() {
        let err = scan("require(someVariable);", "require").unwrap_err();
        match err {
            ScanError::UnsupportedArgument { kind } => assert_eq!(kind, "Identifier"),
            other => panic!("expected UnsupportedArgument, got {other:?}"),
        }
    }

    #[test]
    fn multiple_literal_arguments_are_collected_in_order() {
        let calls = scan("require('a', 'b');", "require").unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].arguments,
            vec![
                LiteralValue::Str("a".into()),
                LiteralValue::Str("b".into())
            ]
        );
    }

    #[test]
    fn directives_in_comments_are_ignored() {
        let source = "// require('a');\n/* require('b'); */\nreal();";
        assert_eq!(paths(source), Vec::<String>::new());
    }

    #[test]
    fn results_are_sorted_by_start_offset() {
        let source = "wrap(require('inner'));\nrequire('outer');";
        let calls = scan(source, "require").unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].range.0 < calls[1].range.0);
    }
}
