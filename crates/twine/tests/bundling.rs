//! End-to-end bundling tests driving [`Bundler`] over real files.
//!
//! Fixtures live in per-test temporary directories and every path handed to
//! the bundler is absolute, so the tests do not depend on the process working
//! directory.

use std::{fs, path::Path};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use twine::{
    template::TemplateData,
    Bundler, Config, ContentProcess, TwineError,
};

fn write(dir: &TempDir, relative: &str, contents: &str) {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn entry(dir: &TempDir, relative: &str) -> String {
    dir.path().join(relative).to_string_lossy().into_owned()
}

/// Identity template and no separator: output is the raw section splice.
fn plain_config(dir: &TempDir) -> Config {
    Config {
        base_path: dir.path().to_path_buf(),
        template: "<%= src %>".to_owned(),
        separator: String::new(),
        ..Config::default()
    }
}

#[test]
fn splices_dependencies_in_place() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "foo();\nrequire('bar');\nbaz();\n");
    write(&tmp, "bar.js", "qux();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "foo();\nqux();\nbaz();\n");
}

#[test]
fn lines_after_a_splice_map_to_their_original_position() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "foo();\nrequire('bar');\nbaz();\n");
    write(&tmp, "bar.js", "qux();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let bundle = bundler.bundle(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(bundle.code, "foo();\nqux();\nbaz();\n");

    let token = bundle.map.lookup_token(0, 0).expect("line 0 mapped");
    assert_eq!(token.get_source(), Some("entry.js"));
    assert_eq!(token.get_src_line(), 0);
    let token = bundle.map.lookup_token(1, 0).expect("line 1 mapped");
    assert_eq!(token.get_source(), Some("bar.js"));
    assert_eq!(token.get_src_line(), 0);
    // `baz();` sits on line 3 of entry.js, not line 1 of a fresh section.
    let token = bundle.map.lookup_token(2, 0).expect("line 2 mapped");
    assert_eq!(token.get_source(), Some("entry.js"));
    assert_eq!(token.get_src_line(), 2);
}

#[test]
fn duplicate_requires_are_included_once() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('b');\nrequire('b');\nmain();\n");
    write(&tmp, "b.js", "x;\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "x;\nmain();\n");
}

#[test]
fn circular_requires_terminate() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "a.js", "a1();\nrequire('b');\na2();\n");
    write(&tmp, "b.js", "b1();\nrequire('a');\nb2();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "a.js")).unwrap();
    assert_eq!(code, "a1();\nb1();\nb2();\na2();\n");
}

#[test]
fn shadowed_directive_is_not_expanded() {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp,
        "entry.js",
        "require('dep');\nfunction require(p) { return p; }\nrequire('late');\n",
    );
    write(&tmp, "dep.js", "dep();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(
        code,
        "dep();\nfunction require(p) { return p; }\nrequire('late');\n"
    );
}

#[test]
fn missing_statement_semicolon_still_splices_cleanly() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('a')\nmain();\n");
    write(&tmp, "a.js", "a();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "a();\nmain();\n");
}

#[test]
fn relative_arguments_resolve_from_the_including_file() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "app/main.js", "require('./helper');\nrun();\n");
    write(&tmp, "app/helper.js", "helper();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "app/main.js")).unwrap();
    assert_eq!(code, "helper();\nrun();\n");
}

#[test]
fn glob_arguments_expand_in_lexicographic_order() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('widgets/*');\ndone();\n");
    write(&tmp, "widgets/b.js", "wb();\n");
    write(&tmp, "widgets/a.js", "wa();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "wa();\nwb();\ndone();\n");
}

#[test]
fn entry_may_itself_be_a_glob_pattern() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "glob/b.js", "gb();\n");
    write(&tmp, "glob/a.js", "ga();\nrequire('shared');\n");
    write(&tmp, "shared.js", "shared();\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "glob/*.js")).unwrap();
    assert_eq!(code, "ga();\nshared();\ngb();\n");
}

#[test]
fn skip_listed_files_are_included_verbatim() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('vendor');\nmain();\n");
    // Never scanned, so the bogus nested directive is not an error.
    write(&tmp, "vendor.js", "require('does-not-exist');\nvendor();\n");

    let mut config = plain_config(&tmp);
    config.skip_files.push(tmp.path().join("vendor.js"));
    let bundler = Bundler::new(config).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "require('does-not-exist');\nvendor();\nmain();\n");
}

#[test]
fn non_literal_argument_names_the_offending_file() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require(dynamic);\n");

    let bundler = Bundler::new(plain_config(&tmp)).unwrap();
    let err = bundler.bundle(&entry(&tmp, "entry.js")).unwrap_err();
    match err {
        TwineError::UnsupportedArgument { file, kind } => {
            assert_eq!(file, Path::new("entry.js"));
            assert_eq!(kind, "Identifier");
        }
        other => panic!("expected UnsupportedArgument, got {other:?}"),
    }
}

#[test]
fn renamed_directive_is_honored() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "include('part');\nrequire('part');\n");
    write(&tmp, "part.js", "part();\n");

    let mut config = plain_config(&tmp);
    config.directive = "include".to_owned();
    let bundler = Bundler::new(config).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    // `require` is now an ordinary call and stays in the output.
    assert_eq!(code, "part();\nrequire('part');\n");
}

#[test]
fn filepath_transform_rewrites_candidates() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('ui/button');\n");
    write(&tmp, "widgets/button.js", "button();\n");

    let bundler = Bundler::new(plain_config(&tmp))
        .unwrap()
        .with_filepath_transform(Box::new(|path, base| {
            let name = path.file_name().unwrap_or_default();
            base.join("widgets").join(name)
        }));
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "button();\n");
}

#[test]
fn template_processing_runs_before_scanning() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "banner('<%= version %>');\nrequire('dep');\n");
    write(&tmp, "dep.js", "dep('<%= version %>');\n");

    let mut data = TemplateData::default();
    data.insert("version".to_owned(), "1.2.3".to_owned());
    let bundler = Bundler::new(plain_config(&tmp))
        .unwrap()
        .with_process(ContentProcess::Template(data));
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "banner('1.2.3');\ndep('1.2.3');\n");
}

#[test]
fn custom_processing_hook_sees_each_file() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('dep');\nmain();\n");
    write(&tmp, "dep.js", "dep();\n");

    let bundler = Bundler::new(plain_config(&tmp))
        .unwrap()
        .with_process(ContentProcess::Custom(Box::new(|file| {
            Ok(format!(
                "/* {} */\n{}",
                file.relative_path.display(),
                file.contents
            ))
        })));
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(code, "/* entry.js */\n/* dep.js */\ndep();\nmain();\n");
}

#[test]
fn default_template_wraps_each_section() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('lib');\nmain();\n");
    write(&tmp, "lib.js", "lib1();\nlib2();\n");

    let config = Config {
        base_path: tmp.path().to_path_buf(),
        ..Config::default()
    };
    let bundler = Bundler::new(config).unwrap();
    let code = bundler.bundle_to_string(&entry(&tmp, "entry.js")).unwrap();
    assert_eq!(
        code,
        "(function() {\nlib1();\nlib2();\n\n})();\n\n(function() {\nmain();\n\n})();"
    );
}

#[test]
fn source_map_attributes_output_lines_to_their_files() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "entry.js", "require('lib');\nmain();\n");
    write(&tmp, "lib.js", "lib1();\nlib2();\n");

    let config = Config {
        base_path: tmp.path().to_path_buf(),
        ..Config::default()
    };
    let bundler = Bundler::new(config).unwrap();
    let bundle = bundler.bundle(&entry(&tmp, "entry.js")).unwrap();

    // Wrapper boilerplate carries no mapping.
    assert!(bundle.map.lookup_token(0, 0).is_none());

    let token = bundle.map.lookup_token(1, 0).expect("lib body mapped");
    assert_eq!(token.get_source(), Some("lib.js"));
    assert_eq!(token.get_src_line(), 0);

    let token = bundle.map.lookup_token(2, 0).expect("lib line 2 mapped");
    assert_eq!(token.get_src_line(), 1);

    // `main();` follows the spliced directive, so it is line 2 of entry.js.
    let token = bundle.map.lookup_token(7, 0).expect("entry body mapped");
    assert_eq!(token.get_source(), Some("entry.js"));
    assert_eq!(token.get_src_line(), 1);
}

#[test]
fn invalid_template_is_rejected_before_any_io() {
    let config = Config {
        template: "no marker here".to_owned(),
        ..Config::default()
    };
    match Bundler::new(config) {
        Err(TwineError::Configuration(message)) => {
            assert!(message.contains("src"), "unexpected message: {message}");
        }
        other => panic!("expected Configuration error, got {other:?}"),
    }

    let config = Config {
        directive: String::new(),
        ..Config::default()
    };
    assert!(matches!(
        Bundler::new(config),
        Err(TwineError::Configuration(_))
    ));
}
