//! Integration tests over the fixture files
//!
//! `tests/fixtures/valid` must compile cleanly. Every file in `tests/fixtures/invalid` starts with an
//! `# expect: ...` line naming an SM code, `error`, or a fragment of the expected error message.

use std::fs;
use std::path::{Path, PathBuf};

use mapforge::{CompileOutput, SourceInput, compile};
use mapforge_runtime::Reflect;

#[derive(Debug, Clone, PartialEq, Default, mapforge_runtime::Reflect)]
#[reflect(namespace = "app::entities")]
struct User {
    name: String,
    username: String,
}

fn fixtures(dir: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(Path::new("tests/fixtures").join(dir))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "map"))
        .collect();
    files.sort();
    files
}

fn compile_file(path: &Path) -> CompileOutput {
    let source = fs::read_to_string(path).unwrap();
    compile(vec![SourceInput::new(path.display().to_string(), source)], vec![User::compiled_type()]).unwrap()
}

fn messages(output: &CompileOutput) -> Vec<String> {
    output
        .errors
        .iter()
        .map(|e| e.error.message.clone())
        .chain(output.diagnostics.iter().map(ToString::to_string))
        .collect()
}

#[test]
fn test_valid_fixtures() {
    let files = fixtures("valid");
    assert!(!files.is_empty());
    for path in files {
        let output = compile_file(&path);
        assert!(
            !output.has_errors(),
            "Expected {} to compile successfully, got: {:?}",
            path.display(),
            messages(&output)
        );
        let code = output.code.unwrap();
        assert!(syn::parse_file(&code).is_ok(), "{} produced unparsable Rust", path.display());
    }
}

#[test]
fn test_valid_fixtures_compile_together() {
    let inputs = fixtures("valid")
        .iter()
        .map(|path| SourceInput::new(path.display().to_string(), fs::read_to_string(path).unwrap()))
        .collect();
    let output = compile(inputs, vec![User::compiled_type()]).unwrap();
    assert!(!output.has_errors(), "{:?}", messages(&output));
    assert_eq!(output.plans.len(), 5);
    let code = output.code.unwrap();
    assert!(code.contains("pub mod cards"));
    assert!(code.contains("pub mod greetings"));
    assert!(code.contains("pub mod models"));
}

#[test]
fn test_invalid_fixtures() {
    let files = fixtures("invalid");
    assert!(!files.is_empty());
    for path in files {
        let source = fs::read_to_string(&path).unwrap();
        let expect = source
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("# expect: "))
            .unwrap_or_else(|| panic!("{} has no expectation line", path.display()))
            .to_string();
        let output = compile_file(&path);
        assert!(output.has_errors(), "Expected {} to fail", path.display());

        if expect.starts_with("SM") {
            let codes: Vec<&str> = output.diagnostics.iter().map(|d| d.code()).collect();
            assert_eq!(codes, vec![expect.as_str()], "{}", path.display());
            assert!(output.code.is_some(), "{}: diagnostics must not block emission", path.display());
        } else if expect != "error" {
            assert!(
                output.errors.iter().any(|e| e.error.message.contains(&expect)),
                "{}: expected '{}', got {:?}",
                path.display(),
                expect,
                messages(&output)
            );
        }
    }
}

#[test]
fn test_reports_render_with_codes() {
    let output = compile_file(Path::new("tests/fixtures/invalid/sm0003_source_in_condition.map"));
    let reports = output.reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.code().map(|c| c.to_string()).as_deref(), Some("SM0003"));
    assert!(
        report
            .to_string()
            .ends_with("only variables can access the source parameter 'user'"),
        "{report}"
    );
    assert!(report.source_code().is_some());
    assert_eq!(report.labels().map(|labels| labels.count()), Some(1));
}
