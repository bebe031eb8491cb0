mod common;

use common::*;

fn run(args: &[&str]) -> (i32, String, String) {
    let output = throwcheck().args(args).output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn clean_file_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "clean.cc", &in_fn("[[maybe_unhandled]] foo();\nbar();"));
    let (code, stdout, _) = run(&["check", path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn short_format_lists_findings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("foo();\n[[maybe_unhandled]] bar();"));
    let name = path.to_str().unwrap();
    let (code, stdout, _) = run(&["check", name, "--format", "short"]);
    assert_eq!(code, 1);
    assert_eq!(
        stdout,
        format!(
            "{name}:6:1: stmt-missing-annotation: statement may throw, add '[[maybe_unhandled]]'\n\
             {name}:7:1: stmt-superfluous-annotation: statement cannot throw, remove '[[maybe_unhandled]]'\n"
        )
    );
}

#[test]
fn human_format_renders_reports_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("int x = get();"));
    let (code, stdout, stderr) = run(&["check", path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stdout.contains("decl-missing-annotation"), "{stdout}");
    assert!(stdout.contains("declaration may throw"));
    assert!(stderr.contains("1 diagnostic(s) in 1 file(s)"), "{stderr}");
}

#[test]
fn json_format_is_one_array() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_source(dir.path(), "a.cc", &in_fn("foo();"));
    let b = write_source(dir.path(), "b.cc", &in_fn("int x = get();"));
    let (code, stdout, _) = run(&["check", a.to_str().unwrap(), b.to_str().unwrap(), "--format", "json"]);
    assert_eq!(code, 1);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["file"], a.to_str().unwrap());
    assert_eq!(entries[0]["category"], "stmt-missing-annotation");
    assert_eq!(entries[0]["line"], 6);
    assert_eq!(entries[0]["column"], 1);
    assert_eq!(entries[1]["file"], b.to_str().unwrap());
    assert_eq!(entries[1]["category"], "decl-missing-annotation");
    assert_eq!(entries[1]["column"], 1);
}

#[test]
fn json_format_without_findings_is_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("bar();"));
    let (code, stdout, _) = run(&["check", path.to_str().unwrap(), "--format", "json"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "[]");
}

#[test]
fn front_end_error_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_source(dir.path(), "bad.cc", "void test() { nope(); }\n");
    let good = write_source(dir.path(), "good.cc", &in_fn("foo();"));
    let (code, stdout, stderr) =
        run(&["check", bad.to_str().unwrap(), good.to_str().unwrap(), "--format", "short"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("unknown function 'nope'"), "{stderr}");
    // Other inputs are still checked.
    assert!(stdout.contains("good.cc:6:1: stmt-missing-annotation"), "{stdout}");
}

#[test]
fn missing_file_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.cc");
    let (code, _, stderr) = run(&["check", path.to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("failed to read source"), "{stderr}");
}

#[test]
fn coverage_flag_switches_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("[[maybe_unhandled]] if (get()) { foo(); }"));
    let name = path.to_str().unwrap();
    assert_eq!(run(&["check", name, "--format", "short"]).0, 0);
    let (code, stdout, _) = run(&["check", name, "--format", "short", "--coverage", "header-only"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("stmt-missing-annotation"));
}

#[test]
fn config_file_is_discovered_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("throwcheck.toml"), "[check]\nmarker = \"acme::may_throw\"\n").unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("[[acme::may_throw]] foo();"));
    let (code, stdout, _) = run(&["check", path.to_str().unwrap(), "--format", "short"]);
    assert_eq!(code, 0, "{stdout}");
}

#[test]
fn marker_flag_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("throwcheck.toml"), "[check]\nmarker = \"acme::may_throw\"\n").unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("[[maybe_unhandled]] foo();"));
    let name = path.to_str().unwrap();
    assert_eq!(run(&["check", name, "--format", "short"]).0, 1);
    assert_eq!(run(&["check", name, "--format", "short", "--marker", "maybe_unhandled"]).0, 0);
}

#[test]
fn explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[check]\nstatements = false\n").unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("foo();"));
    let (code, _, _) = run(&["check", path.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert_eq!(code, 0);
}

#[test]
fn invalid_configuration_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("throwcheck.toml"), "[check]\nseverity = 3\n").unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("foo();"));
    let (code, _, stderr) = run(&["check", path.to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("error[config]"), "{stderr}");
}

#[test]
fn invalid_marker_flag_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("foo();"));
    let (code, _, stderr) = run(&["check", path.to_str().unwrap(), "--marker", "a::b::c"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("invalid marker"), "{stderr}");
}

#[test]
fn tree_subcommand_dumps_verdicts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "a.cc", &in_fn("foo();"));
    let (code, stdout, _) = run(&["tree", path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("define fn test/0 may-throw"), "{stdout}");
    assert!(stdout.contains("expr throws -> stmt-missing-annotation"));
}

#[test]
fn deeply_nested_input_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let n = 10_000;
    let path = write_source(dir.path(), "deep.cc", &in_fn(&format!("{}foo(){};", "(".repeat(n), ")".repeat(n))));
    let (code, _, stderr) = run(&["check", path.to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("expression nested too deeply"), "{stderr}");
}
