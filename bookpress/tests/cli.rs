use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Creates a project directory with a complete config file. The engine is
/// substituted so tests never need the real conversion tool installed.
fn create_project(engine: &str) -> TempDir {
    let dir = TempDir::new().expect("Creating temp project dir failed");
    let config = format!(
        r#"engine: {engine}
sources:
  - src/pages/01-intro.md
  - src/pages/02-selecting.md
output_dir: {root}/dist
archive: {root}/dist/book.zip
profiles:
  data:
    output: {root}/dist/book.json
    metadata: src/meta/metadata.yaml
  print:
    output: {root}/dist/book.pdf
    template: src/templates/template.tex
    filters:
      - src/filters/callouts.py
    metadata: src/meta/pdf.yaml
  web:
    output: {root}/dist/index.html
    template: {root}/build/template.html
    metadata: src/meta/html.yaml
  ereader:
    output: {root}/dist/book.epub
    template: src/templates/template.epub.html
    metadata: src/meta/epub.yaml
assets:
  style_entry: src/css/book.css
  style_output: {root}/build/book.css
  page_template: src/templates/template.html
  inlined_template: {root}/build/template.html
  scripts:
    - src/js/toc.js
  script_bundle: {root}/dist/js/book.js
"#,
        root = dir.path().display()
    );
    fs::write(dir.path().join("book.yml"), config).expect("Writing temp config failed");
    dir
}

fn bookpress() -> Command {
    Command::cargo_bin("bookpress").expect("Binary exists")
}

#[test]
fn help_lists_the_build_targets() {
    bookpress()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("build")
                .and(predicate::str::contains("package"))
                .and(predicate::str::contains("serve")),
        );
}

#[test]
fn unknown_format_is_rejected_before_any_spawn() {
    let project = create_project("definitely-not-a-real-conversion-tool");

    bookpress()
        .arg("build")
        .arg("docx")
        .arg("--config")
        .arg(project.path().join("book.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown output format"));
}

#[test]
fn build_succeeds_when_the_tool_exits_zero() {
    // `true` ignores its arguments and exits 0, standing in for a clean
    // conversion run.
    let project = create_project("true");

    bookpress()
        .arg("build")
        .arg("print")
        .arg("--config")
        .arg(project.path().join("book.yml"))
        .assert()
        .success();
}

#[test]
fn build_fails_when_the_tool_exits_nonzero() {
    let project = create_project("false");

    bookpress()
        .arg("build")
        .arg("print")
        .arg("--config")
        .arg(project.path().join("book.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited with status 1"));
}

#[test]
fn composite_build_fails_fast_with_a_failing_tool() {
    let project = create_project("false");

    bookpress()
        .arg("all")
        .arg("--config")
        .arg(project.path().join("book.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited with status 1"));
}

#[test]
fn missing_config_file_is_a_clear_error() {
    bookpress()
        .arg("build")
        .arg("web")
        .arg("--config")
        .arg("does-not-exist.yml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn clean_removes_the_output_directory_and_is_idempotent() {
    let project = create_project("true");
    let dist = project.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    fs::write(dist.join("index.html"), "<html></html>").unwrap();

    bookpress()
        .arg("clean")
        .arg("--config")
        .arg(project.path().join("book.yml"))
        .assert()
        .success();
    assert!(!dist.exists(), "output directory must be removed");

    // Cleaning an already-clean tree still succeeds.
    bookpress()
        .arg("clean")
        .arg("--config")
        .arg(project.path().join("book.yml"))
        .assert()
        .success();
}
