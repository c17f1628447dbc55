use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use bookpress_core::config::{AssetConfig, BookConfig, ServeConfig};
use bookpress_core::package::package;
use tempfile::tempdir;

fn config_in(root: &std::path::Path) -> BookConfig {
    BookConfig {
        engine: "pandoc".to_string(),
        sources: vec![PathBuf::from("src/pages/01-intro.md")],
        output_dir: root.join("dist"),
        archive: root.join("dist/book.zip"),
        profiles: BTreeMap::new(),
        assets: AssetConfig {
            style_entry: PathBuf::from("src/css/book.css"),
            style_output: PathBuf::from("build/book.css"),
            page_template: PathBuf::from("src/templates/template.html"),
            inlined_template: PathBuf::from("build/template.html"),
            scripts: vec![],
            script_bundle: root.join("dist/js/book.js"),
        },
        serve: ServeConfig::default(),
    }
}

#[test]
fn package_bundles_every_output_file() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    fs::create_dir_all(config.output_dir.join("js")).unwrap();
    fs::write(config.output_dir.join("index.html"), "<html></html>").unwrap();
    fs::write(config.output_dir.join("book.pdf"), "%PDF-1.5 fake").unwrap();
    fs::write(config.output_dir.join("js/book.js"), "function toc() {}").unwrap();

    let report = package(&config).expect("packaging should succeed");
    assert_eq!(report.files, 3);
    assert!(config.archive.exists(), "archive must be written");

    let mut archive = zip::ZipArchive::new(fs::File::open(&config.archive).unwrap()).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["book.pdf", "index.html", "js/book.js"]);

    let mut contents = String::new();
    archive
        .by_name("index.html")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "<html></html>");
}

#[test]
fn package_writes_a_checksum_sidecar() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    fs::create_dir_all(&config.output_dir).unwrap();
    fs::write(config.output_dir.join("index.html"), "<html></html>").unwrap();

    let report = package(&config).expect("packaging should succeed");

    let sidecar = dir.path().join("dist/book.zip.sha256");
    let line = fs::read_to_string(&sidecar).expect("sidecar must be written");
    assert!(line.starts_with(&report.checksum));
    assert_eq!(report.checksum.len(), 64, "sha-256 hex digest expected");
    assert!(line.contains("book.zip"));
}

#[test]
fn repackaging_excludes_the_previous_archive() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    fs::create_dir_all(&config.output_dir).unwrap();
    fs::write(config.output_dir.join("index.html"), "<html></html>").unwrap();

    package(&config).expect("first packaging should succeed");
    let report = package(&config).expect("second packaging should succeed");

    assert_eq!(report.files, 1, "previous archive and sidecar are excluded");
    let mut archive = zip::ZipArchive::new(fs::File::open(&config.archive).unwrap()).unwrap();
    assert!(archive.by_name("book.zip").is_err());
    assert!(archive.by_name("book.zip.sha256").is_err());
}
