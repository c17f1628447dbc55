use std::fs;
use std::path::PathBuf;

use bookpress_core::assets::{bundle_scripts, compile_styles, inline_styles, AssetError};
use bookpress_core::config::AssetConfig;
use tempfile::tempdir;

fn assets_in(root: &std::path::Path) -> AssetConfig {
    AssetConfig {
        style_entry: root.join("src/css/book.css"),
        style_output: root.join("build/book.css"),
        page_template: root.join("src/templates/template.html"),
        inlined_template: root.join("build/template.html"),
        scripts: vec![root.join("src/js/nav.js"), root.join("src/js/toc.js")],
        script_bundle: root.join("dist/js/book.js"),
    }
}

#[test]
fn compile_styles_minifies_into_the_artifact() {
    let dir = tempdir().unwrap();
    let assets = assets_in(dir.path());

    fs::create_dir_all(assets.style_entry.parent().unwrap()).unwrap();
    fs::write(
        &assets.style_entry,
        "body {\n  color: #ff0000;\n  margin: 0px;\n}\n",
    )
    .unwrap();

    compile_styles(&assets).expect("compilation should succeed");

    let compiled = fs::read_to_string(&assets.style_output).unwrap();
    assert!(compiled.contains("body"), "selector survives: {compiled}");
    assert!(
        !compiled.contains("\n  "),
        "artifact should be minified: {compiled}"
    );
}

#[test]
fn compile_styles_surfaces_parse_failures() {
    let dir = tempdir().unwrap();
    let assets = assets_in(dir.path());

    fs::create_dir_all(assets.style_entry.parent().unwrap()).unwrap();
    fs::write(&assets.style_entry, "body { color }").unwrap();

    match compile_styles(&assets) {
        Err(AssetError::Css(_)) => {}
        other => panic!("expected Css error, got {other:?}"),
    }
}

#[test]
fn inline_styles_replaces_the_stylesheet_link() {
    let dir = tempdir().unwrap();
    let assets = assets_in(dir.path());

    fs::create_dir_all(assets.page_template.parent().unwrap()).unwrap();
    fs::create_dir_all(assets.style_output.parent().unwrap()).unwrap();
    fs::write(
        &assets.page_template,
        "<html><head><link rel=\"stylesheet\" href=\"book.css\"></head><body>$body$</body></html>",
    )
    .unwrap();
    fs::write(&assets.style_output, "body{color:red}").unwrap();

    inline_styles(&assets).expect("inlining should succeed");

    let inlined = fs::read_to_string(&assets.inlined_template).unwrap();
    assert!(inlined.contains("<style>"), "style block expected: {inlined}");
    assert!(inlined.contains("body{color:red}"), "css body expected");
    assert!(!inlined.contains("<link"), "link tag must be gone");
    assert!(
        inlined.contains("$body$"),
        "the rest of the template must be untouched"
    );
}

#[test]
fn inline_styles_fails_loudly_without_a_link() {
    let dir = tempdir().unwrap();
    let assets = assets_in(dir.path());

    fs::create_dir_all(assets.page_template.parent().unwrap()).unwrap();
    fs::create_dir_all(assets.style_output.parent().unwrap()).unwrap();
    fs::write(&assets.page_template, "<html><head></head></html>").unwrap();
    fs::write(&assets.style_output, "body{}").unwrap();

    match inline_styles(&assets) {
        Err(AssetError::MissingStylesheetLink(path)) => {
            assert_eq!(path, assets.page_template)
        }
        other => panic!("expected MissingStylesheetLink, got {other:?}"),
    }
}

#[test]
fn bundle_scripts_concatenates_in_declared_order() {
    let dir = tempdir().unwrap();
    let assets = assets_in(dir.path());

    fs::create_dir_all(dir.path().join("src/js")).unwrap();
    fs::write(&assets.scripts[0], "function nav() {}\n").unwrap();
    fs::write(&assets.scripts[1], "function toc() {}").unwrap();

    bundle_scripts(&assets).expect("bundling should succeed");

    let bundle = fs::read_to_string(&assets.script_bundle).unwrap();
    let nav = bundle.find("function nav").expect("first script present");
    let toc = bundle.find("function toc").expect("second script present");
    assert!(nav < toc, "scripts must keep their declared order");
    assert!(bundle.ends_with('\n'), "bundle ends with a newline");
}

#[test]
fn bundle_scripts_propagates_missing_sources() {
    let dir = tempdir().unwrap();
    let mut assets = assets_in(dir.path());
    assets.scripts = vec![PathBuf::from(dir.path().join("src/js/missing.js"))];

    match bundle_scripts(&assets) {
        Err(AssetError::Io(_)) => {}
        other => panic!("expected Io error, got {other:?}"),
    }
}
