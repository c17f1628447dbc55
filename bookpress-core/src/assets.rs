//! Auxiliary asset tasks feeding the web and e-reader builds: stylesheet
//! compilation, stylesheet inlining and script bundling.
//!
//! Each task is a read-transform-write step over paths declared in
//! [`AssetConfig`]. Failures are terminal for the invoking target and are
//! surfaced as [`AssetError`]; nothing is retried.

use std::fs;
use std::path::PathBuf;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use regex::{NoExpand, Regex};
use tracing::{error, info};

use crate::config::AssetConfig;

#[derive(Debug)]
pub enum AssetError {
    Io(std::io::Error),
    /// The stylesheet failed to parse, minify or print.
    Css(String),
    /// The page template carries no stylesheet link to replace.
    MissingStylesheetLink(PathBuf),
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "asset i/o error: {e}"),
            AssetError::Css(e) => write!(f, "stylesheet compilation failed: {e}"),
            AssetError::MissingStylesheetLink(path) => {
                write!(f, "no stylesheet <link> found in template {}", path.display())
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Compile and minify the stylesheet entry into the compiled css artifact.
pub fn compile_styles(assets: &AssetConfig) -> Result<(), AssetError> {
    info!(entry = %assets.style_entry.display(), "[ASSET] Compiling stylesheet");

    let source = fs::read_to_string(&assets.style_entry)?;
    let mut stylesheet = StyleSheet::parse(&source, ParserOptions::default())
        .map_err(|e| AssetError::Css(e.to_string()))?;
    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| AssetError::Css(e.to_string()))?;
    let output = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| AssetError::Css(e.to_string()))?;

    write_artifact(&assets.style_output, output.code.as_bytes())?;
    info!(output = %assets.style_output.display(), "[ASSET] Stylesheet compiled");
    Ok(())
}

/// Replace the stylesheet `<link>` in the page template with an inline
/// `<style>` block holding the compiled css, producing the template the web
/// format profile references.
pub fn inline_styles(assets: &AssetConfig) -> Result<(), AssetError> {
    info!(template = %assets.page_template.display(), "[ASSET] Inlining stylesheet into template");

    let template = fs::read_to_string(&assets.page_template)?;
    let css = fs::read_to_string(&assets.style_output)?;

    let link_tag = Regex::new(r#"<link[^>]*rel="stylesheet"[^>]*/?>"#)
        .map_err(|e| AssetError::Css(e.to_string()))?;
    if !link_tag.is_match(&template) {
        error!(template = %assets.page_template.display(), "[ASSET][ERROR] Template has no stylesheet link");
        return Err(AssetError::MissingStylesheetLink(assets.page_template.clone()));
    }

    let style_block = format!("<style>\n{css}\n</style>");
    let inlined = link_tag.replace(&template, NoExpand(&style_block));

    write_artifact(&assets.inlined_template, inlined.as_bytes())?;
    info!(output = %assets.inlined_template.display(), "[ASSET] Template inlined");
    Ok(())
}

/// Concatenate the configured script files, in declared order, into the
/// bundle artifact.
pub fn bundle_scripts(assets: &AssetConfig) -> Result<(), AssetError> {
    info!(scripts = assets.scripts.len(), "[ASSET] Bundling scripts");

    let mut bundle = String::new();
    for script in &assets.scripts {
        let source = fs::read_to_string(script)?;
        bundle.push_str(&source);
        if !source.ends_with('\n') {
            bundle.push('\n');
        }
    }

    write_artifact(&assets.script_bundle, bundle.as_bytes())?;
    info!(output = %assets.script_bundle.display(), "[ASSET] Scripts bundled");
    Ok(())
}

fn write_artifact(path: &std::path::Path, contents: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)
}
