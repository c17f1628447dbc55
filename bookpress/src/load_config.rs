/// `load_config` module: Loads and adapts a static YAML config—including environment overrides—into the internal BookConfig.
///
/// This module is the only place where untrusted YAML is parsed and mapped to rich, strongly-typed internal structs.
///
/// # Responsibilities
/// - Parse user-supplied YAML configuration files into type-safe Rust structs
/// - Map loosely-typed YAML keys (string format names) to the [`OutputFormat`] enum,
///   rejecting unknown format names before anything else runs
/// - Inject environment overrides (the `BOOKPRESS_PANDOC` conversion-tool path) as needed
/// - Ensure robust error messages for CLI and tests: any failure in loading must result in clear diagnostics.
/// - Acts as the adapter layer decoupling input schemas from the domain core
///
/// # Extension Guidance
/// - To add a new config key:
///   1. Extend the intermediate (YAML-side) structs below
///   2. Add conversion logic mapping from YAML types to core models
///   3. Carefully validate that new config fields are surfaced to the BookConfig
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics, and are surfaced at the CLI boundary.
///
/// For the accepted YAML schema, see the README.
///
/// ---
///
/// Internal implementation begins below.
///
use anyhow::Result;
use bookpress_core::config::{AssetConfig, BookConfig, FormatProfile, OutputFormat, ServeConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_engine")]
    engine: String,
    sources: Vec<PathBuf>,
    output_dir: PathBuf,
    #[serde(default)]
    archive: Option<PathBuf>,
    profiles: BTreeMap<String, FormatProfile>,
    assets: AssetConfig,
    #[serde(default)]
    serve: ServeConfig,
}

fn default_engine() -> String {
    "pandoc".to_string()
}

/// Loads a static YAML config file and applies environment overrides.
/// Returns the immutable [`BookConfig`] used by every command.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BookConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    // Map string format names to the closed enum. An unknown name in the
    // profiles table is a configuration error, reported here and never later.
    let mut profiles = BTreeMap::new();
    for (name, profile) in raw.profiles {
        let format = OutputFormat::parse(&name)
            .map_err(|e| anyhow::anyhow!("Invalid profile key in config: {e}"))?;
        profiles.insert(format, profile);
    }
    for format in OutputFormat::ALL {
        if !profiles.contains_key(&format) {
            warn!(%format, "Config declares no profile for format; builds of it will fail");
        }
    }

    // Environment override for the conversion tool, so CI and tests can pin
    // a specific binary without editing the config file.
    let engine = match std::env::var("BOOKPRESS_PANDOC") {
        Ok(path) if !path.is_empty() => {
            info!(engine = %path, "Conversion tool overridden from BOOKPRESS_PANDOC");
            path
        }
        _ => raw.engine,
    };

    let archive = raw
        .archive
        .unwrap_or_else(|| raw.output_dir.join("book.zip"));

    Ok(BookConfig {
        engine,
        sources: raw.sources,
        output_dir: raw.output_dir,
        archive,
        profiles,
        assets: raw.assets,
        serve: raw.serve,
    })
}
