use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The four supported output formats, in declared build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured-data dump of the parsed book (JSON AST).
    Data,
    /// Print-ready document (PDF).
    Print,
    /// Single web page (HTML).
    Web,
    /// E-reader package (EPUB).
    Ereader,
}

impl OutputFormat {
    /// Declared build order for composite runs.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Data,
        OutputFormat::Print,
        OutputFormat::Web,
        OutputFormat::Ereader,
    ];

    /// Resolve a user-supplied format name. Conventional aliases for the
    /// concrete file type are accepted next to the canonical names.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "data" | "json" => Ok(OutputFormat::Data),
            "print" | "pdf" => Ok(OutputFormat::Print),
            "web" | "html" => Ok(OutputFormat::Web),
            "ereader" | "epub" => Ok(OutputFormat::Ereader),
            _ => Err(ConfigError::UnknownFormat(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Data => "data",
            OutputFormat::Print => "print",
            OutputFormat::Web => "web",
            OutputFormat::Ereader => "ereader",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::parse(s)
    }
}

/// Conversion parameters for one output format. Fixed at configuration time,
/// looked up by format name, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatProfile {
    /// Destination artifact path, relative to the project root.
    pub output: PathBuf,
    /// Conversion template. Absent for the structured-data dump, where the
    /// tool emits its native representation.
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// Content filters applied during conversion, in order.
    #[serde(default)]
    pub filters: Vec<PathBuf>,
    /// Metadata file passed to the conversion tool.
    pub metadata: PathBuf,
}

/// Intermediate-asset settings consumed by the web and e-reader builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Stylesheet entry point fed to the style compiler.
    pub style_entry: PathBuf,
    /// Compiled (minified) stylesheet artifact.
    pub style_output: PathBuf,
    /// Page template carrying the stylesheet link to be inlined.
    pub page_template: PathBuf,
    /// Template with the compiled stylesheet inlined; referenced by the web
    /// format profile.
    pub inlined_template: PathBuf,
    /// Script files concatenated into the bundle, in order.
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
    /// Bundled script artifact.
    pub script_bundle: PathBuf,
}

/// Preview server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    4000
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig { port: default_port() }
    }
}

/// The whole build configuration: constructed once at startup, immutable for
/// the lifetime of the process. All coordinator operations borrow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    /// Conversion tool program name or path.
    pub engine: String,
    /// Chapter source files. Order matters: it determines chapter order in
    /// every output.
    pub sources: Vec<PathBuf>,
    /// Output directory shared by all format builds.
    pub output_dir: PathBuf,
    /// Archive path produced by the packaging target.
    pub archive: PathBuf,
    /// Exactly one profile per supported format.
    pub profiles: BTreeMap<OutputFormat, FormatProfile>,
    pub assets: AssetConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

impl BookConfig {
    /// Look up the profile for a format. A missing profile is a configuration
    /// error and is reported before any process is spawned.
    pub fn profile(&self, format: OutputFormat) -> Result<&FormatProfile, ConfigError> {
        self.profiles
            .get(&format)
            .ok_or(ConfigError::MissingProfile(format))
    }

    pub fn trace_loaded(&self) {
        info!(
            engine = %self.engine,
            output_dir = %self.output_dir.display(),
            sources_count = self.sources.len(),
            profiles_count = self.profiles.len(),
            "Loaded BookConfig"
        );
        debug!(?self, "BookConfig loaded (full debug)");
    }
}

/// Errors detected before any external process is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested format name is not one of the supported formats.
    UnknownFormat(String),
    /// The format is supported but the configuration carries no profile for it.
    MissingProfile(OutputFormat),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownFormat(name) => {
                write!(
                    f,
                    "unknown output format {name:?} (expected one of: data, print, web, ereader)"
                )
            }
            ConfigError::MissingProfile(format) => {
                write!(f, "no format profile configured for {format}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
