//! Build coordinator: turns a format request into one conversion-tool
//! invocation and reports its outcome.
//!
//! This module provides the top-level orchestration for building the book.
//! It implements a coordinated pipeline that:
//!   - Resolves the [`FormatProfile`] for the requested format (rejecting
//!     unknown or unprofiled formats before anything is spawned)
//!   - Composes a single external-tool invocation from the ordered chapter
//!     sources, the fixed global flags and the profile's output, template,
//!     filters and metadata
//!   - Runs that invocation through a [`DocumentEngine`] exactly once
//!   - Aggregates per-format outcomes into a [`BuildReport`] for composite runs
//!
//! # Responsibilities
//! - Fail-fast orchestration: in a composite run, the first failing format
//!   aborts the remaining ones (they are never spawned)
//! - Invokes logging throughout for traceability (see tracing events)
//! - Performs no file I/O itself: writing output artifacts is delegated
//!   entirely to the conversion tool
//!
//! # Error Handling
//! Unknown formats and missing profiles surface as [`BuildError::Config`]
//! without a spawn; spawn failures and non-zero exits surface as
//! [`BuildError::Engine`] carrying the underlying [`EngineError`]. No step is
//! retried.
//!
//! # Navigation
//! - Single build: [`build`]
//! - Composite build: [`build_all`]
//! - Pure flag composition: [`compose_invocation`]

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::{BookConfig, OutputFormat};
use crate::contract::{DocumentEngine, EngineError, Invocation};

/// Fixed flags applied to every format build: smart typography on the reader
/// side, standalone self-contained output, section numbering, a table of
/// contents and citation processing.
const GLOBAL_FLAGS: [&str; 7] = [
    "--from",
    "markdown+smart",
    "--standalone",
    "--self-contained",
    "--number-sections",
    "--table-of-contents",
    "--citeproc",
];

/// Outcome of one successful format build.
#[derive(Debug, Clone, Serialize)]
pub struct FormatReport {
    pub format: OutputFormat,
    pub output: std::path::PathBuf,
}

/// Outcome of a composite run: the formats that completed, in build order.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub formats: Vec<FormatReport>,
}

#[derive(Debug)]
pub enum BuildError {
    /// Rejected before any process was spawned.
    Config(crate::config::ConfigError),
    /// The conversion tool failed to start or exited with failure.
    Engine(EngineError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "configuration error: {e}"),
            BuildError::Engine(e) => write!(f, "build failed: {e}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Config(e) => Some(e),
            BuildError::Engine(e) => Some(e),
        }
    }
}

impl From<crate::config::ConfigError> for BuildError {
    fn from(e: crate::config::ConfigError) -> Self {
        BuildError::Config(e)
    }
}

impl From<EngineError> for BuildError {
    fn from(e: EngineError) -> Self {
        BuildError::Engine(e)
    }
}

/// Compose the conversion-tool command line for one format.
///
/// Pure and deterministic: the result depends only on the configuration and
/// the format, and composing it spawns nothing. Argument order is fixed:
/// chapter sources first (their order determines chapter order in the
/// output), then the global flags, then the profile's output path, template,
/// filters and metadata file.
pub fn compose_invocation(
    config: &BookConfig,
    format: OutputFormat,
) -> Result<Invocation, BuildError> {
    let profile = config.profile(format)?;

    let mut invocation = Invocation::new(&config.engine);
    for source in &config.sources {
        invocation.arg(source.display().to_string());
    }
    for flag in GLOBAL_FLAGS {
        invocation.arg(flag);
    }
    invocation.arg("--output");
    invocation.arg(profile.output.display().to_string());
    if let Some(template) = &profile.template {
        invocation.arg("--template");
        invocation.arg(template.display().to_string());
    }
    for filter in &profile.filters {
        invocation.arg("--filter");
        invocation.arg(filter.display().to_string());
    }
    invocation.arg("--metadata-file");
    invocation.arg(profile.metadata.display().to_string());

    Ok(invocation)
}

/// Build one output format: resolve its profile, compose the invocation and
/// run the engine exactly once. Resolves exactly once, successfully on exit 0
/// and as a failure otherwise. Not retried.
pub async fn build<E>(
    config: &BookConfig,
    engine: &E,
    format: OutputFormat,
) -> Result<FormatReport, BuildError>
where
    E: DocumentEngine + ?Sized,
{
    let invocation = compose_invocation(config, format)?;
    let profile = config.profile(format)?;

    info!(%format, output = %profile.output.display(), "[BUILD] Starting format build");
    debug!(command = %invocation, "[BUILD] Composed invocation");

    match engine.run(&invocation).await {
        Ok(()) => {
            let report = FormatReport {
                format,
                output: profile.output.clone(),
            };
            info!(%format, output = %report.output.display(), "[BUILD] Format build succeeded");
            Ok(report)
        }
        Err(e) => {
            error!(%format, error = %e, "[BUILD][ERROR] Format build failed");
            Err(BuildError::Engine(e))
        }
    }
}

/// Build every format in declared order, stopping at the first failure.
///
/// Formats after a failing one are never composed or spawned. The returned
/// error is the failing format's error; callers that need the partial
/// progress can reconstruct it from the logs.
pub async fn build_all<E>(config: &BookConfig, engine: &E) -> Result<BuildReport, BuildError>
where
    E: DocumentEngine + ?Sized,
{
    info!(formats = OutputFormat::ALL.len(), "[BUILD] Starting composite build");

    let mut formats = Vec::new();
    for format in OutputFormat::ALL {
        match build(config, engine, format).await {
            Ok(report) => formats.push(report),
            Err(e) => {
                error!(
                    %format,
                    completed = formats.len(),
                    "[BUILD][ERROR] Composite build aborted at first failure"
                );
                return Err(e);
            }
        }
    }

    let report = BuildReport { formats };
    info!(completed = report.formats.len(), "[BUILD] Composite build succeeded");
    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!(json = %json, "[BUILD][DEBUG] Composite report as JSON"),
        Err(e) => error!(error = ?e, "[BUILD][DEBUG] Failed to serialize composite report"),
    }
    Ok(report)
}

/// Remove the shared output directory. Missing directory is not an error:
/// cleaning an already-clean tree succeeds.
pub fn clean(config: &BookConfig) -> Result<(), std::io::Error> {
    if config.output_dir.exists() {
        info!(output_dir = %config.output_dir.display(), "[BUILD] Removing output directory");
        std::fs::remove_dir_all(&config.output_dir)?;
    }
    Ok(())
}
