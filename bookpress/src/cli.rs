///
/// This module implements the full CLI interface for bookpress—handling command
/// parsing, argument validation, main entrypoints, and user-visible invocations.
///
/// All core build logic (configuration model, invocation composition, asset
/// tasks, watching, packaging) lives in the [`bookpress-core`] crate. This
/// module is strictly for CLI glue, ergonomic argument exposure, and
/// orchestration.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands (see below).
/// - Subcommand routing (`build`, `all`, `package`, `serve`, `clean`) and
///   argument validation: format names are resolved before anything is spawned.
/// - Async entrypoint (`run`) for programmatic invocation and integration testing.
/// - Logging, tracing, and structured error output at CLI level.
///
/// ## How To Use
/// - For command-line users: use the installed `bookpress` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// ## Extending
/// When adding features or subcommands, update [`Commands`] below
/// and keep all non-trivial build logic inside `bookpress-core`.
///
/// ---
///
/// See crate root docs and [`bookpress-core`] for overall architecture.
///
/// ---
///
/// [`bookpress-core`]: ../../bookpress-core/
/// [`Cli`]: struct.Cli.html
/// [`run`]: fn.run.html
/// [`Commands`]: enum.Commands.html
use crate::load_config::load_config;
use anyhow::Result;
use bookpress_core::assets;
use bookpress_core::build::{build, build_all, clean};
use bookpress_core::config::OutputFormat;
use bookpress_core::engine::PandocEngine;
use bookpress_core::package;
use bookpress_core::serve;
use bookpress_core::watch;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for bookpress: build a Markdown book into its publishable formats.
#[derive(Parser)]
#[clap(
    name = "bookpress",
    version,
    about = "Build a Markdown book into data, print, web and e-reader outputs with pandoc"
)]
pub struct Cli {
    /// Path to the YAML build configuration file
    #[clap(long, global = true, default_value = "book.yml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a single output format: data, print, web or ereader
    Build {
        /// Output format name (aliases: json, pdf, html, epub)
        format: String,
    },
    /// Build every format in declared order, stopping at the first failure
    All,
    /// Build every format, then bundle the output directory into an archive
    Package,
    /// Build the web output, serve it locally and rebuild on change
    Serve {
        /// Port for the preview server (overrides the configured port)
        #[clap(long)]
        port: Option<u16>,
    },
    /// Remove the output directory
    Clean,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config)?;
    config.trace_loaded();
    let engine = PandocEngine::new();

    match cli.command {
        Commands::Build { format } => {
            // Resolve the format name first: an unknown name must fail
            // before any directory is touched or process spawned.
            let format = OutputFormat::parse(&format)?;
            tracing::info!(command = "build", %format, "Starting format build");
            ensure_output_dir(&config)?;
            let report = build(&config, &engine, format).await?;
            tracing::info!(command = "build", ?report, "Build complete");
        }
        Commands::All => {
            tracing::info!(command = "all", "Starting composite build");
            ensure_output_dir(&config)?;
            let report = build_all(&config, &engine).await?;
            tracing::info!(command = "all", ?report, "Composite build complete");
        }
        Commands::Package => {
            tracing::info!(command = "package", "Starting composite build and packaging");
            ensure_output_dir(&config)?;
            let report = build_all(&config, &engine).await?;
            tracing::info!(command = "package", ?report, "Composite build complete");
            let package_report = package::package(&config)?;
            tracing::info!(command = "package", report = ?package_report, "Packaging complete");
        }
        Commands::Serve { port } => {
            tracing::info!(command = "serve", "Preparing assets and initial web build");
            ensure_output_dir(&config)?;
            assets::compile_styles(&config.assets)?;
            assets::inline_styles(&config.assets)?;
            assets::bundle_scripts(&config.assets)?;
            build(&config, &engine, OutputFormat::Web).await?;

            let port = port.unwrap_or(config.serve.port);
            let root = config.output_dir.clone();
            tokio::spawn(async move {
                if let Err(e) = serve::serve(root, port).await {
                    tracing::error!(error = %e, "[SERVE][ERROR] Preview server failed");
                }
            });

            watch::watch(&config, &engine).await?;
        }
        Commands::Clean => {
            clean(&config)?;
            tracing::info!(command = "clean", "Output directory removed");
        }
    }

    Ok(())
}

/// The conversion tool writes artifacts but does not create directories;
/// make sure the output directory exists before any build.
fn ensure_output_dir(config: &bookpress_core::config::BookConfig) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    Ok(())
}
