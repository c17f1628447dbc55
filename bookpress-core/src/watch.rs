//! File-watch re-trigger loop for interactive preview.
//!
//! A single recommended watcher observes the source roots and routes change
//! events to per-concern groups, each with a declared task sequence (compile,
//! inline, bundle, rebuild). Classification ([`classify`]) and the per-group
//! sequences ([`WatchGroup::sequence`]) are pure so they can be tested
//! without a filesystem.
//!
//! # Overlap policy
//! Events arriving while a task sequence runs queue in the channel and are
//! coalesced into at most one follow-up run per group once the current run
//! completes. Sequences never run concurrently, so output writes cannot race.
//!
//! # Error Handling
//! A failing sequence is logged and the loop keeps watching; a broken watcher
//! channel ends the loop.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{error, info};

use crate::assets;
use crate::build;
use crate::config::{BookConfig, OutputFormat};
use crate::contract::DocumentEngine;

/// Quiet period after the first event before a run is triggered; further
/// events inside the window are folded into the same run.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Source-file concerns, each with its own re-trigger task sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WatchGroup {
    Styles,
    Scripts,
    Pages,
    Templates,
    Metadata,
}

/// One step of a group's declared task sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CompileStyles,
    InlineStyles,
    BundleScripts,
    Rebuild(OutputFormat),
}

impl WatchGroup {
    /// The declared task sequence for this group. The preview loop only
    /// rebuilds the web format; print and e-reader builds are on-demand.
    pub const fn sequence(self) -> &'static [Step] {
        match self {
            WatchGroup::Styles => &[
                Step::CompileStyles,
                Step::InlineStyles,
                Step::Rebuild(OutputFormat::Web),
            ],
            WatchGroup::Scripts => &[Step::BundleScripts, Step::Rebuild(OutputFormat::Web)],
            WatchGroup::Pages => &[Step::Rebuild(OutputFormat::Web)],
            WatchGroup::Templates => &[Step::InlineStyles, Step::Rebuild(OutputFormat::Web)],
            WatchGroup::Metadata => &[Step::Rebuild(OutputFormat::Web)],
        }
    }
}

#[derive(Debug)]
pub enum WatchError {
    Notify(notify::Error),
    Asset(assets::AssetError),
    Build(build::BuildError),
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::Notify(e)
    }
}

impl From<assets::AssetError> for WatchError {
    fn from(e: assets::AssetError) -> Self {
        WatchError::Asset(e)
    }
}

impl From<build::BuildError> for WatchError {
    fn from(e: build::BuildError) -> Self {
        WatchError::Build(e)
    }
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::Notify(e) => write!(f, "file watcher error: {e}"),
            WatchError::Asset(e) => write!(f, "{e}"),
            WatchError::Build(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for WatchError {}

/// Classify a changed path into its watch group.
///
/// Templates are only recognized under a `templates` directory so that
/// generated HTML output never classifies as a template change.
pub fn classify(path: &Path) -> Option<WatchGroup> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;
    let under_templates = path
        .components()
        .any(|c| c.as_os_str() == "templates");

    match extension.as_str() {
        "css" | "less" | "scss" => Some(WatchGroup::Styles),
        "js" => Some(WatchGroup::Scripts),
        "md" | "markdown" => Some(WatchGroup::Pages),
        "html" | "tex" if under_templates => Some(WatchGroup::Templates),
        "yaml" | "yml" => Some(WatchGroup::Metadata),
        _ => None,
    }
}

/// Whether a path is one of our own build artifacts. Artifact events must not
/// re-trigger builds or the loop would feed itself.
pub fn is_generated(config: &BookConfig, path: &Path) -> bool {
    let artifacts = [
        &config.assets.style_output,
        &config.assets.inlined_template,
        &config.assets.script_bundle,
    ];
    if artifacts.iter().any(|artifact| path.ends_with(artifact)) {
        return true;
    }
    path.ancestors().any(|dir| dir.ends_with(&config.output_dir))
}

/// Directories to watch: the parents of every configured source, template,
/// stylesheet, script, filter and metadata file.
pub fn watch_roots(config: &BookConfig) -> BTreeSet<PathBuf> {
    let mut files: Vec<&PathBuf> = Vec::new();
    files.extend(config.sources.iter());
    files.push(&config.assets.style_entry);
    files.push(&config.assets.page_template);
    files.extend(config.assets.scripts.iter());
    for profile in config.profiles.values() {
        files.extend(profile.template.iter());
        files.extend(profile.filters.iter());
        files.push(&profile.metadata);
    }

    files
        .into_iter()
        .filter_map(|file| file.parent())
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect()
}

/// Fold a batch of changed paths into the set of triggered groups, dropping
/// generated artifacts and unclassifiable paths.
pub fn groups_for_paths(config: &BookConfig, paths: &[PathBuf]) -> BTreeSet<WatchGroup> {
    paths
        .iter()
        .filter(|path| !is_generated(config, path))
        .filter_map(|path| classify(path))
        .collect()
}

/// Run one group's declared task sequence, in order, stopping at the first
/// failing step.
pub async fn run_sequence<E>(
    config: &BookConfig,
    engine: &E,
    group: WatchGroup,
) -> Result<(), WatchError>
where
    E: DocumentEngine + ?Sized,
{
    for step in group.sequence() {
        match step {
            Step::CompileStyles => assets::compile_styles(&config.assets)?,
            Step::InlineStyles => assets::inline_styles(&config.assets)?,
            Step::BundleScripts => assets::bundle_scripts(&config.assets)?,
            Step::Rebuild(format) => {
                build::build(config, engine, *format).await?;
            }
        }
    }
    Ok(())
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Watch the source roots and re-run the triggered group sequences on change,
/// until the watcher channel closes.
pub async fn watch<E>(config: &BookConfig, engine: &E) -> Result<(), WatchError>
where
    E: DocumentEngine + ?Sized,
{
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        if let Ok(event) = result {
            let _ = tx.send(event);
        }
    })?;

    let mut watched = 0usize;
    for root in watch_roots(config) {
        if root.exists() {
            watcher.watch(&root, RecursiveMode::Recursive)?;
            watched += 1;
        }
    }
    info!(roots = watched, "[WATCH] Watching for changes");

    while let Some(event) = rx.recv().await {
        let mut paths: Vec<PathBuf> = Vec::new();
        if is_relevant(&event.kind) {
            paths.extend(event.paths);
        }

        // Drain until the channel stays quiet for the debounce window, so a
        // burst of events (editor save, compile output) becomes one run.
        let mut channel_closed = false;
        loop {
            match tokio::time::timeout(DEBOUNCE_WINDOW, rx.recv()).await {
                Ok(Some(event)) => {
                    if is_relevant(&event.kind) {
                        paths.extend(event.paths);
                    }
                }
                Ok(None) => {
                    channel_closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let groups = groups_for_paths(config, &paths);
        for group in &groups {
            info!(?group, "[WATCH] Change detected, running task sequence");
            if let Err(e) = run_sequence(config, engine, *group).await {
                error!(?group, error = %e, "[WATCH][ERROR] Task sequence failed");
            }
        }

        if channel_closed {
            break;
        }
    }

    info!("[WATCH] Watcher channel closed, stopping");
    Ok(())
}
