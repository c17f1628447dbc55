//! Packaging target: bundle every built artifact into a single zip archive
//! with a SHA-256 checksum sidecar.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::config::BookConfig;

#[derive(Debug)]
pub enum PackageError {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
}

impl From<std::io::Error> for PackageError {
    fn from(e: std::io::Error) -> Self {
        PackageError::Io(e)
    }
}

impl From<zip::result::ZipError> for PackageError {
    fn from(e: zip::result::ZipError) -> Self {
        PackageError::Zip(e)
    }
}

impl std::fmt::Display for PackageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageError::Io(e) => write!(f, "packaging i/o error: {e}"),
            PackageError::Zip(e) => write!(f, "archive error: {e}"),
        }
    }
}

impl std::error::Error for PackageError {}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub archive: PathBuf,
    pub checksum: String,
    pub files: usize,
}

/// Bundle the output directory into the configured archive.
///
/// Files are added in sorted path order so re-packaging an unchanged tree
/// yields a stable archive layout. The archive itself and its checksum
/// sidecar are excluded when they live inside the output directory. The
/// archive is written through a temp file and renamed into place, so a
/// failed run never leaves a truncated archive behind.
pub fn package(config: &BookConfig) -> Result<PackageReport, PackageError> {
    let checksum_path = sidecar_path(&config.archive);

    let mut files = collect_files(&config.output_dir)?;
    files.retain(|path| path != &config.archive && path != &checksum_path);

    info!(
        files = files.len(),
        archive = %config.archive.display(),
        "[PACKAGE] Bundling output directory"
    );

    if let Some(parent) = config.archive.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging_dir = config
        .archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(staging_dir)?;

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(temp.as_file());
    for file in &files {
        let name = file
            .strip_prefix(&config.output_dir)
            .unwrap_or(file)
            .display()
            .to_string();
        zip.start_file(&name, deflated)?;
        zip.write_all(&fs::read(file)?)?;
    }
    zip.finish()?;

    temp.persist(&config.archive).map_err(|e| PackageError::Io(e.error))?;

    let checksum = format!("{:x}", Sha256::digest(fs::read(&config.archive)?));
    let archive_name = config
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    fs::write(&checksum_path, format!("{checksum}  {archive_name}\n"))?;

    let report = PackageReport {
        archive: config.archive.clone(),
        checksum,
        files: files.len(),
    };
    info!(
        archive = %report.archive.display(),
        checksum = %report.checksum,
        "[PACKAGE] Archive written"
    );
    Ok(report)
}

fn sidecar_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
