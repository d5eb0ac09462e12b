//! Scan location: identity derivation and artifact discovery.
//!
//! Scans follow a fixed directory convention:
//! `<root>/<qrcode>/<category>/<timestamp>/pc/*.pcd`. The qrcode and
//! timestamp are positional path segments, never validated against content.

use crate::error::MeasureError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Identity of one captured scan, derived from its directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIdentity {
    pub qrcode: String,
    pub timestamp: String,
}

impl ScanIdentity {
    /// Derive identity from a scan directory path: the third-from-last
    /// segment is the qrcode, the last is the timestamp.
    pub fn from_path(scan_dir: &Path) -> Result<Self, MeasureError> {
        let segments: Vec<&str> = scan_dir
            .iter()
            .filter_map(|s| s.to_str())
            .filter(|s| !s.is_empty() && *s != "/")
            .collect();

        if segments.len() < 3 {
            return Err(MeasureError::InvalidScanPath(scan_dir.to_path_buf()));
        }

        Ok(Self {
            qrcode: segments[segments.len() - 3].to_string(),
            timestamp: segments[segments.len() - 1].to_string(),
        })
    }
}

/// One discovered point-cloud artifact file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub path: PathBuf,
}

/// Enumerate the scan's `.pcd` artifacts under `<scan_dir>/pc/`.
///
/// Entries are sorted lexicographically so discovery order is stable across
/// platforms and runs. Zero artifacts is fatal for the whole pipeline.
pub fn discover_artifacts(scan_dir: &Path) -> Result<Vec<ArtifactRef>> {
    let pc_dir = scan_dir.join("pc");
    let mut paths: Vec<PathBuf> = match fs::read_dir(&pc_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "pcd"))
            .collect(),
        // A missing pc/ directory is the same condition as an empty one.
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", pc_dir.display()))
        }
    };
    paths.sort();

    if paths.is_empty() {
        return Err(MeasureError::NoArtifactsFound(scan_dir.to_path_buf()).into());
    }

    debug!(count = paths.len(), dir = %pc_dir.display(), "Discovered scan artifacts");

    Ok(paths.into_iter().map(|path| ArtifactRef { path }).collect())
}
