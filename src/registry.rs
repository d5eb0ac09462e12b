//! Model registry: descriptor parsing and weights resolution.
//!
//! The registry is a JSON document with a top-level `models` list. Source
//! order is preserved end to end; it dictates the order of results in the
//! final report.

use crate::error::MeasureError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One registry entry describing a pretrained model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub active: bool,
    /// (point count, dimensionality) of one model input.
    pub input_shape: (usize, usize),
    pub output_size: usize,
    /// Architecture bookkeeping; the weights file encodes the actual graph.
    #[serde(default)]
    pub hidden_sizes: Vec<usize>,
    pub subsampling_method: String,
    /// Directory searched for this model's weights file.
    pub weights_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RegistryDoc {
    models: Vec<ModelDescriptor>,
}

/// Ordered collection of model descriptors.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Load and validate the registry document at `path`.
    ///
    /// Duplicate model names are rejected here; downstream aggregation has
    /// no defined merge policy for them.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read registry {}", path.display()))?;
        let doc: RegistryDoc = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse registry {}", path.display()))?;
        Self::from_descriptors(doc.models)
    }

    pub fn from_descriptors(models: Vec<ModelDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for descriptor in &models {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(MeasureError::DuplicateModelName(descriptor.name.clone()).into());
            }
        }
        debug!(count = models.len(), "Registry loaded");
        Ok(Self { models })
    }

    /// All descriptors in source order, inactive entries included.
    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Descriptors in source order, inactive entries skipped.
    pub fn active_descriptors(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(|d| d.active)
    }
}

/// Resolves a descriptor's weights directory to a concrete weights file.
///
/// A trait seam so the directory scan can be swapped for a manifest-based
/// lookup without touching the pipeline.
pub trait WeightsResolver {
    /// `Ok(None)` means "no weights for this model" — a per-model skip,
    /// never a pipeline failure.
    fn resolve(&self, descriptor: &ModelDescriptor) -> Result<Option<PathBuf>>;
}

/// Scans the descriptor's weights directory for the first entry (in sorted
/// order) whose file name contains `-weights`.
#[derive(Debug, Default)]
pub struct DirWeightsResolver;

impl WeightsResolver for DirWeightsResolver {
    fn resolve(&self, descriptor: &ModelDescriptor) -> Result<Option<PathBuf>> {
        let dir = &descriptor.weights_dir;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // A missing directory means the model was never deployed here.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read weights dir {}", dir.display()))
            }
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains("-weights"))
            })
            .collect();
        candidates.sort();

        Ok(candidates.into_iter().next())
    }
}
