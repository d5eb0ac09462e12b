//! Scan-to-report orchestration.
//!
//! Fatal conditions (bad scan path, no artifacts, unreadable registry)
//! propagate to the caller. Everything that can go wrong with a single
//! model is absorbed here: it logs, skips the model, and the rest of the
//! report proceeds unaffected.

use crate::config::AppConfig;
use crate::models::inference::{ArtifactPrediction, InferenceRunner};
use crate::models::loader::{ModelProvider, OnnxModelProvider};
use crate::pointcloud::{read_pcd, PointCloud};
use crate::registry::{DirWeightsResolver, ModelDescriptor, ModelRegistry, WeightsResolver};
use crate::report::{ReportBuilder, ScanReport};
use crate::scan::{discover_artifacts, ArtifactRef, ScanIdentity};
use crate::subsample::SubsamplingMethod;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Run the whole pipeline for one scan directory with the ONNX backend.
pub fn run_scan(scan_dir: &Path, config: &AppConfig) -> Result<ScanReport> {
    let resolver = DirWeightsResolver;
    let mut provider = OnnxModelProvider::new(config.models.onnx_threads);
    run_scan_with(scan_dir, config, &resolver, &mut provider)
}

/// Pipeline core, parameterized over weights resolution and model loading.
pub fn run_scan_with(
    scan_dir: &Path,
    config: &AppConfig,
    resolver: &dyn WeightsResolver,
    provider: &mut dyn ModelProvider,
) -> Result<ScanReport> {
    let identity = ScanIdentity::from_path(scan_dir)?;
    let artifacts = discover_artifacts(scan_dir)?;

    info!(
        qrcode = %identity.qrcode,
        timestamp = %identity.timestamp,
        artifacts = artifacts.len(),
        "Processing scan"
    );

    // Raw clouds are read once and shared read-only across all models.
    let clouds: Vec<PointCloud> = artifacts
        .iter()
        .map(|artifact| {
            read_pcd(&artifact.path)
                .with_context(|| format!("artifact {}", artifact.path.display()))
        })
        .collect::<Result<_>>()?;

    let registry = ModelRegistry::load(&config.models.registry)?;

    let mut builder = ReportBuilder::new(identity);
    for descriptor in registry.active_descriptors() {
        match evaluate_model(descriptor, &artifacts, &clouds, resolver, provider) {
            Ok(Some(predictions)) => builder.push_model(&descriptor.name, predictions)?,
            Ok(None) => {}
            Err(err) => {
                warn!(model = %descriptor.name, error = %err, "Model skipped");
            }
        }
    }

    Ok(builder.finish())
}

/// Evaluate one model. `Ok(None)` is the quiet skip (no weights deployed);
/// `Err` is a per-model failure the caller logs and absorbs.
fn evaluate_model(
    descriptor: &ModelDescriptor,
    artifacts: &[ArtifactRef],
    clouds: &[PointCloud],
    resolver: &dyn WeightsResolver,
    provider: &mut dyn ModelProvider,
) -> Result<Option<Vec<ArtifactPrediction>>> {
    let method: SubsamplingMethod = descriptor.subsampling_method.parse()?;

    let Some(weights_path) = resolver.resolve(descriptor)? else {
        warn!(
            model = %descriptor.name,
            dir = %descriptor.weights_dir.display(),
            "No weights found, skipping model"
        );
        return Ok(None);
    };

    let mut model = provider.provide(descriptor, &weights_path)?;

    let runner = InferenceRunner::new(descriptor, method);
    let predictions = runner.run(artifacts, clouds, model.as_mut())?;

    info!(
        model = %descriptor.name,
        artifacts = predictions.len(),
        "Model evaluated"
    );

    Ok(Some(predictions))
}
