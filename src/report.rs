//! Report assembly and serialization.
//!
//! The aggregator collects per-model predictions into one ordered report;
//! the serializer renders it as JSON with decimal-string numeric leaves so
//! downstream consumers never see binary-float formatting ambiguity.

use crate::error::MeasureError;
use crate::models::inference::ArtifactPrediction;
use crate::scan::ScanIdentity;
use serde::Serialize;
use std::collections::HashSet;

/// All predictions of one model over the scan, artifact discovery order.
#[derive(Debug, Clone)]
pub struct ModelResult {
    pub model_name: String,
    /// Arithmetic mean over the artifact predictions, computed before any
    /// formatting can lose precision.
    pub mean: f64,
    pub artifact_results: Vec<ArtifactPrediction>,
}

/// Final measurement report for one scan. Model order matches registry
/// order with skipped entries omitted.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scan: ScanIdentity,
    pub model_results: Vec<ModelResult>,
}

/// Accumulates model results in processing order and finalizes exactly once.
pub struct ReportBuilder {
    scan: ScanIdentity,
    model_results: Vec<ModelResult>,
    seen_names: HashSet<String>,
}

impl ReportBuilder {
    pub fn new(scan: ScanIdentity) -> Self {
        Self {
            scan,
            model_results: Vec::new(),
            seen_names: HashSet::new(),
        }
    }

    /// Append one model's predictions. Registry validation already rejects
    /// duplicate names; this guard keeps the report well-formed even if a
    /// caller bypasses the registry.
    pub fn push_model(
        &mut self,
        model_name: &str,
        artifact_results: Vec<ArtifactPrediction>,
    ) -> Result<(), MeasureError> {
        if !self.seen_names.insert(model_name.to_string()) {
            return Err(MeasureError::DuplicateModelName(model_name.to_string()));
        }

        let mean = if artifact_results.is_empty() {
            f64::NAN
        } else {
            artifact_results.iter().map(|r| r.prediction).sum::<f64>()
                / artifact_results.len() as f64
        };

        self.model_results.push(ModelResult {
            model_name: model_name.to_string(),
            mean,
            artifact_results,
        });
        Ok(())
    }

    pub fn finish(self) -> ScanReport {
        ScanReport {
            scan: self.scan,
            model_results: self.model_results,
        }
    }
}

// Serialization documents. Field order here is the wire order.

#[derive(Serialize)]
struct ReportDoc {
    scan: ScanDoc,
    model_results: Vec<ModelResultDoc>,
}

#[derive(Serialize)]
struct ScanDoc {
    qrcode: String,
    timestamp: String,
}

#[derive(Serialize)]
struct ModelResultDoc {
    model_name: String,
    measure_result: MeasureResultDoc,
    artifact_results: Vec<ArtifactResultDoc>,
}

#[derive(Serialize)]
struct MeasureResultDoc {
    mean: String,
}

#[derive(Serialize)]
struct ArtifactResultDoc {
    path: String,
    prediction: String,
}

/// Render the report as JSON.
///
/// Every prediction and mean is checked for finiteness before any text is
/// produced; NaN or infinity anywhere rejects the whole report.
pub fn render_json(report: &ScanReport, pretty: bool) -> Result<String, MeasureError> {
    let doc = to_doc(report)?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    };
    Ok(rendered?)
}

fn to_doc(report: &ScanReport) -> Result<ReportDoc, MeasureError> {
    let mut model_docs = Vec::with_capacity(report.model_results.len());
    for model in &report.model_results {
        if !model.mean.is_finite()
            || model.artifact_results.iter().any(|r| !r.prediction.is_finite())
        {
            return Err(MeasureError::NonFiniteResult {
                model: model.model_name.clone(),
            });
        }

        model_docs.push(ModelResultDoc {
            model_name: model.model_name.clone(),
            measure_result: MeasureResultDoc {
                mean: model.mean.to_string(),
            },
            artifact_results: model
                .artifact_results
                .iter()
                .map(|r| ArtifactResultDoc {
                    path: r.path.display().to_string(),
                    prediction: r.prediction.to_string(),
                })
                .collect(),
        });
    }

    Ok(ReportDoc {
        scan: ScanDoc {
            qrcode: report.scan.qrcode.clone(),
            timestamp: report.scan.timestamp.clone(),
        },
        model_results: model_docs,
    })
}
