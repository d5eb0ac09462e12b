//! Error taxonomy for the measurement pipeline.
//!
//! Fatal variants abort the whole run; the per-model variants are caught at
//! the model boundary in the pipeline and only exclude that model from the
//! report.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum MeasureError {
    /// Fatal: the scan directory contains no point-cloud artifacts.
    #[error("no artifacts found under {0}")]
    NoArtifactsFound(PathBuf),

    /// Fatal: the scan path is too shallow to carry qrcode/timestamp segments.
    #[error("scan path {0} does not match <qrcode>/<category>/<timestamp>")]
    InvalidScanPath(PathBuf),

    /// Fatal: the registry document names the same model twice.
    #[error("duplicate model name in registry: {0}")]
    DuplicateModelName(String),

    /// Per-model: descriptor references a strategy this build does not know.
    #[error("unknown subsampling strategy: {0}")]
    UnknownSubsamplingStrategy(String),

    /// Per-model: the batched predict call failed or produced bad output.
    #[error("inference failed for model {model}: {reason}")]
    ModelInferenceError { model: String, reason: String },

    /// Serialization-time: a prediction or mean is NaN or infinite.
    #[error("non-finite value in report for model {model}")]
    NonFiniteResult { model: String },

    /// Serialization-time: the report document failed to encode.
    #[error("failed to encode report: {0}")]
    ReportEncoding(#[from] serde_json::Error),
}
