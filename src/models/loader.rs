//! ONNX model loader.

use crate::models::inference::Predictor;
use crate::registry::ModelDescriptor;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Turns resolved weights into a usable predictor.
///
/// A trait seam mirroring [`crate::registry::WeightsResolver`]: the pipeline
/// only sees this interface, so tests can drive it with stub models.
pub trait ModelProvider {
    fn provide(
        &mut self,
        descriptor: &ModelDescriptor,
        weights_path: &Path,
    ) -> Result<Box<dyn Predictor>>;
}

/// ONNX-backed provider. The runtime is initialized on first use, so runs
/// whose models are all inactive or weightless never touch it.
pub struct OnnxModelProvider {
    onnx_threads: usize,
    loader: Option<ModelLoader>,
}

impl OnnxModelProvider {
    pub fn new(onnx_threads: usize) -> Self {
        Self {
            onnx_threads,
            loader: None,
        }
    }
}

impl ModelProvider for OnnxModelProvider {
    fn provide(
        &mut self,
        descriptor: &ModelDescriptor,
        weights_path: &Path,
    ) -> Result<Box<dyn Predictor>> {
        if self.loader.is_none() {
            self.loader = Some(ModelLoader::with_threads(self.onnx_threads)?);
        }
        let Some(loader) = self.loader.as_mut() else {
            unreachable!("loader initialized above");
        };
        Ok(Box::new(loader.load_model(weights_path, descriptor)?))
    }
}

/// Loaded ONNX model bound to one registry descriptor.
pub struct LoadedModel {
    /// Model name from the registry.
    pub name: String,
    /// ONNX Runtime session.
    pub session: Session,
    /// Input name for the model.
    pub input_name: String,
    /// Output name for predictions.
    pub output_name: String,
}

/// Loader for ONNX models.
pub struct ModelLoader {
    /// Number of intra-op threads for ONNX inference.
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads.
    ///
    /// Initializes ONNX Runtime once; backend diagnostics go through
    /// `tracing` rather than ambient process state.
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the weights at `path` for `descriptor`.
    ///
    /// Callers treat any error as a per-model skip, never a pipeline abort.
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        descriptor: &ModelDescriptor,
    ) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(
            model = %descriptor.name,
            path = %path.display(),
            input_shape = ?descriptor.input_shape,
            hidden_sizes = ?descriptor.hidden_sizes,
            "Loading ONNX model"
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "points".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "prediction".to_string());

        info!(
            model = %descriptor.name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: descriptor.name.clone(),
            session,
            input_name,
            output_name,
        })
    }
}
