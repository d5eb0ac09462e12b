//! Per-model batched inference over a scan's artifacts.

use crate::error::MeasureError;
use crate::models::loader::LoadedModel;
use crate::pointcloud::PointCloud;
use crate::registry::ModelDescriptor;
use crate::scan::ArtifactRef;
use crate::subsample::{subsample, SubsamplingMethod};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// Opaque predict capability: one forward pass over a whole batch.
///
/// `data` is `n * points * dims` floats, row-major. Implementations return
/// `n * output_size` values, row-major, in input order.
pub trait Predictor {
    fn predict_batch(&mut self, data: Vec<f32>, n: usize, points: usize, dims: usize)
        -> Result<Vec<f32>>;
}

impl Predictor for LoadedModel {
    fn predict_batch(
        &mut self,
        data: Vec<f32>,
        n: usize,
        points: usize,
        dims: usize,
    ) -> Result<Vec<f32>> {
        use ort::value::Tensor;

        let shape = vec![n as i64, points as i64, dims as i64];
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let outputs = self
            .session
            .run(ort::inputs![&self.input_name => input_tensor])?;

        // Prefer the recorded output name; fall back to the first output.
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Ok((_, values)) = output.try_extract_tensor::<f32>() {
                return Ok(values.to_vec());
            }
        }
        for (name, output) in outputs.iter() {
            if let Ok((_, values)) = output.try_extract_tensor::<f32>() {
                debug!(model = %self.name, output = %name, "Extracted predictions from fallback output");
                return Ok(values.to_vec());
            }
        }

        anyhow::bail!("no f32 tensor output in model {}", self.name)
    }
}

/// One artifact's prediction under one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPrediction {
    pub path: PathBuf,
    pub prediction: f64,
}

/// Runs one model over all discovered artifacts with a single batched
/// predict call.
pub struct InferenceRunner<'a> {
    descriptor: &'a ModelDescriptor,
    method: SubsamplingMethod,
}

impl<'a> InferenceRunner<'a> {
    pub fn new(descriptor: &'a ModelDescriptor, method: SubsamplingMethod) -> Self {
        Self { descriptor, method }
    }

    /// Subsample every cloud to the model's input shape, assemble one batch,
    /// invoke `predict` exactly once, and pair each artifact with its scalar.
    ///
    /// `artifacts` and `clouds` are parallel slices in discovery order; the
    /// returned predictions keep that order. Any failure here fails the
    /// whole model, never a single artifact — batch inference requires a
    /// uniform batch.
    pub fn run(
        &self,
        artifacts: &[ArtifactRef],
        clouds: &[PointCloud],
        predictor: &mut dyn Predictor,
    ) -> Result<Vec<ArtifactPrediction>, MeasureError> {
        let (points, dims) = self.descriptor.input_shape;
        let n = artifacts.len();

        let mut data = Vec::with_capacity(n * points * dims);
        for (artifact, cloud) in artifacts.iter().zip(clouds) {
            if cloud.dims() < dims {
                return Err(self.inference_error(format!(
                    "artifact {} has {} dims, model expects {}",
                    artifact.path.display(),
                    cloud.dims(),
                    dims
                )));
            }
            // Clouds may carry extra columns (rgb, intensity); the model
            // consumes the leading `dims` of each point.
            for point in subsample(cloud, points, self.method) {
                data.extend_from_slice(&point[..dims]);
            }
        }

        debug!(
            model = %self.descriptor.name,
            artifacts = n,
            points = points,
            dims = dims,
            "Running batched inference"
        );

        let output = predictor
            .predict_batch(data, n, points, dims)
            .map_err(|e| self.inference_error(format!("{:#}", e)))?;

        let output_size = self.descriptor.output_size.max(1);
        if output.len() != n * output_size {
            return Err(self.inference_error(format!(
                "expected {} output values, model produced {}",
                n * output_size,
                output.len()
            )));
        }

        // One scalar per artifact: the first element of each output row.
        Ok(artifacts
            .iter()
            .enumerate()
            .map(|(i, artifact)| ArtifactPrediction {
                path: artifact.path.clone(),
                prediction: f64::from(output[i * output_size]),
            })
            .collect())
    }

    fn inference_error(&self, reason: String) -> MeasureError {
        MeasureError::ModelInferenceError {
            model: self.descriptor.name.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(points: usize, dims: usize, output_size: usize) -> ModelDescriptor {
        ModelDescriptor {
            name: "pointnet-height".to_string(),
            active: true,
            input_shape: (points, dims),
            output_size,
            hidden_sizes: vec![64, 32],
            subsampling_method: "sequential_skip".to_string(),
            weights_dir: PathBuf::from("/tmp/models"),
        }
    }

    fn artifacts_and_clouds(n: usize, cloud_len: usize) -> (Vec<ArtifactRef>, Vec<PointCloud>) {
        let artifacts = (0..n)
            .map(|i| ArtifactRef {
                path: PathBuf::from(format!("/scan/pc/{:03}.pcd", i)),
            })
            .collect();
        let clouds = (0..n)
            .map(|i| {
                let points = (0..cloud_len)
                    .map(|j| vec![(i * cloud_len + j) as f32, 0.0, 0.0])
                    .collect();
                PointCloud::new(points).unwrap()
            })
            .collect();
        (artifacts, clouds)
    }

    /// Records batch geometry and yields fixed values per call.
    struct StubPredictor {
        calls: usize,
        seen_shape: Option<(usize, usize, usize)>,
        output: Vec<f32>,
        fail: bool,
    }

    impl StubPredictor {
        fn returning(output: Vec<f32>) -> Self {
            Self {
                calls: 0,
                seen_shape: None,
                output,
                fail: false,
            }
        }
    }

    impl Predictor for StubPredictor {
        fn predict_batch(
            &mut self,
            data: Vec<f32>,
            n: usize,
            points: usize,
            dims: usize,
        ) -> Result<Vec<f32>> {
            self.calls += 1;
            self.seen_shape = Some((n, points, dims));
            assert_eq!(data.len(), n * points * dims);
            if self.fail {
                anyhow::bail!("backend exploded");
            }
            Ok(self.output.clone())
        }
    }

    #[test]
    fn predict_is_called_exactly_once_for_the_whole_batch() {
        let descriptor = descriptor(16, 3, 1);
        let (artifacts, clouds) = artifacts_and_clouds(3, 100);
        let mut stub = StubPredictor::returning(vec![93.1, 92.8, 93.4]);

        let runner = InferenceRunner::new(&descriptor, SubsamplingMethod::SequentialSkip);
        let results = runner.run(&artifacts, &clouds, &mut stub).unwrap();

        assert_eq!(stub.calls, 1);
        assert_eq!(stub.seen_shape, Some((3, 16, 3)));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn predictions_keep_artifact_discovery_order() {
        let descriptor = descriptor(8, 3, 1);
        let (artifacts, clouds) = artifacts_and_clouds(3, 50);
        let mut stub = StubPredictor::returning(vec![1.0, 2.0, 3.0]);

        let runner = InferenceRunner::new(&descriptor, SubsamplingMethod::SequentialSkip);
        let results = runner.run(&artifacts, &clouds, &mut stub).unwrap();

        let paths: Vec<_> = results.iter().map(|r| r.path.to_str().unwrap()).collect();
        assert_eq!(paths, ["/scan/pc/000.pcd", "/scan/pc/001.pcd", "/scan/pc/002.pcd"]);
        let values: Vec<_> = results.iter().map(|r| r.prediction).collect();
        assert_eq!(values, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn multi_value_outputs_take_the_first_element_per_row() {
        let descriptor = descriptor(8, 3, 2);
        let (artifacts, clouds) = artifacts_and_clouds(2, 50);
        let mut stub = StubPredictor::returning(vec![10.0, 0.1, 20.0, 0.2]);

        let runner = InferenceRunner::new(&descriptor, SubsamplingMethod::SequentialSkip);
        let results = runner.run(&artifacts, &clouds, &mut stub).unwrap();

        let values: Vec<_> = results.iter().map(|r| r.prediction).collect();
        assert_eq!(values, [10.0, 20.0]);
    }

    #[test]
    fn backend_failure_becomes_model_inference_error() {
        let descriptor = descriptor(8, 3, 1);
        let (artifacts, clouds) = artifacts_and_clouds(2, 50);
        let mut stub = StubPredictor::returning(vec![]);
        stub.fail = true;

        let runner = InferenceRunner::new(&descriptor, SubsamplingMethod::SequentialSkip);
        let err = runner.run(&artifacts, &clouds, &mut stub).unwrap_err();
        assert!(matches!(
            err,
            MeasureError::ModelInferenceError { ref model, .. } if model == "pointnet-height"
        ));
    }

    #[test]
    fn wrong_output_length_fails_the_model() {
        let descriptor = descriptor(8, 3, 1);
        let (artifacts, clouds) = artifacts_and_clouds(3, 50);
        let mut stub = StubPredictor::returning(vec![1.0, 2.0]);

        let runner = InferenceRunner::new(&descriptor, SubsamplingMethod::SequentialSkip);
        let err = runner.run(&artifacts, &clouds, &mut stub).unwrap_err();
        assert!(matches!(err, MeasureError::ModelInferenceError { .. }));
    }

    #[test]
    fn narrow_cloud_fails_the_model_not_the_artifact() {
        let descriptor = descriptor(8, 3, 1);
        let artifacts = vec![ArtifactRef {
            path: PathBuf::from("/scan/pc/000.pcd"),
        }];
        let clouds = vec![PointCloud::new(vec![vec![1.0, 2.0]; 10]).unwrap()];
        let mut stub = StubPredictor::returning(vec![1.0]);

        let runner = InferenceRunner::new(&descriptor, SubsamplingMethod::SequentialSkip);
        let err = runner.run(&artifacts, &clouds, &mut stub).unwrap_err();
        assert!(matches!(err, MeasureError::ModelInferenceError { .. }));
        assert_eq!(stub.calls, 0);
    }
}
