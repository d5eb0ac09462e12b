//! Point-cloud subsampling strategies.
//!
//! Models expect a fixed number of input points, so every artifact cloud is
//! reduced (or padded) to exactly the model's target size before batching.

use crate::error::MeasureError;
use crate::pointcloud::PointCloud;
use std::fmt;
use std::str::FromStr;

/// Closed set of subsampling strategies. The registry document selects one
/// by name per model; an unrecognized name fails loudly instead of no-oping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsamplingMethod {
    /// Fixed-stride decimation: stride = max(1, len / target), every
    /// stride-th point starting at index 0.
    SequentialSkip,
}

impl FromStr for SubsamplingMethod {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential_skip" => Ok(Self::SequentialSkip),
            other => Err(MeasureError::UnknownSubsamplingStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for SubsamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequentialSkip => f.write_str("sequential_skip"),
        }
    }
}

/// Reduce `cloud` to exactly `target_size` points.
///
/// When the cloud has fewer points than the target, the last selected point
/// is repeated until the target is reached. Repeat-last keeps padding inside
/// the cloud's spatial envelope; zero-fill would invent a point at the
/// origin and bias the model input.
///
/// Deterministic: identical input and strategy always yield the identical
/// sequence.
pub fn subsample(cloud: &PointCloud, target_size: usize, method: SubsamplingMethod) -> Vec<Vec<f32>> {
    match method {
        SubsamplingMethod::SequentialSkip => sequential_skip(cloud, target_size),
    }
}

fn sequential_skip(cloud: &PointCloud, target_size: usize) -> Vec<Vec<f32>> {
    if target_size == 0 {
        return Vec::new();
    }
    let points = cloud.points();
    let stride = (points.len() / target_size).max(1);

    let mut selected: Vec<Vec<f32>> = points
        .iter()
        .step_by(stride)
        .take(target_size)
        .cloned()
        .collect();

    // Short clouds pad by repeating the last point. `points` is never empty
    // for a valid PointCloud, so `selected` has at least one entry here.
    while selected.len() < target_size {
        let last = selected[selected.len() - 1].clone();
        selected.push(last);
    }

    selected
}
