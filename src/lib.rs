//! Scan Measurement Library
//!
//! Turns one captured 3-D body scan (a directory of point-cloud artifacts)
//! into an anthropometric measurement report by running it through a
//! registry of pretrained point-cloud regression models.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod pointcloud;
pub mod registry;
pub mod report;
pub mod scan;
pub mod subsample;

pub use config::AppConfig;
pub use error::MeasureError;
pub use models::inference::InferenceRunner;
pub use models::loader::{ModelLoader, ModelProvider, OnnxModelProvider};
pub use pointcloud::PointCloud;
pub use registry::ModelRegistry;
pub use report::{ReportBuilder, ScanReport};
pub use scan::ScanIdentity;
pub use subsample::SubsamplingMethod;
