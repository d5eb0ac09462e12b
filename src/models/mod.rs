//! ML model inference components

pub mod inference;
pub mod loader;

pub use inference::{InferenceRunner, Predictor};
pub use loader::{LoadedModel, ModelLoader, ModelProvider, OnnxModelProvider};
