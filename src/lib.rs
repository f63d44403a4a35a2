//! A waste-sorting image classification service backed by a pretrained
//! SigLIP2 ONNX model.
//!
//! The model predicts one of ten fine-grained waste categories (Battery,
//! Biological, Cardboard, Clothes, Glass, Metal, Paper, Plastic, Shoes,
//! Trash), which a fixed table reduces to a binary wet/dry label. The crate
//! ships the classifier as a library plus a small axum server exposing it
//! at `POST /api/classify`.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use binsight::{BuiltinModel, Classifier, ModelManager};
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_model_downloaded(BuiltinModel::WasteSiglip).await?;
//!
//! let classifier = Classifier::builder()
//!     .with_model(BuiltinModel::WasteSiglip)?
//!     .build()?;
//!
//! let bytes = std::fs::read("banana-peel.jpg")?;
//! let result = classifier.classify_bytes(&bytes)?;
//! println!("{} -> {} ({:.2}%)", result.predicted_class, result.waste_type, result.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The classifier is thread-safe and can be shared across request handlers
//! behind `Arc`; inference is read-only and needs no locking.

pub mod classifier;
pub mod labels;
pub mod model_manager;
pub mod models;
mod runtime;
pub mod server;

pub use classifier::{
    decode_image, Classification, Classifier, ClassifierBuilder, ClassifierError, ImageInference,
};
pub use labels::{LabelTable, WasteCategory};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo, ProcessorConfig};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use server::{AppState, ModelState, ServerConfig};

pub fn init_logger() {
    env_logger::init();
}
