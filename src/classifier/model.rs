use std::sync::{Arc, Mutex};

use image::DynamicImage;
use ort::session::Session;
use serde::Serialize;

use super::error::ClassifierError;
use super::image::{decode_image, run_class_scores, ImageInference};
use super::scores;
use crate::labels::LabelTable;
use crate::models::{ModelCharacteristics, ProcessorConfig};

/// A thread-safe waste classifier wrapping a pretrained ONNX model.
///
/// All fields are either immutable or behind `Arc`, so the classifier is
/// `Send + Sync` and can serve concurrent requests; the ONNX session
/// requires exclusive access per inference, so forward passes are
/// serialized behind a mutex.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use binsight::{BuiltinModel, Classifier};
///
/// let classifier = Classifier::builder()
///     .with_model(BuiltinModel::WasteSiglip)?
///     .build()?;
///
/// let bytes = std::fs::read("bottle.jpg")?;
/// let result = classifier.classify_bytes(&bytes)?;
/// println!("{} -> {}", result.predicted_class, result.waste_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_path: String,
    pub processor_path: String,
    pub session: Arc<Mutex<Session>>,
    pub processor: ProcessorConfig,
    pub labels: Arc<LabelTable>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

/// The outcome of classifying one image. Serialized as the `result` object
/// of the classify endpoint; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub predicted_class: String,
    pub waste_type: String,
    pub category: crate::labels::WasteCategory,
    /// Softmax probability of the predicted class, in percent, rounded to
    /// two decimal places.
    pub confidence: f32,
}

impl Classification {
    /// Maps a raw score vector through the label tables: argmax (ties go to
    /// the lowest index), fine-grained label, coarse category, softmax
    /// confidence. Rejects a vector whose width diverges from the table.
    pub fn from_scores(
        raw_scores: &[f32],
        labels: &LabelTable,
    ) -> Result<Self, ClassifierError> {
        if raw_scores.len() != labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} scores for {} labels",
                raw_scores.len(),
                labels.len()
            )));
        }

        let index = scores::argmax(raw_scores).ok_or_else(|| {
            ClassifierError::PredictionError("Empty score vector".into())
        })?;
        let predicted_class = labels.label(index).ok_or_else(|| {
            ClassifierError::PredictionError(format!("No label for class index {}", index))
        })?;
        let category = labels.category(predicted_class).ok_or_else(|| {
            ClassifierError::PredictionError(format!(
                "No category mapping for label '{}'",
                predicted_class
            ))
        })?;

        Ok(Self {
            predicted_class: predicted_class.to_string(),
            waste_type: category.waste_type().to_string(),
            category,
            confidence: scores::confidence_percent(raw_scores),
        })
    }
}

impl ImageInference for Classifier {
    fn class_scores(&self, image: &DynamicImage) -> Result<Vec<f32>, ClassifierError> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| ClassifierError::ModelError(format!("Session lock poisoned: {}", e)))?;
        run_class_scores(&mut session, &self.processor, image)
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Classifies an already-decoded image.
    pub fn classify_image(&self, image: &DynamicImage) -> Result<Classification, ClassifierError> {
        let raw_scores = self.class_scores(image)?;
        Classification::from_scores(&raw_scores, &self.labels)
    }

    /// Decodes and classifies raw image bytes in one step.
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Classification, ClassifierError> {
        if bytes.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Input image cannot be empty".into(),
            ));
        }
        let image = decode_image(bytes)?;
        self.classify_image(&image)
    }
}
