use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use log::{error, info, warn};
use ort::session::Session;

use super::error::ClassifierError;
use super::image::run_class_scores;
use super::model::Classifier;
use crate::labels::LabelTable;
use crate::models::{BuiltinModel, ModelCharacteristics, ProcessorConfig};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelManager;

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    processor_path: Option<String>,
    session: Option<Session>,
    processor: Option<ProcessorConfig>,
    labels: Option<Arc<LabelTable>>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder with default configuration.
    /// Unless [`Self::with_labels`] is called, the built-in ten-class waste
    /// table is used.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Replaces the default waste label table.
    pub fn with_labels(mut self, labels: Arc<LabelTable>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Sets the model to use for classification using a built-in model type.
    ///
    /// The model artifacts must already be downloaded (see
    /// [`ModelManager::ensure_model_downloaded`]); this method does not
    /// reach the network.
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.processor_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and processor paths already set".to_string(),
            ));
        }

        let manager = ModelManager::new_default().map_err(|e| {
            ClassifierError::BuildError(format!("Failed to create model manager: {}", e))
        })?;

        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let model_path = manager.get_model_path(model);
        let processor_path = manager.get_processor_path(model);

        let characteristics = model.characteristics();
        let processor = load_processor_config(&processor_path, &characteristics);

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_characteristics = Some(characteristics);
        self.processor = Some(processor);
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.processor_path = Some(processor_path.to_string_lossy().to_string());
        self.session = Some(session);
        Ok(self)
    }

    /// Sets a custom ONNX model and (optionally) a processor config path.
    /// Without a processor config, SigLIP-style defaults are used
    /// (224x224 input, per-channel mean/std of 0.5).
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        processor_path: Option<&str>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() {
            return Err(ClassifierError::BuildError(
                "Model path cannot be empty".to_string(),
            ));
        }
        if self.model_path.is_some() || self.processor_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and processor paths already set".to_string(),
            ));
        }
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path
            )));
        }
        if let Some(path) = processor_path {
            if !Path::new(path).exists() {
                return Err(ClassifierError::BuildError(format!(
                    "Processor config not found: {}",
                    path
                )));
            }
        }

        let characteristics = ModelCharacteristics {
            image_size: 224,
            num_classes: 0, // Inferred from the probe run in build()
            model_size_mb: 0,
        };
        let processor = match processor_path {
            Some(path) => load_processor_config(Path::new(path), &characteristics),
            None => ProcessorConfig::from_characteristics(&characteristics),
        };

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_characteristics = Some(characteristics);
        self.processor = Some(processor);
        self.model_path = Some(model_path.to_string());
        self.processor_path = Some(processor_path.unwrap_or_default().to_string());
        self.session = Some(session);
        Ok(self)
    }

    /// Builds and returns the final Classifier instance.
    ///
    /// Runs one probe image through the session and fails fast when the
    /// model's class count does not match the label table, so a diverging
    /// collaborator is caught at startup rather than per request.
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let processor = self
            .processor
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No processor config loaded".into()))?;
        let mut characteristics = self
            .model_characteristics
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".into()))?;
        let labels = self
            .labels
            .take()
            .unwrap_or_else(|| Arc::new(LabelTable::waste_sorting()));

        let probe = DynamicImage::ImageRgb8(image::RgbImage::new(
            processor.size.width,
            processor.size.height,
        ));
        let probe_scores = run_class_scores(&mut session, &processor, &probe)?;
        if probe_scores.len() != labels.len() {
            error!(
                "Model emits {} classes but the label table has {}",
                probe_scores.len(),
                labels.len()
            );
            return Err(ClassifierError::BuildError(format!(
                "Model emits {} classes but the label table has {}",
                probe_scores.len(),
                labels.len()
            )));
        }
        characteristics.num_classes = probe_scores.len();
        info!(
            "Classifier ready: {} classes, {}x{} input",
            characteristics.num_classes, processor.size.width, processor.size.height
        );

        Ok(Classifier {
            model_path: self.model_path.take().unwrap_or_default(),
            processor_path: self.processor_path.take().unwrap_or_default(),
            session: Arc::new(Mutex::new(session)),
            processor,
            labels,
            model_characteristics: characteristics,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = session.inputs();
        if inputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 input (pixel_values)".to_string(),
            ));
        }

        let outputs = session.outputs();
        if outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class logits".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reads `preprocessor_config.json`, falling back to the model's fixed
/// characteristics when the file is missing or malformed.
fn load_processor_config(
    path: &Path,
    characteristics: &ModelCharacteristics,
) -> ProcessorConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                info!("Processor config loaded from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Malformed processor config at {:?} ({}), using defaults", path, e);
                ProcessorConfig::from_characteristics(characteristics)
            }
        },
        Err(e) => {
            warn!("Could not read processor config at {:?} ({}), using defaults", path, e);
            ProcessorConfig::from_characteristics(characteristics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_model_rejects_empty_path() {
        let result = ClassifierBuilder::new().with_custom_model("", None);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_custom_model_rejects_missing_file() {
        let result =
            ClassifierBuilder::new().with_custom_model("/nonexistent/model.onnx", None);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_build_without_model_fails() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_load_processor_config_falls_back() {
        let characteristics = BuiltinModel::WasteSiglip.characteristics();
        let config =
            load_processor_config(Path::new("/nonexistent/config.json"), &characteristics);
        assert_eq!(config.size.width, 224);
        assert_eq!(config.image_mean, vec![0.5, 0.5, 0.5]);
    }
}
