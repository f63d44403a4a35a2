use serde::Deserialize;

/// Pretrained models known to the crate.
///
/// Each variant carries the remote artifact locations and pinned hashes
/// needed by [`crate::ModelManager`], plus the fixed characteristics the
/// preprocessing pipeline falls back to when no processor config is
/// available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// SigLIP2-based waste classifier with a ten-class head
    /// (Battery, Biological, Cardboard, Clothes, Glass, Metal, Paper,
    /// Plastic, Shoes, Trash).
    WasteSiglip,
}

/// Remote artifact locations and pinned hashes for a built-in model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub processor_url: String,
    pub model_hash: String,
    pub processor_hash: String,
}

/// Fixed characteristics of a built-in model.
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    /// Side length of the square input the model expects, in pixels.
    pub image_size: u32,
    /// Width of the classification head's output vector.
    pub num_classes: usize,
    pub model_size_mb: usize,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::WasteSiglip => ModelInfo {
                name: "waste-siglip2".to_string(),
                model_url: "https://huggingface.co/prithivMLmods/Augmented-Waste-Classifier-SigLIP2/resolve/main/onnx/model.onnx".to_string(),
                processor_url: "https://huggingface.co/prithivMLmods/Augmented-Waste-Classifier-SigLIP2/resolve/main/preprocessor_config.json".to_string(),
                model_hash: "f0df63d5c2637e9be653d37a79f1844ec40a762e9cca31810570c930a38a87b9".to_string(),
                processor_hash: "59a21124a62be4d31b711029a9f1284dc6bd2e62e04f7a2e14dcf7f185fff8e7".to_string(),
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::WasteSiglip => ModelCharacteristics {
                image_size: 224,
                num_classes: 10,
                model_size_mb: 429,
            },
        }
    }
}

fn default_mean() -> Vec<f32> {
    vec![0.5, 0.5, 0.5]
}

fn default_std() -> Vec<f32> {
    vec![0.5, 0.5, 0.5]
}

/// Target input dimensions, as found in a `preprocessor_config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorSize {
    pub height: u32,
    pub width: u32,
}

impl Default for ProcessorSize {
    fn default() -> Self {
        Self {
            height: 224,
            width: 224,
        }
    }
}

/// The subset of a Hugging Face `preprocessor_config.json` the image
/// pipeline needs. Unknown fields are ignored; missing fields fall back to
/// SigLIP defaults (mean and std of 0.5 per channel, 224x224 input).
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default = "default_mean")]
    pub image_mean: Vec<f32>,
    #[serde(default = "default_std")]
    pub image_std: Vec<f32>,
    #[serde(default)]
    pub size: ProcessorSize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            image_mean: default_mean(),
            image_std: default_std(),
            size: ProcessorSize::default(),
        }
    }
}

impl ProcessorConfig {
    /// Builds a config from a model's fixed characteristics, for models
    /// that ship without a processor file.
    pub fn from_characteristics(characteristics: &ModelCharacteristics) -> Self {
        Self {
            size: ProcessorSize {
                height: characteristics.image_size,
                width: characteristics.image_size,
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_model_info() {
        let info = BuiltinModel::WasteSiglip.get_model_info();
        assert_eq!(info.name, "waste-siglip2");
        assert!(info.model_url.ends_with("model.onnx"));
        assert!(info.processor_url.ends_with("preprocessor_config.json"));
        assert_eq!(info.model_hash.len(), 64);
        assert_eq!(info.processor_hash.len(), 64);
    }

    #[test]
    fn test_characteristics() {
        let characteristics = BuiltinModel::WasteSiglip.characteristics();
        assert_eq!(characteristics.image_size, 224);
        assert_eq!(characteristics.num_classes, 10);
    }

    #[test]
    fn test_processor_config_parsing() {
        let json = r#"{
            "do_normalize": true,
            "image_mean": [0.5, 0.5, 0.5],
            "image_std": [0.5, 0.5, 0.5],
            "image_processor_type": "SiglipImageProcessor",
            "size": {"height": 224, "width": 224}
        }"#;
        let config: ProcessorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.image_mean, vec![0.5, 0.5, 0.5]);
        assert_eq!(config.size.height, 224);
    }

    #[test]
    fn test_processor_config_defaults() {
        let config: ProcessorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.image_mean, vec![0.5, 0.5, 0.5]);
        assert_eq!(config.image_std, vec![0.5, 0.5, 0.5]);
        assert_eq!(config.size.width, 224);
    }
}
