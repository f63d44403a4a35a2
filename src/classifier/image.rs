use std::collections::HashMap;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use crate::models::ProcessorConfig;

/// The seam between the HTTP layer and the inference collaborator: a
/// normalized image in, one raw per-class score vector out. The concrete
/// [`crate::Classifier`] runs an ONNX session behind this trait; tests can
/// substitute a stub.
pub trait ImageInference: Send + Sync {
    fn class_scores(&self, image: &DynamicImage) -> Result<Vec<f32>, ClassifierError>;
}

/// Decodes uploaded bytes into an image, guessing the format from content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    image::load_from_memory(bytes)
        .map_err(|e| ClassifierError::ImageError(format!("Failed to decode image: {}", e)))
}

/// Resizes to the processor's target size, converts to RGB and normalizes
/// each channel with the processor's mean/std into an NCHW tensor.
pub(crate) fn preprocess(
    image: &DynamicImage,
    processor: &ProcessorConfig,
) -> Result<Array4<f32>, ClassifierError> {
    let (width, height) = (processor.size.width, processor.size.height);
    if width == 0 || height == 0 {
        return Err(ClassifierError::ValidationError(
            "Processor image size cannot be zero".into(),
        ));
    }
    if processor.image_mean.len() != 3 || processor.image_std.len() != 3 {
        return Err(ClassifierError::ValidationError(format!(
            "Processor mean/std must have 3 channels, got {}/{}",
            processor.image_mean.len(),
            processor.image_std.len()
        )));
    }

    let resized = image
        .resize_exact(width, height, FilterType::CatmullRom)
        .to_rgb8();

    let mut pixels = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            pixels[[0, channel, y as usize, x as usize]] =
                (value - processor.image_mean[channel]) / processor.image_std[channel];
        }
    }
    Ok(pixels)
}

/// Runs one forward pass: preprocessed pixels in, the first output row's
/// logits out. Shared by the classifier and the builder's startup probe.
///
/// The model is expected to accept a `pixel_values` tensor of shape
/// [batch, 3, height, width] and emit logits of shape [batch, num_classes].
pub(crate) fn run_class_scores(
    session: &mut Session,
    processor: &ProcessorConfig,
    image: &DynamicImage,
) -> Result<Vec<f32>, ClassifierError> {
    let pixels = preprocess(image, processor)?;
    let pixel_values = pixels.into_dyn();

    let mut input_tensors = HashMap::new();
    input_tensors.insert(
        "pixel_values",
        Tensor::from_array(pixel_values)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?,
    );

    let outputs = session
        .run(input_tensors)
        .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
    let logits = outputs[0]
        .try_extract_array::<f32>()
        .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

    if logits.ndim() != 2 {
        return Err(ClassifierError::ModelError(format!(
            "Expected logits of shape [batch, num_classes], got {:?}",
            logits.shape()
        )));
    }

    Ok(logits.slice(ndarray::s![0, ..]).iter().cloned().collect())
}
