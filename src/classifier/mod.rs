mod error;
mod image;
mod model;
pub mod builder;
pub mod scores;

pub use builder::ClassifierBuilder;
pub use error::ClassifierError;
pub use image::{decode_image, ImageInference};
pub use model::{Classification, Classifier};
