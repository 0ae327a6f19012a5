/// Model definition
pub mod model;

/// Batcher
pub mod batcher;

/// Text Classification Items
pub mod item;

/// Text and label encoding
pub mod pipeline;

/// Training
pub mod training;

/// Inference
pub mod inference;

/// The unique string token that identifies this pipeline
pub static PIPELINE: &str = "text-classification";

pub use batcher::Batcher;
pub use inference::infer;
pub use item::Item;
pub use model::{Model, ModelConfig};
pub use pipeline::{label_to_class, LabelError, TextPipeline};
pub use training::train;
