use std::sync::Arc;

use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as _,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{backend::Backend, Tensor},
};

use crate::text::{tokenizer::BasicEnglishTokenizer, vocab::Vocab};

use super::{batcher::Infer, Batcher, ModelConfig, TextPipeline};

/// Define inference function
pub fn infer<B: Backend>(
    device: B::Device,    // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str,   // Directory containing model, vocabulary, and config files
    samples: Vec<String>, // Text samples for inference
) -> anyhow::Result<(Tensor<B, 2>, ModelConfig)> {
    // Load experiment configuration
    let config = ModelConfig::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

    // Restore the vocabulary built during training
    let vocab = Vocab::load(format!("{artifact_dir}/vocab.json"))
        .map_err(|e| anyhow!("Unable to load vocabulary file: {}", e))?;

    let pipeline = Arc::new(TextPipeline::new(BasicEnglishTokenizer, vocab));

    // Initialize batcher for batching samples
    let batcher = Batcher::<B>::new(pipeline, config.num_classes(), device.clone());

    // Load trained model weights
    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), &device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    // Create model using loaded weights
    let model = config.init::<B>(&device).load_record(record);

    // Run inference on the given text samples
    let item: Infer<B> = batcher.batch(samples);

    Ok((model.infer(item), config))
}
