use std::sync::Arc;

use burn::{
    data::dataloader,
    tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor},
};
use derive_new::new;
use log::warn;

use super::{
    pipeline::{label_to_class, TextPipeline},
    Item,
};

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token indices for the whole batch, concatenated: [total_tokens]
    pub tokens: Tensor<B, 1, Int>,

    /// Starting position of each sample's token run within `tokens`
    pub offsets: Vec<usize>,
}

/// A training batch for text classification
#[derive(Debug, Clone, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching text classification items
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Pipeline mapping raw text to vocabulary indices
    pipeline: Arc<TextPipeline>,

    /// Number of classes in the label set
    num_classes: usize,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(pipeline: Arc<TextPipeline>, num_classes: usize, device: B::Device) -> Self {
        Self {
            pipeline,
            num_classes,
            device,
        }
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<String, Infer<B>> for Batcher<B> {
    /// Collects a vector of text samples into an inference batch
    fn batch(&self, items: Vec<String>) -> Infer<B> {
        let mut token_ids = Vec::new();
        let mut offsets = Vec::with_capacity(items.len());

        for input in items {
            offsets.push(token_ids.len());
            token_ids.extend(self.pipeline.encode(&input));
        }

        Infer {
            tokens: int_tensor(token_ids, &self.device),
            offsets,
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend, I: Item> dataloader::batcher::Batcher<I, Train<B>> for Batcher<B> {
    /// Collects a vector of text classification items into a training batch
    ///
    /// Samples whose raw label falls outside the label set are rejected with
    /// a warning; the remaining samples keep their relative order.
    fn batch(&self, items: Vec<I>) -> Train<B> {
        let mut inputs = Vec::with_capacity(items.len());
        let mut class_ids = Vec::with_capacity(items.len());

        for item in &items {
            match label_to_class(item.raw_label(), self.num_classes) {
                Ok(class_id) => {
                    inputs.push(item.input());
                    class_ids.push(class_id);
                }
                Err(error) => warn!("Skipping sample: {error}"),
            }
        }

        let input: Infer<B> = self.batch(inputs);

        Train {
            input,
            targets: int_tensor(class_ids, &self.device),
        }
    }
}

fn int_tensor<B: Backend>(values: Vec<usize>, device: &B::Device) -> Tensor<B, 1, Int> {
    let length = values.len();

    Tensor::from_data(
        Data::new(
            values.into_iter().map(|v| (v as i64).elem()).collect(),
            Shape::new([length]),
        ),
        device,
    )
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{ndarray::NdArrayDevice, NdArray},
        data::dataloader::batcher::Batcher as _,
    };
    use pretty_assertions::assert_eq;

    use crate::text::{
        tokenizer::BasicEnglishTokenizer,
        vocab::{VocabBuilder, UNK_TOKEN},
    };

    use super::*;

    type TestBackend = NdArray<f32>;

    #[derive(Clone, Debug)]
    struct Sample {
        label: i64,
        text: &'static str,
    }

    impl Item for Sample {
        fn input(&self) -> String {
            self.text.to_string()
        }

        fn raw_label(&self) -> i64 {
            self.label
        }
    }

    fn test_batcher() -> Batcher<TestBackend> {
        let mut builder = VocabBuilder::new(&[UNK_TOKEN]);
        builder.push_tokens(["market", "rally", "cup", "final", "match"].map(String::from));
        builder.push_tokens(["market", "cup"].map(String::from));

        let pipeline = TextPipeline::new(BasicEnglishTokenizer, builder.build());

        Batcher::new(Arc::new(pipeline), 4, NdArrayDevice::Cpu)
    }

    #[test]
    fn offsets_partition_the_token_buffer() {
        let batcher = test_batcher();

        let batch: Train<TestBackend> = batcher.batch(vec![
            Sample { label: 3, text: "market rally" },
            Sample { label: 2, text: "cup final match" },
            Sample { label: 1, text: "rally" },
        ]);

        assert_eq!(batch.input.offsets, vec![0, 2, 5]);
        assert_eq!(batch.input.tokens.dims(), [6]);
        assert_eq!(
            batch.targets.into_data().convert::<i64>().value,
            vec![2, 1, 0]
        );
    }

    #[test]
    fn tokens_follow_sample_order() {
        let batcher = test_batcher();

        let batch: Infer<TestBackend> =
            batcher.batch(vec!["market rally".to_string(), "cup".to_string()]);

        // "cup" and "market" appear twice in the corpus and sort before the
        // singletons: cup=1, market=2, final=3, match=4, rally=5
        assert_eq!(
            batch.tokens.into_data().convert::<i64>().value,
            vec![2, 5, 1]
        );
        assert_eq!(batch.offsets, vec![0, 2]);
    }

    #[test]
    fn rejects_samples_with_malformed_labels() {
        let batcher = test_batcher();

        let batch: Train<TestBackend> = batcher.batch(vec![
            Sample { label: 1, text: "market" },
            Sample { label: 9, text: "cup" },
            Sample { label: 4, text: "final match" },
        ]);

        assert_eq!(batch.input.offsets, vec![0, 1]);
        assert_eq!(batch.input.tokens.dims(), [3]);
        assert_eq!(
            batch.targets.into_data().convert::<i64>().value,
            vec![0, 3]
        );
    }

    #[test]
    fn empty_texts_yield_empty_runs() {
        let batcher = test_batcher();

        let batch: Infer<TestBackend> =
            batcher.batch(vec!["".to_string(), "market".to_string()]);

        assert_eq!(batch.offsets, vec![0, 0]);
        assert_eq!(batch.tokens.dims(), [1]);
    }
}
