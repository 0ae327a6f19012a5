use burn::{
    module::Module,
    nn::{
        loss::CrossEntropyLossConfig, Embedding, EmbeddingConfig, Initializer, Linear,
        LinearConfig,
    },
    tensor::{backend::Backend, Int, Tensor},
    train::ClassificationOutput,
};

use super::batcher::{Infer, Train};

/// Symmetric range for the uniform weight initialization
const INIT_RANGE: f64 = 0.5;

/// Define configuration struct for the model
#[derive(burn::config::Config)]
pub struct ModelConfig {
    /// Number of tokens in the vocabulary
    pub vocab_size: usize,

    /// Class name labels, indexed by class id
    pub labels: Vec<String>,

    /// Size of the embedding vectors
    #[config(default = 64)]
    pub embed_dim: usize,
}

impl ModelConfig {
    /// The number of classes in the label set
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// Initialize the model
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let initializer = Initializer::Uniform {
            min: -INIT_RANGE,
            max: INIT_RANGE,
        };

        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim)
            .with_initializer(initializer.clone())
            .init(device);

        let mut output = LinearConfig::new(self.embed_dim, self.num_classes())
            .with_initializer(initializer)
            .init(device);
        output.bias = output.bias.map(|bias| bias.map(|tensor| tensor.zeros_like()));

        Model {
            embedding,
            output,
            embed_dim: self.embed_dim,
        }
    }
}

/// A bag-of-embeddings classifier: token embeddings are mean-pooled per
/// sample and projected to class logits by a linear layer
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// The embedding table
    embedding: Embedding<B>,

    /// The linear classification head
    output: Linear<B>,

    /// Size of the embedding vectors
    embed_dim: usize,
}

impl<B: Backend> Model<B> {
    /// Perform a forward pass over a flattened token buffer
    ///
    /// Each sample is the run of token indices starting at its offset and
    /// ending at the next offset (or the end of the buffer). A sample with an
    /// empty run pools to the zero vector, matching the mean-mode
    /// embedding-bag convention. Returns logits of shape
    /// `[batch_size, num_classes]`.
    #[allow(clippy::single_range_in_vec_init)]
    pub fn forward(&self, tokens: Tensor<B, 1, Int>, offsets: &[usize]) -> Tensor<B, 2> {
        let device = tokens.device();
        let [total_tokens] = tokens.dims();

        let embedded = if total_tokens > 0 {
            Some(
                self.embedding
                    .forward(tokens.reshape([1, total_tokens]))
                    .squeeze::<2>(0),
            )
        } else {
            None
        };

        let mut bags = Vec::with_capacity(offsets.len());
        for (index, &start) in offsets.iter().enumerate() {
            let end = offsets.get(index + 1).copied().unwrap_or(total_tokens);

            let bag = match (&embedded, end > start) {
                (Some(embedded), true) => embedded.clone().slice([start..end]).mean_dim(0),
                _ => Tensor::zeros([1, self.embed_dim], &device),
            };

            bags.push(bag);
        }

        self.output.forward(Tensor::cat(bags, 0))
    }

    /// Forward pass plus cross-entropy loss against the batch targets
    pub fn forward_classification(&self, item: Train<B>) -> ClassificationOutput<B> {
        let targets = item.targets;
        let logits = self.forward(item.input.tokens, &item.input.offsets);

        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets.clone());

        ClassificationOutput::new(loss, logits, targets)
    }

    /// Defines forward pass for inference
    pub fn infer(&self, item: Infer<B>) -> Tensor<B, 2> {
        self.forward(item.tokens, &item.offsets)
    }
}

#[cfg(test)]
#[allow(clippy::single_range_in_vec_init)]
mod tests {
    use burn::{
        backend::{ndarray::NdArrayDevice, NdArray},
        tensor::{Data, ElementConversion, Shape},
    };
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray<f32>;

    fn labels() -> Vec<String> {
        ["World", "Sports", "Business", "Sci/Tech"]
            .map(String::from)
            .to_vec()
    }

    fn tokens(values: &[i64]) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_data(
            Data::new(
                values.iter().map(|v| v.elem()).collect(),
                Shape::new([values.len()]),
            ),
            &NdArrayDevice::Cpu,
        )
    }

    #[test]
    fn produces_one_logit_vector_per_sample() {
        let device = NdArrayDevice::Cpu;
        let model = ModelConfig::new(10, labels()).init::<TestBackend>(&device);

        let logits = model.forward(tokens(&[1, 2, 3, 4, 5]), &[0, 2]);

        assert_eq!(logits.dims(), [2, 4]);
    }

    #[test]
    fn empty_samples_pool_to_zero_logits() {
        let device = NdArrayDevice::Cpu;
        let model = ModelConfig::new(10, labels()).init::<TestBackend>(&device);

        // Sample 1 has an empty token run; with the zero-initialized bias its
        // logits are exactly zero
        let logits = model.forward(tokens(&[1, 2, 3]), &[0, 3]);

        assert_eq!(logits.dims(), [2, 4]);

        let empty_row = logits.slice([1..2]).into_data().convert::<f64>().value;
        assert_eq!(empty_row, vec![0.0; 4]);
    }

    #[test]
    fn handles_a_batch_with_no_tokens_at_all() {
        let device = NdArrayDevice::Cpu;
        let model = ModelConfig::new(10, labels()).init::<TestBackend>(&device);

        let logits = model.forward(tokens(&[]), &[0, 0]);

        assert_eq!(logits.dims(), [2, 4]);
    }

    #[test]
    fn identical_runs_produce_identical_logits() {
        let device = NdArrayDevice::Cpu;
        let model = ModelConfig::new(10, labels()).init::<TestBackend>(&device);

        let logits = model.forward(tokens(&[7, 8, 7, 8]), &[0, 2]);

        let first = logits.clone().slice([0..1]).into_data().convert::<f64>().value;
        let second = logits.slice([1..2]).into_data().convert::<f64>().value;

        assert_eq!(first, second);
    }
}
