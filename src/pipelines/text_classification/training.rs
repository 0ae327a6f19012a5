use std::{sync::Arc, time::Instant};

use burn::{
    config::Config as _,
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    grad_clipping::GradientClippingConfig,
    module::{AutodiffModule, Module},
    optim::{GradientsParams, Optimizer, SgdConfig},
    record::{CompactRecorder, Recorder},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor,
    },
    LearningRate,
};
use log::info;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, Lines},
};

use crate::{
    datasets::random_split,
    text::{
        tokenizer::{BasicEnglishTokenizer, Tokenizer},
        vocab::{VocabBuilder, UNK_TOKEN},
    },
};

use super::{batcher::Train, Batcher, Item, Model, ModelConfig, TextPipeline};

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Config {
    /// Batch size
    #[config(default = 64)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 10)]
    pub num_epochs: usize,

    /// Initial learning rate
    #[config(default = 5.0)]
    pub learning_rate: LearningRate,

    /// Multiplicative decay applied to the learning rate when validation
    /// accuracy fails to improve on the best seen so far
    #[config(default = 0.1)]
    pub lr_decay: f64,

    /// Maximum gradient L2 norm
    #[config(default = 0.1)]
    pub gradient_clip: f32,

    /// Size of the embedding vectors
    #[config(default = 64)]
    pub embed_dim: usize,

    /// Fraction of the training split kept for training; the remainder is
    /// held out for validation
    #[config(default = 0.95)]
    pub train_ratio: f64,

    /// Batches between progress reports
    #[config(default = 500)]
    pub log_interval: usize,

    /// Seed for the train/validation split and batch shuffling
    #[config(default = 42)]
    pub seed: u64,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// The dataset to use (e.g., "ag-news")
    pub dataset_name: String,

    /// Class labels for the selected dataset
    pub labels: Vec<String>,
}

impl Config {
    /// Load configuration for a dataset, reading the class labels from the
    /// `classes.txt` file distributed with it
    pub async fn new_for_dataset(data_dir: &str, dataset_name: &str) -> io::Result<Self> {
        let labels = read_file(&format!("{data_dir}/datasets/{dataset_name}/classes.txt"))
            .await?
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>();

        Ok(Config::new(dataset_name.to_string(), labels).with_data_dir(data_dir.to_string()))
    }
}

/// The directory holding the trained artifacts for a dataset
pub fn artifact_dir(data_dir: &str, dataset_name: &str) -> String {
    format!("{data_dir}/text-classification/{dataset_name}")
}

async fn file_reader(path: &str) -> io::Result<Lines<io::BufReader<File>>> {
    let f = File::open(path).await?;

    Ok(io::BufReader::new(f).lines())
}

async fn read_file(path: &str) -> io::Result<Vec<String>> {
    let mut r = file_reader(path).await?;
    let mut lines = Vec::new();

    while let Some(line) = r.next_line().await? {
        lines.push(line);
    }

    Ok(lines)
}

/// Define train function
pub async fn train<B, I, D>(
    devices: Vec<B::Device>, // Device on which to perform computation (e.g., CPU or CUDA device)
    dataset_train: D,        // Training dataset
    dataset_test: D,         // Testing dataset
    config: Config,          // Experiment configuration
) -> anyhow::Result<()>
where
    B: AutodiffBackend,
    I: Item + 'static,
    D: Dataset<I> + 'static,
{
    let device = &devices[0];
    let artifact_dir = artifact_dir(&config.data_dir, &config.dataset_name);

    if config.labels.is_empty() {
        return Err(anyhow!(
            "no class labels are defined for dataset {}",
            config.dataset_name
        ));
    }

    B::seed(config.seed);

    // Build the vocabulary with a single pass over the raw training corpus
    let tokenizer = BasicEnglishTokenizer;
    let mut builder = VocabBuilder::new(&[UNK_TOKEN]);
    for index in 0..dataset_train.len() {
        if let Some(item) = dataset_train.get(index) {
            builder.push_tokens(tokenizer.tokenize(&item.input()));
        }
    }
    let vocab = builder.build();
    info!("Built a vocabulary of {} tokens", vocab.len());

    let model_config = ModelConfig::new(vocab.len(), config.labels.clone())
        .with_embed_dim(config.embed_dim);
    let pipeline = Arc::new(TextPipeline::new(tokenizer, vocab));

    // Hold out a validation portion of the training split
    let (dataset_train, dataset_valid) =
        random_split(dataset_train, config.train_ratio, config.seed);

    // Initialize batchers for training and evaluation data
    let batcher_train = Batcher::<B>::new(pipeline.clone(), config.labels.len(), device.clone());
    let batcher_eval =
        Batcher::<B::InnerBackend>::new(pipeline.clone(), config.labels.len(), device.clone());

    let workers = std::thread::available_parallelism()?;

    // Initialize data loaders for the three splits
    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(workers.into())
        .build(dataset_train);

    let dataloader_valid = DataLoaderBuilder::new(batcher_eval.clone())
        .batch_size(config.batch_size)
        .num_workers(workers.into())
        .build(dataset_valid);

    let dataloader_test = DataLoaderBuilder::new(batcher_eval)
        .batch_size(config.batch_size)
        .num_workers(workers.into())
        .build(dataset_test);

    let mut model = model_config.init::<B>(device);

    // Initialize optimizer
    let mut optimizer = SgdConfig::new()
        .with_gradient_clipping(Some(GradientClippingConfig::Norm(config.gradient_clip)))
        .init();

    let mut lr = config.learning_rate;
    let mut best_accuracy: Option<f64> = None;

    let batches_total = dataloader_train.num_items().div_ceil(config.batch_size);

    for epoch in 1..=config.num_epochs {
        let epoch_start = Instant::now();

        let mut total_correct = 0;
        let mut total_count = 0;

        for (batch_index, batch) in dataloader_train.iter().enumerate() {
            let output = model.forward_classification(batch);

            total_correct += count_correct(&output.output, &output.targets);
            total_count += output.targets.dims()[0];

            let grads = GradientsParams::from_grads(output.loss.backward(), &model);
            model = optimizer.step(lr, model, grads);

            if batch_index > 0 && batch_index % config.log_interval == 0 && total_count > 0 {
                println!(
                    "| epoch {:3} | {:5}/{:5} batches | accuracy {:8.3}",
                    epoch,
                    batch_index,
                    batches_total,
                    total_correct as f64 / total_count as f64
                );
                total_correct = 0;
                total_count = 0;
            }
        }

        let accuracy = evaluate(&model.valid(), dataloader_valid.as_ref());

        // Decay the learning rate when validation accuracy plateaus
        match best_accuracy {
            Some(best) if best > accuracy => lr *= config.lr_decay,
            _ => best_accuracy = Some(accuracy),
        }

        println!("{}", "-".repeat(59));
        println!(
            "| end of epoch {:3} | time: {:5.2}s | valid accuracy {:8.3} ",
            epoch,
            epoch_start.elapsed().as_secs_f64(),
            accuracy
        );
        println!("{}", "-".repeat(59));
    }

    println!("Checking the results of test dataset.");
    let accuracy = evaluate(&model.valid(), dataloader_test.as_ref());
    println!("test accuracy {:8.3}", accuracy);

    // Save the configuration, the vocabulary, and the trained model
    std::fs::create_dir_all(&artifact_dir)?;

    model_config.save(format!("{artifact_dir}/config.json"))?;
    pipeline.vocab().save(format!("{artifact_dir}/vocab.json"))?;

    CompactRecorder::new()
        .record(model.into_record(), format!("{artifact_dir}/model").into())
        .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    Ok(())
}

/// Run an evaluation pass and return overall accuracy
fn evaluate<B: Backend>(model: &Model<B>, dataloader: &dyn DataLoader<Train<B>>) -> f64 {
    let mut total_correct = 0;
    let mut total_count = 0;

    for batch in dataloader.iter() {
        let logits = model.forward(batch.input.tokens, &batch.input.offsets);

        total_correct += count_correct(&logits, &batch.targets);
        total_count += batch.targets.dims()[0];
    }

    if total_count == 0 {
        return 0.0;
    }

    total_correct as f64 / total_count as f64
}

fn count_correct<B: Backend>(logits: &Tensor<B, 2>, targets: &Tensor<B, 1, Int>) -> usize {
    let predictions = logits.clone().argmax(1).flatten::<1>(0, 1);

    predictions
        .equal(targets.clone())
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
