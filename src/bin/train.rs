//! Command line tool to trigger training

use anyhow::{anyhow, Result};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use news_classifier::{
    datasets::ag_news,
    pipelines::{text_classification, Pipeline},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train PIPELINE [OPTIONS]

Arguments:
  PIPELINE             The pipeline to use (e.g., 'text-classification')

Options:
  -h, --help           Print help
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
";

/// A sports article the model has never seen, classified after training
const EXAMPLE: &str = "MEMPHIS, Tenn. - Four days ago, Jon Rahm was enduring the season's \
    worst weather conditions on Sunday at The Open on his way to a closing 75 at Royal \
    Portrush, which considering the wind and the rain was a respectable showing. Thursday's \
    first round at the WGC-FedEx St. Jude Invitational was another story. With temperatures \
    in the mid-80s and hardly any wind, the Spaniard was 13 strokes better in a flawless \
    round. Thanks to his best putting performance on the PGA Tour, Rahm finished with an \
    8-under 62 for a three-stroke lead, which was even more impressive considering he'd \
    never played the front nine at TPC Southwind.";

#[derive(Debug)]
struct Args {
    pipeline: String,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    data_dir: Option<String>,
}

impl Args {
    fn parse() -> Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            pipeline: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: PIPELINE"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let output = Args::parse()?;

    if output.is_none() {
        print!("{}", HELP);

        return Ok(());
    }
    let args = output.unwrap();

    let pipeline = Pipeline::try_from(args.pipeline.as_str())?;

    match pipeline {
        Pipeline::TextClassification => handle_text_classification(&args).await,
    }
}

async fn handle_text_classification(args: &Args) -> Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| "data".to_string());

    let train = ag_news::Dataset::load(&data_dir, "train").await?;
    let test = ag_news::Dataset::load(&data_dir, "test").await?;

    let mut config =
        text_classification::training::Config::new_for_dataset(&data_dir, ag_news::DATASET).await?;

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    let device = NdArrayDevice::Cpu;
    text_classification::train::<Autodiff<NdArray>, ag_news::Item, ag_news::Dataset>(
        vec![device],
        train,
        test,
        config,
    )
    .await?;

    // Classify the example article with the freshly trained model
    let artifact_dir = text_classification::training::artifact_dir(&data_dir, ag_news::DATASET);

    let (predictions, config) =
        text_classification::infer::<NdArray>(device, &artifact_dir, vec![EXAMPLE.to_string()])?;

    let class_index = predictions.argmax(1).into_data().convert::<i64>().value[0] as usize;

    println!("This is a {} news", config.labels[class_index]);

    Ok(())
}
