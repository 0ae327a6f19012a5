//! Command line tool for inference

use anyhow::Result;
use burn::backend::{ndarray::NdArrayDevice, NdArray};
use news_classifier::{
    datasets::ag_news,
    pipelines::{text_classification, Pipeline},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer PIPELINE [OPTIONS]

Arguments:
  PIPELINE             The pipeline to use (e.g., 'text-classification')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The pipeline to use
    pipeline: String,

    /// The path to the top-level data directory
    data_dir: Option<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let args = Args {
        help: pargs.contains(["-h", "--help"]),
        data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
        pipeline: pargs.free_from_str()?,
    };

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let _ = Pipeline::try_from(args.pipeline.as_str())?;

    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());
    let artifact_dir = text_classification::training::artifact_dir(&data_dir, ag_news::DATASET);

    let samples = vec![
        (
            "Oil prices soar to all-time record as OPEC trims output",
            "Business",
        ),
        (
            "Rahm seizes three-stroke lead with a flawless 62 at TPC Southwind",
            "Sports",
        ),
        (
            "NASA probe beams back first close-up images of Mercury's surface",
            "Sci/Tech",
        ),
        (
            "Ceasefire talks resume as delegations arrive in Geneva",
            "World",
        ),
        (
            "Chip maker unveils a low-power processor for handheld devices",
            "Sci/Tech",
        ),
        (
            "Wall St. bears claw back into the black after a volatile week",
            "Business",
        ),
    ];

    let input: Vec<String> = samples.iter().map(|(s, _)| (*s).to_string()).collect();

    let device = NdArrayDevice::Cpu;

    // Get model predictions
    let (predictions, config) =
        text_classification::infer::<NdArray>(device, &artifact_dir, input)?;

    // Print out predictions for each sample
    for (i, (text, expected)) in samples.into_iter().enumerate() {
        // Get predictions for current sample
        #[allow(clippy::single_range_in_vec_init)]
        let prediction = predictions.clone().slice([i..i + 1]);

        let class_index = prediction.argmax(1).into_data().convert::<i64>().value[0] as usize;
        let class = &config.labels[class_index];

        // Print sample text and predicted class name
        println!(
            "\n=== Item {i} ===\
             \n- Text: {text}\
             \n- Class: {class}\
             \n- Expected: {expected}\
             \n================"
        );
    }

    Ok(())
}
