use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification;

/// The name of the AG News dataset
pub static DATASET: &str = "ag-news";

/// Define a struct for AG News classification items
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The raw 1-based class label from the corpus
    pub label: i64,

    /// The headline of the article
    pub title: String,

    /// The body of the article
    pub description: String,
}

impl text_classification::Item for Item {
    fn input(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    fn raw_label(&self) -> i64 {
        self.label
    }
}

/// Struct for the AG News dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

/// Implement the Dataset trait for the AG News dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

// Implement methods for constructing the AG News dataset
impl Dataset {
    /// Constructs the dataset for a mode (either "train" or "test")
    ///
    /// Expects the headerless CSV distribution of the corpus at
    /// `{data_dir}/datasets/ag-news/{mode}.csv`, one `label,title,description`
    /// row per article.
    pub async fn load(data_dir: &str, mode: &str) -> std::io::Result<Self> {
        let dataset_dir = format!("{}/datasets/{}", data_dir, DATASET);

        let mut reader = csv::ReaderBuilder::new();
        reader.has_headers(false);

        let dataset: InMemDataset<Item> =
            InMemDataset::from_csv(format!("{}/{}.csv", dataset_dir, mode), &reader)?;

        Ok(Self { dataset })
    }
}
