/// Text Classification
pub mod text_classification;

/// Available Pipelines
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Pipeline {
    /// Text Classification
    TextClassification,
}

impl Pipeline {
    /// Get the unique string token that identifies this pipeline
    pub fn as_str(&self) -> &str {
        match self {
            Pipeline::TextClassification => text_classification::PIPELINE,
        }
    }
}

impl TryFrom<&str> for Pipeline {
    type Error = PipelineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == text_classification::PIPELINE {
            Ok(Pipeline::TextClassification)
        } else {
            Err(PipelineError::Unknown(value.to_string()))
        }
    }
}

/// Pipeline Error
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// No pipeline found for the given string
    #[error("no pipeline found for {0}")]
    Unknown(String),
}
