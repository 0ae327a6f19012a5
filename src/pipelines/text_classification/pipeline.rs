use crate::text::{tokenizer::Tokenizer, vocab::Vocab};

/// Maps raw text to a sequence of vocabulary indices
///
/// Pure and stateless given a fixed vocabulary, so one instance can be shared
/// across data-loader workers.
pub struct TextPipeline {
    tokenizer: Box<dyn Tokenizer>,
    vocab: Vocab,
}

impl TextPipeline {
    /// Creates a new pipeline from a tokenizer and a finalized vocabulary
    pub fn new(tokenizer: impl Tokenizer + 'static, vocab: Vocab) -> Self {
        Self {
            tokenizer: Box::new(tokenizer),
            vocab,
        }
    }

    /// Tokenize a text and map each token through the vocabulary, with
    /// unknown tokens mapping to the default index
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .map(|token| self.vocab.lookup(&token))
            .collect()
    }

    /// The vocabulary backing this pipeline
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }
}

/// Map a raw 1-based corpus label to a zero-based class id
pub fn label_to_class(raw_label: i64, num_classes: usize) -> Result<usize, LabelError> {
    if raw_label < 1 || raw_label > num_classes as i64 {
        return Err(LabelError::OutOfRange {
            label: raw_label,
            num_classes,
        });
    }

    Ok((raw_label - 1) as usize)
}

/// Label Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LabelError {
    /// The raw label falls outside the expected label set
    #[error("label {label} is outside the expected range 1..={num_classes}")]
    OutOfRange {
        /// The offending raw label
        label: i64,

        /// The number of classes in the label set
        num_classes: usize,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::text::{
        tokenizer::BasicEnglishTokenizer,
        vocab::{Vocab, UNK_TOKEN},
    };

    use super::*;

    #[test]
    fn encodes_through_the_vocabulary() {
        // A vocabulary with "here", "is", "an", and "example" pinned at the
        // indices the corpus frequencies would assign them
        let mut tokens: Vec<String> = (0..5287).map(|i| format!("tok{i}")).collect();
        tokens[0] = UNK_TOKEN.to_string();
        tokens[475] = "here".to_string();
        tokens[21] = "is".to_string();
        tokens[30] = "an".to_string();
        tokens[5286] = "example".to_string();

        let pipeline = TextPipeline::new(BasicEnglishTokenizer, Vocab::from_tokens(tokens, 0));

        assert_eq!(pipeline.encode("here is an example"), vec![475, 21, 30, 5286]);
    }

    #[test]
    fn unknown_words_encode_to_the_default_index() {
        let tokens = vec![UNK_TOKEN.to_string(), "known".to_string()];
        let pipeline = TextPipeline::new(BasicEnglishTokenizer, Vocab::from_tokens(tokens, 0));

        assert_eq!(pipeline.encode("known unknown known"), vec![1, 0, 1]);
    }

    #[test]
    fn labels_map_to_zero_based_classes() {
        for (raw, class) in [(1, 0), (2, 1), (3, 2), (4, 3)] {
            assert_eq!(label_to_class(raw, 4), Ok(class));
        }
    }

    #[test]
    fn label_ten_of_ten_maps_to_nine() {
        assert_eq!(label_to_class(10, 10), Ok(9));
    }

    #[test]
    fn out_of_range_labels_are_rejected() {
        assert!(label_to_class(0, 4).is_err());
        assert!(label_to_class(5, 4).is_err());
        assert!(label_to_class(-3, 4).is_err());
    }
}
