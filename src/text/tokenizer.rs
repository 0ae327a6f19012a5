use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Normalization rules applied in order before splitting on whitespace
    static ref RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\'").unwrap(), " ' "),
        (Regex::new(r#"""#).unwrap(), ""),
        (Regex::new(r"\.").unwrap(), " . "),
        (Regex::new(r"<br \/>").unwrap(), " "),
        (Regex::new(r",").unwrap(), " , "),
        (Regex::new(r"\(").unwrap(), " ( "),
        (Regex::new(r"\)").unwrap(), " ) "),
        (Regex::new(r"\!").unwrap(), " ! "),
        (Regex::new(r"\?").unwrap(), " ? "),
        (Regex::new(r"\;").unwrap(), " "),
        (Regex::new(r"\:").unwrap(), " "),
        (Regex::new(r"\s+").unwrap(), " "),
    ];
}

/// A trait for tokenizers that split raw text into word tokens
pub trait Tokenizer: Send + Sync {
    /// Split the given text into a sequence of tokens
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// A simple English word tokenizer: lowercases the input, spaces out
/// punctuation, and splits on whitespace
#[derive(Clone, Debug, Default)]
pub struct BasicEnglishTokenizer;

impl Tokenizer for BasicEnglishTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut normalized = text.to_lowercase();

        for (pattern, replacement) in RULES.iter() {
            normalized = pattern.replace_all(&normalized, *replacement).into_owned();
        }

        normalized.split_whitespace().map(str::to_string).collect()
    }
}
