use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

/// The sentinel token reserved for out-of-vocabulary words
pub static UNK_TOKEN: &str = "<unk>";

/// A fixed one-to-one mapping from distinct tokens to contiguous integer
/// indices, with a designated default index returned for absent tokens
#[derive(Clone, Debug)]
pub struct Vocab {
    /// Tokens in index order
    tokens: Vec<String>,

    /// Reverse mapping from token to index
    index: HashMap<String, usize>,

    /// The index returned for tokens not present in the vocabulary
    default_index: usize,
}

/// On-disk form of the vocabulary
#[derive(Serialize, Deserialize)]
struct VocabRecord {
    tokens: Vec<String>,
    default_index: usize,
}

impl Vocab {
    pub(crate) fn from_tokens(tokens: Vec<String>, default_index: usize) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();

        Self {
            tokens,
            index,
            default_index,
        }
    }

    /// Look up the index assigned to a token, falling back to the default
    /// index for tokens outside the vocabulary
    pub fn lookup(&self, token: &str) -> usize {
        self.index.get(token).copied().unwrap_or(self.default_index)
    }

    /// The token assigned to an index, if the index is in range
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Number of tokens in the vocabulary
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the vocabulary holds no tokens at all
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Write the vocabulary to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let record = VocabRecord {
            tokens: self.tokens.clone(),
            default_index: self.default_index,
        };

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &record)?;

        Ok(())
    }

    /// Read a vocabulary back from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let record: VocabRecord = serde_json::from_reader(reader)?;

        Ok(Self::from_tokens(record.tokens, record.default_index))
    }
}

/// Accumulates token counts over a corpus and assembles a [`Vocab`]
///
/// Special tokens are assigned the leading indices in the order given; the
/// remaining distinct tokens follow in descending corpus frequency, with ties
/// broken by ascending lexicographic order. The default index is 0, so the
/// first special doubles as the unknown-token sentinel.
pub struct VocabBuilder {
    specials: Vec<String>,
    counts: HashMap<String, usize>,
}

impl VocabBuilder {
    /// Creates a builder reserving the given special tokens first
    pub fn new(specials: &[&str]) -> Self {
        Self {
            specials: specials.iter().map(|s| (*s).to_string()).collect(),
            counts: HashMap::new(),
        }
    }

    /// Feed one token sequence from the corpus into the builder
    pub fn push_tokens<I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = String>,
    {
        for token in tokens {
            *self.counts.entry(token).or_insert(0) += 1;
        }
    }

    /// Consume the accumulated counts and produce the final vocabulary
    pub fn build(self) -> Vocab {
        let mut entries: Vec<(String, usize)> = self
            .counts
            .into_iter()
            .filter(|(token, _)| !self.specials.contains(token))
            .collect();

        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut tokens = self.specials;
        tokens.extend(entries.into_iter().map(|(token, _)| token));

        Vocab::from_tokens(tokens, 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn corpus_vocab() -> Vocab {
        let mut builder = VocabBuilder::new(&[UNK_TOKEN]);
        builder.push_tokens(["the", "market", "fell"].map(String::from));
        builder.push_tokens(["the", "market", "rose"].map(String::from));
        builder.push_tokens(["the", "cup", "final"].map(String::from));
        builder.build()
    }

    #[test]
    fn reserves_specials_first() {
        let vocab = corpus_vocab();

        assert_eq!(vocab.token(0), Some(UNK_TOKEN));
        assert_eq!(vocab.lookup(UNK_TOKEN), 0);
    }

    #[test]
    fn orders_by_frequency_then_lexicographically() {
        let vocab = corpus_vocab();

        // "the" x3, "market" x2, then the four singletons in lexicographic order
        assert_eq!(vocab.lookup("the"), 1);
        assert_eq!(vocab.lookup("market"), 2);
        assert_eq!(vocab.lookup("cup"), 3);
        assert_eq!(vocab.lookup("fell"), 4);
        assert_eq!(vocab.lookup("final"), 5);
        assert_eq!(vocab.lookup("rose"), 6);
        assert_eq!(vocab.len(), 7);
    }

    #[test]
    fn lookups_are_stable() {
        let vocab = corpus_vocab();

        for token in ["the", "market", "fell", "rose", "cup", "final"] {
            assert_eq!(vocab.lookup(token), vocab.lookup(token));
        }
    }

    #[test]
    fn unknown_tokens_map_to_the_default_index() {
        let vocab = corpus_vocab();

        assert_eq!(vocab.lookup("blockchain"), 0);
        assert_eq!(vocab.lookup(""), 0);
    }

    #[test]
    fn empty_corpus_yields_only_specials() {
        let vocab = VocabBuilder::new(&[UNK_TOKEN]).build();

        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.token(0), Some(UNK_TOKEN));
    }

    #[test]
    fn corpus_occurrences_of_a_special_are_not_reassigned() {
        let mut builder = VocabBuilder::new(&[UNK_TOKEN]);
        builder.push_tokens([UNK_TOKEN.to_string(), "word".to_string()]);
        let vocab = builder.build();

        assert_eq!(vocab.lookup(UNK_TOKEN), 0);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn survives_a_save_and_load_round_trip() {
        let vocab = corpus_vocab();
        let path = std::env::temp_dir().join(format!("vocab-test-{}.json", std::process::id()));

        vocab.save(&path).unwrap();
        let restored = Vocab::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.len(), vocab.len());
        assert_eq!(restored.lookup("market"), vocab.lookup("market"));
        assert_eq!(restored.lookup("blockchain"), 0);
    }
}
