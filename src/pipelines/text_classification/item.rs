use std::fmt::Debug;

/// A trait for items that can be used for text classification
pub trait Item: Send + Sync + Clone + Debug {
    /// Returns the input text for the item
    fn input(&self) -> String;

    /// Returns the raw 1-based corpus label for the item
    fn raw_label(&self) -> i64;
}
