//! # News Classifier
#![forbid(unsafe_code)]

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Text processing
pub mod text;

/// Error macros
#[macro_use]
extern crate anyhow;
