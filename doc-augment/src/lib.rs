//! Dataset preparation for document forgery classifiers.
//!
//! The crate turns a folder of scanned identity documents into training
//! data. It hides personal fields, synthesizes forged variants, cleans up
//! scans and expands the images with randomized augmentation pipelines split
//! into training and validation sets.

mod common;
pub mod anonymize;
pub mod config;
pub mod dataset;
pub mod forgery;
pub mod preprocess;
pub mod processor;
pub mod raster;
pub mod utils;

pub use anonymize::{Anonymizer, DocumentKind, NamedRegion, RedactionMethod};
pub use config::Config;
pub use dataset::{AugmentationEngine, AugmentationEngineInit, BatchReport, DatasetSplitter};
pub use forgery::{ForgeryGenerator, ForgeryMethod};
pub use preprocess::{PreprocessConfig, Preprocessor};
pub use processor::{PipelineInit, PipelineVariant, TransformPipeline, TransformStep};
pub use raster::Image;
