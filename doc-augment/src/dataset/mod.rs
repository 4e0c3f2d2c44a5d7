//! Batch processing over folders of document images.

mod batch;
mod engine;
mod files;
mod split;

pub use batch::*;
pub use engine::*;
pub use files::*;
pub use split::*;
