//! Image augmentation building blocks.

pub mod color;
pub mod contrast;
pub mod geometric;
pub mod photometric;
pub mod pipeline;
pub mod step;

pub use pipeline::*;
pub use step::*;
