//! Rectangle types for locating fields on document images.

mod common;

pub use hw::*;
pub mod hw;

pub use rect::*;
pub mod rect;

pub use tlbr::*;
pub mod tlbr;

pub use transform::*;
mod transform;

pub use ratio::*;
pub mod ratio;

pub mod prelude {
    pub use crate::rect::{Rect, RectNum};
}
