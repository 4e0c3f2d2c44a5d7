//! Field regions given as fractions of the document size.

use super::{Transform, HW, TLBR};
use crate::common::*;

/// A field region in ratio coordinates, `x`/`width` along the image width and
/// `y`/`height` along the image height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RatioRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        let region = Self {
            x,
            y,
            width,
            height,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<()> {
        let Self {
            x,
            y,
            width,
            height,
        } = *self;
        ensure!(
            [x, y, width, height].iter().all(|val| val.is_finite()),
            "region coordinates must be finite"
        );
        ensure!(
            width >= 0.0 && height >= 0.0,
            "region width and height must be non-negative"
        );
        Ok(())
    }

    pub fn to_tlbr(&self) -> Result<TLBR<f64>> {
        self.validate()?;
        Ok(TLBR {
            t: self.y,
            l: self.x,
            b: self.y + self.height,
            r: self.x + self.width,
        })
    }

    /// Locate the region on an image of `height` x `width` pixels.
    ///
    /// Corners are truncated toward zero and the box is clipped to the image.
    /// Returns `None` when no pixel is covered.
    pub fn to_pixel_box(&self, height: u32, width: u32) -> Result<Option<TLBR<u32>>> {
        let image_size = HW::try_from_hw([height as f64, width as f64])?;
        let transform = Transform::from_sizes_exact(&HW::unit(), &image_size)?;
        let pixel_box = (&transform * &self.to_tlbr()?)
            .trunc()
            .clip_to(&image_size)
            .and_then(|rect| rect.try_cast());
        Ok(pixel_box)
    }
}
