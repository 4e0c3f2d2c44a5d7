//! Contrast limited adaptive histogram equalization.

use crate::{common::*, utils};

/// Histogram clip limit relative to a uniform histogram.
pub const CLAHE_CLIP_LIMIT: f64 = 3.0;
/// Number of tiles along each axis.
pub const CLAHE_GRID_SIZE: u32 = 8;

/// Equalize the histogram of each tile with clipping and blend the tile
/// mappings bilinearly.
///
/// The grid is shrunk on images with fewer pixels than tiles along an axis.
pub fn clahe(image: &GrayImage, clip_limit: f64, grid_size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let grid_x = grid_size.clamp(1, width);
    let grid_y = grid_size.clamp(1, height);
    let span = |index: u32, count: u32, size: u32| {
        (index * size / count, (index + 1) * size / count)
    };

    let tables: Vec<[u8; 256]> = (0..grid_y)
        .cartesian_product(0..grid_x)
        .map(|(tile_y, tile_x)| {
            let (top, bottom) = span(tile_y, grid_y, height);
            let (left, right) = span(tile_x, grid_x, width);

            let mut histogram = [0u32; 256];
            (top..bottom)
                .cartesian_product(left..right)
                .for_each(|(y, x)| histogram[image.get_pixel(x, y).0[0] as usize] += 1);

            tile_table(histogram, (bottom - top) * (right - left), clip_limit)
        })
        .collect();

    let tile_h = height as f64 / grid_y as f64;
    let tile_w = width as f64 / grid_x as f64;

    GrayImage::from_fn(width, height, |x, y| {
        let (y0, y1, wy) = neighbor_tiles(y, tile_h, grid_y);
        let (x0, x1, wx) = neighbor_tiles(x, tile_w, grid_x);
        let value = image.get_pixel(x, y).0[0] as usize;
        let mapped = |tile_y: u32, tile_x: u32| {
            tables[(tile_y * grid_x + tile_x) as usize][value] as f64
        };

        let top = mapped(y0, x0) * (1.0 - wx) + mapped(y0, x1) * wx;
        let bottom = mapped(y1, x0) * (1.0 - wx) + mapped(y1, x1) * wx;
        Luma([utils::saturate(top * (1.0 - wy) + bottom * wy)])
    })
}

/// The equalization table of one tile. Counts above the clip limit are
/// spread over the whole histogram.
fn tile_table(mut histogram: [u32; 256], area: u32, clip_limit: f64) -> [u8; 256] {
    let limit = ((clip_limit * area as f64 / 256.0) as u32).max(1);

    let clipped: u32 = histogram
        .iter_mut()
        .map(|count| {
            let excess = count.saturating_sub(limit);
            *count -= excess;
            excess
        })
        .sum();

    let batch = clipped / 256;
    let residual = (clipped % 256) as usize;
    histogram.iter_mut().for_each(|count| *count += batch);
    if residual > 0 {
        let step = (256 / residual).max(1);
        histogram
            .iter_mut()
            .step_by(step)
            .take(residual)
            .for_each(|count| *count += 1);
    }

    let scale = 255.0 / area as f64;
    let mut table = [0u8; 256];
    let mut cumulative = 0;
    histogram
        .iter()
        .zip(table.iter_mut())
        .for_each(|(&count, entry)| {
            cumulative += count;
            *entry = utils::saturate(cumulative as f64 * scale);
        });
    table
}

/// The two tiles whose centers surround `pos` and the weight of the second.
fn neighbor_tiles(pos: u32, tile_size: f64, count: u32) -> (u32, u32, f64) {
    let last = (count - 1) as f64;
    let center = (pos as f64 + 0.5) / tile_size - 0.5;
    let lower = center.floor().clamp(0.0, last);
    let upper = (lower + 1.0).min(last);
    let weight = (center - lower).clamp(0.0, 1.0);
    (lower as u32, upper as u32, weight)
}
