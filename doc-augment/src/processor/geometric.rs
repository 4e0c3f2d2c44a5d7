//! Geometric distortions. Uncovered areas are filled with white paper.

use crate::{common::*, raster::Image};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

pub fn rotate(image: &Image, degrees: f64) -> Image {
    shift_scale_rotate(image, 0.0, 0.0, 1.0, degrees)
}

/// Scale and rotate about the image center, then shift by `(dx, dy)` pixels.
pub fn shift_scale_rotate(image: &Image, dx: f64, dy: f64, scale: f64, degrees: f64) -> Image {
    let cx = image.width() as f32 / 2.0;
    let cy = image.height() as f32 / 2.0;

    // the right-most factor applies first
    let projection = Projection::translate(cx + dx as f32, cy + dy as f32)
        * Projection::rotate((degrees as f32).to_radians())
        * Projection::scale(scale as f32, scale as f32)
        * Projection::translate(-cx, -cy);

    warp_white(image, &projection)
}

/// Stretch the quadrilateral with corners moved inward by `offsets` onto the
/// full frame.
///
/// Offsets are fractions of the width and height, given for the top-left,
/// top-right, bottom-right and bottom-left corners. The image is returned
/// unchanged if the corners are degenerate.
pub fn perspective(image: &Image, offsets: [(f64, f64); 4]) -> Image {
    let w = image.width() as f32;
    let h = image.height() as f32;
    let [tl, tr, br, bl] = offsets.map(|(dx, dy)| (dx as f32 * w, dy as f32 * h));

    let from = [
        (tl.0, tl.1),
        (w - tr.0, tr.1),
        (w - br.0, h - br.1),
        (bl.0, h - bl.1),
    ];
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    match Projection::from_control_points(from, to) {
        Some(projection) => warp_white(image, &projection),
        None => image.clone(),
    }
}

fn warp_white(image: &Image, projection: &Projection) -> Image {
    match image {
        Image::Gray(buf) => Image::Gray(warp(
            buf,
            projection,
            Interpolation::Bilinear,
            Luma([255]),
        )),
        Image::Rgb(buf) => Image::Rgb(warp(
            buf,
            projection,
            Interpolation::Bilinear,
            Rgb([255, 255, 255]),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Image {
        let mut image = Image::filled(60, 80, 3, 255).unwrap();
        image.fill_rect(30, 20, 49, 39, 0);
        image
    }

    #[test]
    fn identity_rotation() {
        let image = page();
        assert_eq!(rotate(&image, 0.0), image);
    }

    #[test]
    fn rotation_fills_white() {
        let image = Image::filled(60, 80, 1, 0).unwrap();
        let rotated = rotate(&image, 30.0);
        let Image::Gray(buf) = &rotated else { unreachable!() };
        assert_eq!((buf.width(), buf.height()), (80, 60));
        assert_eq!(buf.get_pixel(0, 0).0[0], 255);
        assert_eq!(buf.get_pixel(40, 30).0[0], 0);
    }

    #[test]
    fn shift_moves_content() {
        let image = page();
        let shifted = shift_scale_rotate(&image, 10.0, 0.0, 1.0, 0.0);
        let Image::Rgb(buf) = &shifted else { unreachable!() };
        assert_eq!(buf.get_pixel(35, 30).0, [255, 255, 255]);
        assert_eq!(buf.get_pixel(45, 30).0, [0, 0, 0]);
        assert_eq!(buf.get_pixel(2, 2).0, [255, 255, 255]);
    }

    #[test]
    fn perspective_keeps_shape() {
        let image = page();
        let warped = perspective(&image, [(0.05, 0.02), (0.03, 0.04), (0.01, 0.05), (0.02, 0.0)]);
        assert_eq!((warped.height(), warped.width()), (60, 80));
        assert_ne!(warped, image);
    }
}
