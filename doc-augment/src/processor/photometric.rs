//! Photometric distortions that keep the geometry intact.

use super::color::{hls_to_rgb, hsv_to_rgb, rgb_to_hls, rgb_to_hsv};
use crate::{common::*, raster::Image, utils};

/// The sigma OpenCV derives from an odd Gaussian kernel size.
pub fn kernel_sigma(kernel: usize) -> f64 {
    0.3 * ((kernel as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_blur(image: &Image, kernel: usize) -> Image {
    if kernel <= 1 {
        return image.clone();
    }
    image.blur(kernel_sigma(kernel) as f32)
}

/// Add independent N(0, std) noise to every sample.
pub fn gaussian_noise<R>(image: &mut Image, std: f64, rng: &mut R) -> Result<()>
where
    R: Rng + ?Sized,
{
    let normal = Normal::new(0.0, std)?;
    image.samples_mut().iter_mut().for_each(|sample| {
        *sample = utils::saturate(*sample as f64 + normal.sample(rng));
    });
    Ok(())
}

/// Simulate camera sensor noise.
///
/// The hue is jittered by N(0, color_shift·360·intensity) degrees and the
/// HLS lightness receives Poisson noise scaled by its own spread. Gray
/// images only receive the lightness noise.
pub fn iso_noise<R>(image: &mut Image, color_shift: f64, intensity: f64, rng: &mut R) -> Result<()>
where
    R: Rng + ?Sized,
{
    // a flat image has no lightness spread and receives no lightness noise
    let lightness_noise = |spread: f64| -> Result<Option<Poisson<f64>>> {
        let lambda = spread * intensity * 255.0;
        let poisson = if lambda > 0.0 {
            Some(Poisson::new(lambda)?)
        } else {
            None
        };
        Ok(poisson)
    };

    match image {
        Image::Gray(buf) => {
            let poisson = lightness_noise(std_dev(buf.iter().map(|&v| v as f64 / 255.0)))?;
            buf.iter_mut().for_each(|sample| {
                let lightness = *sample as f64 / 255.0;
                let noise = poisson.as_ref().map_or(0.0, |poisson| poisson.sample(rng));
                let lightness = lightness + noise / 255.0 * (1.0 - lightness);
                *sample = utils::saturate(lightness * 255.0);
            });
        }
        Image::Rgb(buf) => {
            let hls: Vec<[f64; 3]> = buf.pixels().map(|pixel| rgb_to_hls(pixel.0)).collect();
            let poisson = lightness_noise(std_dev(hls.iter().map(|[_, l, _]| *l)))?;
            let hue_noise = Normal::new(0.0, color_shift * 360.0 * intensity)?;

            buf.pixels_mut()
                .zip(hls)
                .for_each(|(pixel, [hue, lightness, saturation])| {
                    let hue = hue + hue_noise.sample(rng);
                    let noise = poisson.as_ref().map_or(0.0, |poisson| poisson.sample(rng));
                    let lightness = lightness + noise / 255.0 * (1.0 - lightness);
                    pixel.0 = hls_to_rgb([hue, lightness, saturation]);
                });
        }
    }

    Ok(())
}

/// Map each sample `x` to `alpha·x + beta·255`.
pub fn brightness_contrast(image: &mut Image, alpha: f64, beta: f64) {
    let table = utils::lookup_table(|x| alpha * x + beta * 255.0);
    image.apply_lut(&table);
}

/// Map each sample `x` to `255·(x/255)^gamma`.
pub fn gamma(image: &mut Image, gamma: f64) {
    let table = utils::lookup_table(|x| 255.0 * (x / 255.0).powf(gamma));
    image.apply_lut(&table);
}

/// Shift hue, saturation and value in 8-bit OpenCV units.
///
/// The hue is measured on the half-degree scale `[0, 180)`, saturation and
/// value on `[0, 255]`. Gray images only receive the value shift.
pub fn hue_saturation_value(image: &mut Image, hue_shift: f64, sat_shift: f64, val_shift: f64) {
    match image {
        Image::Gray(buf) => {
            let table = utils::lookup_table(|x| x + val_shift);
            buf.iter_mut()
                .for_each(|sample| *sample = table[*sample as usize]);
        }
        Image::Rgb(buf) => {
            buf.pixels_mut().for_each(|pixel| {
                let [hue, saturation, value] = rgb_to_hsv(pixel.0);
                let hue = hue + hue_shift * 2.0;
                let saturation = (saturation * 255.0 + sat_shift).clamp(0.0, 255.0) / 255.0;
                let value = (value * 255.0 + val_shift).clamp(0.0, 255.0) / 255.0;
                pixel.0 = hsv_to_rgb([hue, saturation, value]);
            });
        }
    }
}

fn std_dev(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (count, sum) = values
        .clone()
        .fold((0usize, 0.0), |(count, sum), v| (count + 1, sum + v));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    var.sqrt()
}
