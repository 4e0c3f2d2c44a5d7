//! The 8-bit raster image processed by the toolkit.

use crate::common::*;
use image::{codecs::jpeg::JpegEncoder, ImageReader};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut},
    rect::Rect as PixelRect,
};

/// Encoding quality used when an image is saved as JPEG.
pub const JPEG_SAVE_QUALITY: u8 = 95;

/// Dispatch an expression over the buffer of either variant and rewrap the result.
macro_rules! map_buffer {
    ($image:expr, $buf:ident => $body:expr) => {
        match $image {
            Image::Gray($buf) => Image::Gray($body),
            Image::Rgb($buf) => Image::Rgb($body),
        }
    };
}

/// Dispatch an expression over the buffer of either variant.
macro_rules! with_buffer {
    ($image:expr, $buf:ident => $body:expr) => {
        match $image {
            Image::Gray($buf) => $body,
            Image::Rgb($buf) => $body,
        }
    };
}

/// A dense channel-last `u8` raster with one or three channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Image {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl Image {
    /// Create an image filled with a single intensity.
    pub fn filled(height: u32, width: u32, channels: u8, value: u8) -> Result<Self> {
        ensure!(
            height > 0 && width > 0,
            "image size must be positive, but get {}x{}",
            height,
            width
        );
        let image = match channels {
            1 => Self::Gray(GrayImage::from_pixel(width, height, Luma([value]))),
            3 => Self::Rgb(RgbImage::from_pixel(width, height, Rgb([value; 3]))),
            _ => bail!("unsupported channel count {}", channels),
        };
        Ok(image)
    }

    /// Load an image from a file, detecting the format from its content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .with_context(|| format!("unable to open '{}'", path.display()))?
            .with_guessed_format()?
            .decode()
            .with_context(|| format!("unable to decode '{}'", path.display()))?;
        Self::from_dynamic(image)
    }

    /// Convert a decoded image. Alpha is dropped and deep samples are
    /// narrowed to 8 bits.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        ensure!(
            image.width() > 0 && image.height() > 0,
            "image has no pixels"
        );
        let image = match image.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                Self::Gray(image.to_luma8())
            }
            _ => Self::Rgb(image.to_rgb8()),
        };
        Ok(image)
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Self::Gray(buf) => DynamicImage::ImageLuma8(buf.clone()),
            Self::Rgb(buf) => DynamicImage::ImageRgb8(buf.clone()),
        }
    }

    /// Save the image. The format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
            .unwrap_or(false);

        let result = if is_jpeg {
            fs::File::create(path)
                .map_err(Error::from)
                .and_then(|file| {
                    let mut encoder =
                        JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_SAVE_QUALITY);
                    with_buffer!(self, buf => encoder.encode_image(buf))?;
                    Ok(())
                })
        } else {
            with_buffer!(self, buf => buf.save(path)).map_err(Error::from)
        };

        result.with_context(|| format!("unable to save '{}'", path.display()))
    }

    pub fn height(&self) -> u32 {
        with_buffer!(self, buf => buf.height())
    }

    pub fn width(&self) -> u32 {
        with_buffer!(self, buf => buf.width())
    }

    pub fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    /// The interleaved samples in row-major order.
    pub fn samples(&self) -> &[u8] {
        with_buffer!(self, buf => &**buf)
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        with_buffer!(self, buf => &mut **buf)
    }

    /// Replace each sample `x` by `table[x]`.
    pub fn apply_lut(&mut self, table: &[u8; 256]) {
        self.samples_mut()
            .iter_mut()
            .for_each(|sample| *sample = table[*sample as usize]);
    }

    /// Resize to exactly `height`×`width` with bilinear filtering.
    pub fn resize(&self, height: u32, width: u32) -> Self {
        if self.height() == height && self.width() == width {
            return self.clone();
        }
        map_buffer!(self, buf => imageops::resize(buf, width, height, FilterType::Triangle))
    }

    /// Gaussian blur over the whole image.
    pub fn blur(&self, sigma: f32) -> Self {
        map_buffer!(self, buf => imageops::blur(buf, sigma))
    }

    /// Blur a pixel box in place, leaving the rest of the image intact.
    pub fn blur_box(&mut self, tlbr: &TLBR<u32>, sigma: f32) {
        let [t, l, b, r] = tlbr.tlbr();
        if b <= t || r <= l {
            return;
        }
        with_buffer!(self, buf => {
            let patch = imageops::crop_imm(buf, l, t, r - l, b - t).to_image();
            let patch = imageops::blur(&patch, sigma);
            imageops::replace(buf, &patch, l as i64, t as i64);
        })
    }

    /// Encode as JPEG at `quality` and decode again.
    pub fn jpeg_roundtrip(&self, quality: u8) -> Result<Self> {
        let mut bytes = vec![];
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            with_buffer!(self, buf => encoder.encode_image(buf))?;
        }
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)?;

        let image = match self {
            Self::Gray(_) => Self::Gray(decoded.to_luma8()),
            Self::Rgb(_) => Self::Rgb(decoded.to_rgb8()),
        };
        Ok(image)
    }

    /// Fill the rectangle spanning the two corners, both inclusive, with a
    /// gray level. Parts outside the image are ignored.
    pub fn fill_rect(&mut self, left: i32, top: i32, right: i32, bottom: i32, value: u8) {
        let (left, right) = (left.min(right), left.max(right));
        let (top, bottom) = (top.min(bottom), top.max(bottom));
        let rect = PixelRect::at(left, top)
            .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);

        match self {
            Self::Gray(buf) => draw_filled_rect_mut(buf, rect, Luma([value])),
            Self::Rgb(buf) => draw_filled_rect_mut(buf, rect, Rgb([value; 3])),
        }
    }

    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), value: u8) {
        match self {
            Self::Gray(buf) => draw_line_segment_mut(buf, from, to, Luma([value])),
            Self::Rgb(buf) => draw_line_segment_mut(buf, from, to, Rgb([value; 3])),
        }
    }

    pub fn draw_dot(&mut self, center: (i32, i32), radius: i32, value: u8) {
        match self {
            Self::Gray(buf) => draw_filled_circle_mut(buf, center, radius, Luma([value])),
            Self::Rgb(buf) => draw_filled_circle_mut(buf, center, radius, Rgb([value; 3])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_image() {
        let image = Image::filled(4, 6, 3, 7).unwrap();
        assert_eq!(image.height(), 4);
        assert_eq!(image.width(), 6);
        assert_eq!(image.channels(), 3);
        assert_eq!(image.samples().len(), 4 * 6 * 3);
        assert!(image.samples().iter().all(|&v| v == 7));
        assert!(Image::filled(0, 6, 3, 0).is_err());
        assert!(Image::filled(4, 6, 2, 0).is_err());
    }

    #[test]
    fn alpha_is_dropped() {
        let rgba = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 40]));
        let image = Image::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(image.channels(), 3);
        assert_eq!(&image.samples()[0..3], &[10, 20, 30]);

        let gray = image::GrayAlphaImage::from_pixel(3, 2, image::LumaA([9, 0]));
        let image = Image::from_dynamic(DynamicImage::ImageLumaA8(gray)).unwrap();
        assert_eq!(image.channels(), 1);
    }

    #[test]
    fn resize_to_exact_shape() {
        let image = Image::filled(600, 800, 3, 128).unwrap();
        let resized = image.resize(224, 224);
        assert_eq!((resized.height(), resized.width()), (224, 224));
        assert_eq!(resized.channels(), 3);
    }

    #[test]
    fn fill_rect_is_inclusive() {
        let mut image = Image::filled(10, 10, 1, 255).unwrap();
        image.fill_rect(2, 3, 4, 5, 0);
        let Image::Gray(buf) = &image else { unreachable!() };
        let black = buf.pixels().filter(|p| p.0[0] == 0).count();
        assert_eq!(black, 9);
        assert_eq!(buf.get_pixel(4, 5).0[0], 0);
        assert_eq!(buf.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn blur_box_keeps_outside() {
        let mut image = Image::filled(20, 20, 3, 255).unwrap();
        image.fill_rect(0, 0, 9, 19, 0);
        let before = image.clone();
        image.blur_box(&TLBR::try_from_tlbr([0, 5, 20, 15]).unwrap(), 3.0);

        let (Image::Rgb(after), Image::Rgb(before)) = (&image, &before) else { unreachable!() };
        assert_eq!(after.get_pixel(0, 0), before.get_pixel(0, 0));
        assert_eq!(after.get_pixel(19, 19), before.get_pixel(19, 19));
        assert_ne!(after.get_pixel(9, 10), before.get_pixel(9, 10));
    }

    #[test]
    fn jpeg_roundtrip_keeps_shape() {
        let image = Image::filled(16, 24, 1, 100).unwrap();
        let decoded = image.jpeg_roundtrip(50).unwrap();
        assert_eq!(decoded.channels(), 1);
        assert_eq!((decoded.height(), decoded.width()), (16, 24));
    }
}
