//! Cleaning up document scans before they reach a model.

use crate::{
    common::*,
    dataset::{list_images, process_sources, BatchReport},
    processor::{
        contrast::{clahe, CLAHE_CLIP_LIMIT, CLAHE_GRID_SIZE},
        OutputSize,
    },
    raster::Image,
    utils,
};
use imageproc::{edges::canny, filter::median_filter};

/// Lower hysteresis threshold of the edge detector.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
/// Upper hysteresis threshold of the edge detector.
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;
/// Radius of the median window, 1 gives a 3x3 window.
pub const DENOISE_RADIUS: u32 = 1;

/// Optional stages of [Preprocessor].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_true")]
    pub denoise: bool,
    #[serde(default = "default_true")]
    pub enhance: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denoise: true,
            enhance: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Denoises, enhances and resizes document images.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    output_size: OutputSize,
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(output_size: OutputSize, config: PreprocessConfig) -> Self {
        Self {
            output_size,
            config,
        }
    }

    pub fn output_size(&self) -> OutputSize {
        self.output_size
    }

    pub fn config(&self) -> PreprocessConfig {
        self.config
    }

    /// Run the enabled stages and resize to the output size.
    pub fn preprocess(&self, image: &Image) -> Image {
        let PreprocessConfig { denoise, enhance } = self.config;
        let OutputSize { height, width } = self.output_size;

        let image = if denoise {
            self::denoise(image)
        } else {
            image.clone()
        };
        let image = if enhance {
            enhance_contrast(&image)
        } else {
            image
        };
        image.resize(height, width)
    }

    /// [Preprocess](Self::preprocess) and scale the samples to `[0, 1]`.
    pub fn preprocess_normalized(&self, image: &Image) -> Vec<f32> {
        normalize(&self.preprocess(image))
    }

    /// Preprocess every image in `input_dir` into `output_dir` under its
    /// original file name.
    pub async fn preprocess_batch(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<BatchReport> {
        let output_dir = output_dir.as_ref();
        let files = list_images(input_dir)?;
        info!("preprocessing {} images", files.len());

        let preprocessor = self.clone();
        let report = process_sources(files, output_dir, None, move |source, image, dir, _rng| {
            preprocessor
                .preprocess(&image)
                .save(dir.join(source.file_name()))?;
            Ok(1)
        })
        .await?;

        info!(
            "{} of {} images preprocessed into '{}'",
            report.processed,
            report.sources,
            output_dir.display()
        );
        Ok(report)
    }
}

pub fn to_grayscale(image: &Image) -> Image {
    match image {
        Image::Gray(_) => image.clone(),
        Image::Rgb(buf) => Image::Gray(imageops::grayscale(buf)),
    }
}

/// Suppress scanner speckle with a median filter.
pub fn denoise(image: &Image) -> Image {
    match image {
        Image::Gray(buf) => Image::Gray(median_filter(buf, DENOISE_RADIUS, DENOISE_RADIUS)),
        Image::Rgb(buf) => Image::Rgb(median_filter(buf, DENOISE_RADIUS, DENOISE_RADIUS)),
    }
}

/// Apply CLAHE to the luma of the image.
///
/// Color images keep their chroma: every channel is shifted by the change of
/// its pixel's BT.601 luma.
pub fn enhance_contrast(image: &Image) -> Image {
    match image {
        Image::Gray(buf) => Image::Gray(clahe(buf, CLAHE_CLIP_LIMIT, CLAHE_GRID_SIZE)),
        Image::Rgb(buf) => {
            let luma_of = |[r, g, b]: [u8; 3]| {
                0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
            };
            let luma = GrayImage::from_fn(buf.width(), buf.height(), |x, y| {
                Luma([utils::saturate(luma_of(buf.get_pixel(x, y).0))])
            });
            let enhanced = clahe(&luma, CLAHE_CLIP_LIMIT, CLAHE_GRID_SIZE);

            let output = RgbImage::from_fn(buf.width(), buf.height(), |x, y| {
                let pixel = buf.get_pixel(x, y).0;
                let shift = enhanced.get_pixel(x, y).0[0] as f64 - luma_of(pixel);
                Rgb(pixel.map(|c| utils::saturate(c as f64 + shift)))
            });
            Image::Rgb(output)
        }
    }
}

/// Edge map of the grayscale image, 255 on edges and 0 elsewhere.
pub fn detect_edges(image: &Image) -> Image {
    let gray = match image {
        Image::Gray(buf) => buf.clone(),
        Image::Rgb(buf) => imageops::grayscale(buf),
    };
    Image::Gray(canny(&gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD))
}

/// Scale the samples to `[0, 1]` in channel-last order.
pub fn normalize(image: &Image) -> Vec<f32> {
    image.samples().iter().map(|&v| v as f32 / 255.0).collect()
}

/// Basic statistics of an image file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStats {
    pub path: PathBuf,
    pub height: u32,
    pub width: u32,
    pub channels: u8,
    pub file_size_mb: f64,
    pub mean: f64,
    pub std: f64,
    pub min: u8,
    pub max: u8,
}

pub fn image_stats(path: impl AsRef<Path>) -> Result<ImageStats> {
    let path = path.as_ref();
    let image = Image::open(path)?;
    let file_size = fs::metadata(path)
        .with_context(|| format!("unable to read metadata of '{}'", path.display()))?
        .len();

    let samples = image.samples();
    let count = samples.len() as f64;
    let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / count;
    let var = samples
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count;
    let (min, max) = samples
        .iter()
        .fold((u8::MAX, u8::MIN), |(min, max), &v| (min.min(v), max.max(v)));

    Ok(ImageStats {
        path: path.to_owned(),
        height: image.height(),
        width: image.width(),
        channels: image.channels(),
        file_size_mb: file_size as f64 / (1024.0 * 1024.0),
        mean,
        std: var.sqrt(),
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn median_removes_speckle() {
        let mut image = Image::filled(9, 9, 1, 0).unwrap();
        image.fill_rect(4, 4, 4, 4, 255);
        let clean = denoise(&image);
        assert!(clean.samples().iter().all(|&v| v == 0));

        let image = Image::filled(9, 9, 3, 40).unwrap();
        assert_eq!(denoise(&image), image);
    }

    #[test]
    fn edges_of_a_step() {
        let mut image = Image::filled(40, 40, 3, 0).unwrap();
        image.fill_rect(20, 0, 39, 39, 255);

        let edges = detect_edges(&image);
        assert_eq!(edges.channels(), 1);
        assert!(edges.samples().iter().any(|&v| v == 255));
        assert!(edges.samples().iter().all(|&v| v == 0 || v == 255));

        let flat = detect_edges(&Image::filled(40, 40, 1, 90).unwrap());
        assert!(flat.samples().iter().all(|&v| v == 0));
    }

    #[test]
    fn grayscale_and_normalize() {
        let image = Image::filled(4, 5, 3, 255).unwrap();
        let gray = to_grayscale(&image);
        assert_eq!((gray.height(), gray.width(), gray.channels()), (4, 5, 1));

        let values = normalize(&gray);
        assert_eq!(values.len(), 20);
        assert!(values.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn enhance_keeps_gray_pixels_gray() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut image = Image::filled(32, 32, 3, 0).unwrap();
        image.samples_mut().chunks_mut(3).for_each(|pixel| {
            let value = rng.gen_range(90..=120);
            pixel.copy_from_slice(&[value; 3]);
        });

        let enhanced = enhance_contrast(&image);
        assert_eq!(enhanced.channels(), 3);
        assert!(enhanced
            .samples()
            .chunks(3)
            .all(|pixel| pixel[0] == pixel[1] && pixel[1] == pixel[2]));
        assert_ne!(enhanced, image);
    }

    #[test]
    fn preprocess_shape() {
        let preprocessor = Preprocessor::new(
            OutputSize {
                height: 16,
                width: 12,
            },
            PreprocessConfig::default(),
        );
        let image = Image::filled(50, 40, 3, 128).unwrap();

        let output = preprocessor.preprocess(&image);
        assert_eq!((output.height(), output.width(), output.channels()), (16, 12, 3));

        let values = preprocessor.preprocess_normalized(&image);
        assert_eq!(values.len(), 16 * 12 * 3);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn stats_of_a_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("scan.png");
        let mut image = Image::filled(10, 20, 1, 50)?;
        image.fill_rect(0, 0, 9, 9, 150);
        image.save(&path)?;

        let stats = image_stats(&path)?;
        assert_eq!((stats.height, stats.width, stats.channels), (10, 20, 1));
        assert_eq!((stats.min, stats.max), (50, 150));
        assert_abs_diff_eq!(stats.mean, 100.0);
        assert_abs_diff_eq!(stats.std, 50.0);
        assert!(stats.file_size_mb > 0.0);

        assert!(image_stats(dir.path().join("missing.png")).is_err());
        Ok(())
    }
}
