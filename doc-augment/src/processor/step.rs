//! Declarative transform steps and their executor.

use super::{geometric, photometric};
use crate::{common::*, raster::Image, utils};

/// A transform with the ranges its parameters are drawn from.
///
/// Limits are symmetric: a limit `a` draws from `[-a, a]`. Ranges are
/// `[lower, upper]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransformKind {
    /// Rotation about the center, limit in degrees.
    Rotate { limit: R64 },
    /// Shift as a fraction of the size, relative scale change and rotation
    /// in degrees.
    ShiftScaleRotate {
        shift_limit: R64,
        scale_limit: R64,
        rotate_limit: R64,
    },
    /// Corner jitter drawn from N(0, scale) as a fraction of the size.
    Perspective { scale: [R64; 2] },
    /// Odd kernel sizes.
    GaussianBlur { kernel: [usize; 2] },
    GaussianNoise { variance: [R64; 2] },
    IsoNoise {
        color_shift: [R64; 2],
        intensity: [R64; 2],
    },
    /// Brightness as a fraction of the full range, contrast as a gain change.
    BrightnessContrast {
        brightness_limit: R64,
        contrast_limit: R64,
    },
    /// Gamma in percent.
    Gamma { gamma_limit: [R64; 2] },
    /// Shifts in 8-bit OpenCV HSV units.
    HueSaturationValue {
        hue_shift_limit: R64,
        sat_shift_limit: R64,
        val_shift_limit: R64,
    },
    JpegCompression { quality: [u8; 2] },
    Resize { height: u32, width: u32 },
}

impl TransformKind {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Rotate { limit } => check_limit("limit", limit)?,
            Self::ShiftScaleRotate {
                shift_limit,
                scale_limit,
                rotate_limit,
            } => {
                check_limit("shift_limit", shift_limit)?;
                check_limit("scale_limit", scale_limit)?;
                check_limit("rotate_limit", rotate_limit)?;
                ensure!(scale_limit < 1.0, "scale_limit must be less than 1");
            }
            Self::Perspective { scale } => {
                check_range("scale", scale)?;
                ensure!(scale[0] >= 0.0, "scale must be non-negative");
            }
            Self::GaussianBlur { kernel: [lower, upper] } => {
                ensure!(
                    lower <= upper,
                    "invalid kernel range [{}, {}]",
                    lower,
                    upper
                );
                ensure!(
                    (lower..=upper).any(|k| k % 2 == 1),
                    "kernel range [{}, {}] contains no odd size",
                    lower,
                    upper
                );
            }
            Self::GaussianNoise { variance } => {
                check_range("variance", variance)?;
                ensure!(variance[0] >= 0.0, "variance must be non-negative");
            }
            Self::IsoNoise {
                color_shift,
                intensity,
            } => {
                check_range("color_shift", color_shift)?;
                check_range("intensity", intensity)?;
                ensure!(
                    color_shift[0] >= 0.0 && intensity[0] >= 0.0,
                    "iso noise parameters must be non-negative"
                );
            }
            Self::BrightnessContrast {
                brightness_limit,
                contrast_limit,
            } => {
                check_limit("brightness_limit", brightness_limit)?;
                check_limit("contrast_limit", contrast_limit)?;
            }
            Self::Gamma { gamma_limit } => {
                check_range("gamma_limit", gamma_limit)?;
                ensure!(gamma_limit[0] > 0.0, "gamma_limit must be positive");
            }
            Self::HueSaturationValue {
                hue_shift_limit,
                sat_shift_limit,
                val_shift_limit,
            } => {
                check_limit("hue_shift_limit", hue_shift_limit)?;
                check_limit("sat_shift_limit", sat_shift_limit)?;
                check_limit("val_shift_limit", val_shift_limit)?;
            }
            Self::JpegCompression {
                quality: [lower, upper],
            } => {
                ensure!(
                    1 <= lower && lower <= upper && upper <= 100,
                    "jpeg quality range must lie in [1, 100], but get [{}, {}]",
                    lower,
                    upper
                );
            }
            Self::Resize { height, width } => {
                ensure!(
                    height > 0 && width > 0,
                    "resize target must be positive, but get {}x{}",
                    height,
                    width
                );
            }
        }
        Ok(())
    }

    /// Whether `self` is the same kind of transform as `other` with every
    /// limit at most as large and every range inside the other's range.
    pub fn is_weaker_than(&self, other: &Self) -> bool {
        fn inside<T>([lower, upper]: [T; 2], [outer_lower, outer_upper]: [T; 2]) -> bool
        where
            T: PartialOrd,
        {
            lower >= outer_lower && upper <= outer_upper
        }

        match (self, other) {
            (Self::Rotate { limit }, Self::Rotate { limit: outer }) => limit <= outer,
            (
                Self::ShiftScaleRotate {
                    shift_limit,
                    scale_limit,
                    rotate_limit,
                },
                Self::ShiftScaleRotate {
                    shift_limit: outer_shift,
                    scale_limit: outer_scale,
                    rotate_limit: outer_rotate,
                },
            ) => {
                shift_limit <= outer_shift
                    && scale_limit <= outer_scale
                    && rotate_limit <= outer_rotate
            }
            (Self::Perspective { scale }, Self::Perspective { scale: outer }) => {
                inside(*scale, *outer)
            }
            (Self::GaussianBlur { kernel }, Self::GaussianBlur { kernel: outer }) => {
                inside(*kernel, *outer)
            }
            (Self::GaussianNoise { variance }, Self::GaussianNoise { variance: outer }) => {
                inside(*variance, *outer)
            }
            (
                Self::IsoNoise {
                    color_shift,
                    intensity,
                },
                Self::IsoNoise {
                    color_shift: outer_shift,
                    intensity: outer_intensity,
                },
            ) => inside(*color_shift, *outer_shift) && inside(*intensity, *outer_intensity),
            (
                Self::BrightnessContrast {
                    brightness_limit,
                    contrast_limit,
                },
                Self::BrightnessContrast {
                    brightness_limit: outer_brightness,
                    contrast_limit: outer_contrast,
                },
            ) => brightness_limit <= outer_brightness && contrast_limit <= outer_contrast,
            (Self::Gamma { gamma_limit }, Self::Gamma { gamma_limit: outer }) => {
                inside(*gamma_limit, *outer)
            }
            (
                Self::HueSaturationValue {
                    hue_shift_limit,
                    sat_shift_limit,
                    val_shift_limit,
                },
                Self::HueSaturationValue {
                    hue_shift_limit: outer_hue,
                    sat_shift_limit: outer_sat,
                    val_shift_limit: outer_val,
                },
            ) => {
                hue_shift_limit <= outer_hue
                    && sat_shift_limit <= outer_sat
                    && val_shift_limit <= outer_val
            }
            (Self::JpegCompression { quality }, Self::JpegCompression { quality: outer }) => {
                inside(*quality, *outer)
            }
            (Self::Resize { .. }, Self::Resize { .. }) => self == other,
            _ => false,
        }
    }

    /// Draw the parameters and transform the image.
    pub fn apply<R>(&self, mut image: Image, rng: &mut R) -> Result<Image>
    where
        R: Rng + ?Sized,
    {
        let image = match *self {
            Self::Rotate { limit } => {
                geometric::rotate(&image, utils::symmetric(rng, limit.raw()))
            }
            Self::ShiftScaleRotate {
                shift_limit,
                scale_limit,
                rotate_limit,
            } => {
                let dx = utils::symmetric(rng, shift_limit.raw()) * image.width() as f64;
                let dy = utils::symmetric(rng, shift_limit.raw()) * image.height() as f64;
                let scale = 1.0 + utils::symmetric(rng, scale_limit.raw());
                let degrees = utils::symmetric(rng, rotate_limit.raw());
                geometric::shift_scale_rotate(&image, dx, dy, scale, degrees)
            }
            Self::Perspective {
                scale: [lower, upper],
            } => {
                let scale = utils::uniform(rng, lower.raw(), upper.raw());
                let normal = Normal::new(0.0, scale)?;
                let offsets = [(); 4].map(|()| {
                    let dx: f64 = normal.sample(rng);
                    let dy: f64 = normal.sample(rng);
                    (dx.abs(), dy.abs())
                });
                geometric::perspective(&image, offsets)
            }
            Self::GaussianBlur {
                kernel: [lower, upper],
            } => {
                let kernels: Vec<_> = (lower..=upper).filter(|k| k % 2 == 1).collect();
                let kernel = *kernels
                    .choose(rng)
                    .ok_or_else(|| format_err!("no odd kernel size in [{}, {}]", lower, upper))?;
                photometric::gaussian_blur(&image, kernel)
            }
            Self::GaussianNoise {
                variance: [lower, upper],
            } => {
                let variance = utils::uniform(rng, lower.raw(), upper.raw());
                photometric::gaussian_noise(&mut image, variance.sqrt(), rng)?;
                image
            }
            Self::IsoNoise {
                color_shift,
                intensity,
            } => {
                let color_shift = utils::uniform(rng, color_shift[0].raw(), color_shift[1].raw());
                let intensity = utils::uniform(rng, intensity[0].raw(), intensity[1].raw());
                photometric::iso_noise(&mut image, color_shift, intensity, rng)?;
                image
            }
            Self::BrightnessContrast {
                brightness_limit,
                contrast_limit,
            } => {
                let alpha = 1.0 + utils::symmetric(rng, contrast_limit.raw());
                let beta = utils::symmetric(rng, brightness_limit.raw());
                photometric::brightness_contrast(&mut image, alpha, beta);
                image
            }
            Self::Gamma {
                gamma_limit: [lower, upper],
            } => {
                let gamma = utils::uniform(rng, lower.raw(), upper.raw()) / 100.0;
                photometric::gamma(&mut image, gamma);
                image
            }
            Self::HueSaturationValue {
                hue_shift_limit,
                sat_shift_limit,
                val_shift_limit,
            } => {
                let hue = utils::symmetric(rng, hue_shift_limit.raw());
                let sat = utils::symmetric(rng, sat_shift_limit.raw());
                let val = utils::symmetric(rng, val_shift_limit.raw());
                photometric::hue_saturation_value(&mut image, hue, sat, val);
                image
            }
            Self::JpegCompression {
                quality: [lower, upper],
            } => {
                let quality = rng.gen_range(lower..=upper);
                image.jpeg_roundtrip(quality)?
            }
            Self::Resize { height, width } => image.resize(height, width),
        };

        Ok(image)
    }
}

/// A transform applied with a fixed probability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformStep {
    #[serde(flatten)]
    pub kind: TransformKind,
    pub probability: R64,
}

impl TransformStep {
    pub fn new(kind: TransformKind, probability: f64) -> Result<Self> {
        let probability = R64::try_new(probability)
            .ok_or_else(|| format_err!("probability must be a finite number"))?;
        let step = Self { kind, probability };
        step.validate()?;
        Ok(step)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.probability.raw()),
            "probability of '{}' must be in range [0, 1], but get {}",
            self.name(),
            self.probability
        );
        self.kind
            .validate()
            .with_context(|| format!("invalid '{}' step", self.name()))
    }

    /// Whether `self` fires at most as often as `other` and its transform is
    /// [weaker](TransformKind::is_weaker_than).
    pub fn is_weaker_than(&self, other: &Self) -> bool {
        self.probability <= other.probability && self.kind.is_weaker_than(&other.kind)
    }

    /// Run one Bernoulli trial and apply the transform on success.
    pub fn apply<R>(&self, image: Image, rng: &mut R) -> Result<Image>
    where
        R: Rng + ?Sized,
    {
        Ok(self.apply_traced(image, rng)?.0)
    }

    /// Like [apply](Self::apply), also telling whether the transform fired.
    pub fn apply_traced<R>(&self, image: Image, rng: &mut R) -> Result<(Image, bool)>
    where
        R: Rng + ?Sized,
    {
        if !rng.gen_bool(self.probability.raw()) {
            return Ok((image, false));
        }
        Ok((self.kind.apply(image, rng)?, true))
    }
}

fn check_limit(name: &str, limit: R64) -> Result<()> {
    ensure!(
        limit >= 0.0,
        "{} must be non-negative, but get {}",
        name,
        limit
    );
    Ok(())
}

fn check_range(name: &str, [lower, upper]: [R64; 2]) -> Result<()> {
    ensure!(
        lower <= upper,
        "{} must be an ordered range, but get [{}, {}]",
        name,
        lower,
        upper
    );
    Ok(())
}
