//! Ordered step sequences ending in a fixed-size resize.

use super::{TransformKind, TransformStep};
use crate::{common::*, raster::Image};

/// The shape every pipeline output is resized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSize {
    pub height: u32,
    pub width: u32,
}

impl Default for OutputSize {
    fn default() -> Self {
        Self {
            height: 224,
            width: 224,
        }
    }
}

/// The pipeline presets: strong perturbations for training data and weak
/// ones for validation data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineVariant {
    Full,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineInit {
    pub steps: Vec<TransformStep>,
    pub output_size: OutputSize,
}

impl PipelineInit {
    pub fn preset(variant: PipelineVariant, output_size: OutputSize) -> Self {
        match variant {
            PipelineVariant::Full => Self::full(output_size),
            PipelineVariant::Light => Self::light(output_size),
        }
    }

    pub fn full(output_size: OutputSize) -> Self {
        use TransformKind as K;

        let steps = vec![
            step(K::Rotate { limit: r64(5.0) }, 0.7),
            step(
                K::ShiftScaleRotate {
                    shift_limit: r64(0.05),
                    scale_limit: r64(0.05),
                    rotate_limit: r64(3.0),
                },
                0.7,
            ),
            step(
                K::Perspective {
                    scale: [r64(0.02), r64(0.05)],
                },
                0.5,
            ),
            step(K::GaussianBlur { kernel: [3, 5] }, 0.3),
            step(
                K::GaussianNoise {
                    variance: [r64(5.0), r64(20.0)],
                },
                0.3,
            ),
            step(
                K::IsoNoise {
                    color_shift: [r64(0.01), r64(0.05)],
                    intensity: [r64(0.1), r64(0.3)],
                },
                0.2,
            ),
            step(
                K::BrightnessContrast {
                    brightness_limit: r64(0.15),
                    contrast_limit: r64(0.15),
                },
                0.6,
            ),
            step(
                K::Gamma {
                    gamma_limit: [r64(90.0), r64(110.0)],
                },
                0.3,
            ),
            step(
                K::HueSaturationValue {
                    hue_shift_limit: r64(5.0),
                    sat_shift_limit: r64(10.0),
                    val_shift_limit: r64(10.0),
                },
                0.4,
            ),
            step(K::JpegCompression { quality: [85, 100] }, 0.3),
        ];

        Self { steps, output_size }
    }

    pub fn light(output_size: OutputSize) -> Self {
        use TransformKind as K;

        let steps = vec![
            step(K::Rotate { limit: r64(2.0) }, 0.5),
            step(
                K::BrightnessContrast {
                    brightness_limit: r64(0.1),
                    contrast_limit: r64(0.1),
                },
                0.4,
            ),
        ];

        Self { steps, output_size }
    }

    /// Check that every step is a [weaker](TransformStep::is_weaker_than)
    /// form of some step of `stronger`.
    pub fn ensure_weaker_than(&self, stronger: &Self) -> Result<()> {
        self.steps.iter().enumerate().try_for_each(|(index, weak)| {
            ensure!(
                stronger
                    .steps
                    .iter()
                    .any(|strong| weak.is_weaker_than(strong)),
                "step '{}' at position {} is not a weaker form of any step of the stronger pipeline",
                weak.name(),
                index
            );
            Ok(())
        })
    }

    pub fn build(self) -> Result<TransformPipeline> {
        let Self {
            steps,
            output_size: OutputSize { height, width },
        } = self;

        steps
            .iter()
            .enumerate()
            .try_for_each(|(index, step)| {
                step.validate()
                    .with_context(|| format!("invalid step at position {}", index))
            })?;

        let resize = TransformStep {
            kind: TransformKind::Resize { height, width },
            probability: r64(1.0),
        };
        resize.validate()?;

        Ok(TransformPipeline {
            steps,
            resize,
            output_size: OutputSize { height, width },
        })
    }
}

/// A validated sequence of transform steps.
///
/// Every output has the configured shape. Running with identically seeded
/// generators produces identical images.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformPipeline {
    steps: Vec<TransformStep>,
    resize: TransformStep,
    output_size: OutputSize,
}

impl TransformPipeline {
    /// The steps applied before the terminal resize.
    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn output_size(&self) -> OutputSize {
        self.output_size
    }

    /// Names of every step the pipeline may apply, including the resize.
    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .chain(std::iter::once(&self.resize))
            .map(|step| step.name())
    }

    pub fn run<R>(&self, image: &Image, rng: &mut R) -> Result<Image>
    where
        R: Rng + ?Sized,
    {
        Ok(self.run_traced(image, rng)?.0)
    }

    /// Run the pipeline, also returning the names of the steps that fired.
    pub fn run_traced<R>(&self, image: &Image, rng: &mut R) -> Result<(Image, Vec<&'static str>)>
    where
        R: Rng + ?Sized,
    {
        let mut applied = vec![];
        let mut image = image.clone();

        for step in self.steps.iter().chain(std::iter::once(&self.resize)) {
            let (output, fired) = step.apply_traced(image, rng)?;
            image = output;
            if fired {
                applied.push(step.name());
            }
        }

        Ok((image, applied))
    }
}

fn step(kind: TransformKind, probability: f64) -> TransformStep {
    TransformStep {
        kind,
        probability: r64(probability),
    }
}
