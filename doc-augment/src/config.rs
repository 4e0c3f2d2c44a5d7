//! Dataset preparation configuration format.

use crate::{
    common::*,
    dataset::{AugmentationEngine, AugmentationEngineInit, DatasetSplitter, SplitConfig},
    preprocess::{PreprocessConfig, Preprocessor},
    processor::{OutputSize, PipelineInit, TransformStep},
};

/// The main configuration. Every field has a default, so an empty file is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output_size: OutputSize,
    /// Makes augmentation reproducible when set.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub split: SplitConfig,
    /// Augmented variants per training image.
    #[serde(default = "default_train_count")]
    pub train_count: usize,
    /// Augmented variants per validation image.
    #[serde(default = "default_val_count")]
    pub val_count: usize,
    #[serde(default)]
    pub pipelines: PipelinesConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
}

/// Custom pipeline steps. A missing entry selects the built-in preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelinesConfig {
    #[serde(default)]
    pub full: Option<Vec<TransformStep>>,
    #[serde(default)]
    pub light: Option<Vec<TransformStep>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_size: OutputSize::default(),
            seed: None,
            split: SplitConfig::default(),
            train_count: default_train_count(),
            val_count: default_val_count(),
            pipelines: PipelinesConfig::default(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        let config: Self = json5::from_str(&text)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        config.split.validate()?;
        Ok(config)
    }

    pub fn engine_init(&self) -> AugmentationEngineInit {
        let Self {
            output_size,
            seed,
            ref pipelines,
            ..
        } = *self;

        let full = match &pipelines.full {
            Some(steps) => PipelineInit {
                steps: steps.clone(),
                output_size,
            },
            None => PipelineInit::full(output_size),
        };
        let light = match &pipelines.light {
            Some(steps) => PipelineInit {
                steps: steps.clone(),
                output_size,
            },
            None => PipelineInit::light(output_size),
        };

        AugmentationEngineInit { full, light, seed }
    }

    pub fn build_engine(&self) -> Result<AugmentationEngine> {
        self.engine_init().build()
    }

    pub fn build_splitter(&self) -> Result<DatasetSplitter> {
        DatasetSplitter::new(self.build_engine()?, self.split.clone())
    }

    pub fn build_preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.output_size, self.preprocess)
    }
}

fn default_train_count() -> usize {
    10
}

fn default_val_count() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::TransformKind;

    #[test]
    fn empty_config_is_default() {
        let config: Config = json5::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.train_count, 10);
        assert_eq!(config.val_count, 3);
        assert_eq!(config.split.train_ratio, 0.85);
        assert_eq!(config.output_size, OutputSize::default());
        assert_eq!(config.preprocess, PreprocessConfig::default());
    }

    #[test]
    fn preprocess_section() {
        let text = r#"{
            output_size: { height: 64, width: 64 },
            preprocess: { denoise: false },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        let preprocessor = config.build_preprocessor();
        assert_eq!(
            preprocessor.config(),
            PreprocessConfig {
                denoise: false,
                enhance: true
            }
        );
        assert_eq!(preprocessor.output_size().height, 64);
    }

    #[test]
    fn custom_pipeline() {
        let text = r#"{
            // a smaller training resolution
            output_size: { height: 128, width: 96 },
            seed: 7,
            split: { train_ratio: 0.8 },
            pipelines: {
                light: [
                    { kind: "gamma", gamma_limit: [95, 105], probability: 0.3 },
                ],
            },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        let engine = config.build_engine().unwrap();

        assert_eq!(engine.seed(), Some(7));
        assert_eq!(
            engine.output_size(),
            OutputSize {
                height: 128,
                width: 96
            }
        );

        let light = engine.pipeline(crate::processor::PipelineVariant::Light);
        assert_eq!(light.steps().len(), 1);
        assert!(matches!(light.steps()[0].kind, TransformKind::Gamma { .. }));

        let full = engine.pipeline(crate::processor::PipelineVariant::Full);
        assert_eq!(full.steps().len(), 10);
    }

    #[test]
    fn reject_stronger_light_pipeline() {
        let text = r#"{
            pipelines: {
                full: [ { kind: "rotate", limit: 2, probability: 0.1 } ],
                light: [
                    { kind: "perspective", scale: [0.2, 0.4], probability: 1.0 },
                    { kind: "rotate", limit: 45, probability: 1.0 },
                ],
            },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        assert!(config.build_engine().is_err());

        // the preset light pipeline is weaker than a custom full one
        let text = r#"{
            pipelines: {
                full: [
                    { kind: "rotate", limit: 10, probability: 0.9 },
                    { kind: "brightness_contrast", brightness_limit: 0.2, contrast_limit: 0.2, probability: 0.5 },
                ],
            },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        config.build_engine().unwrap();
    }

    #[test]
    fn reject_invalid_step() {
        let text = r#"{
            pipelines: { full: [ { kind: "rotate", limit: 5, probability: 2 } ] },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        assert!(config.build_engine().is_err());
    }
}
