use super::{count_images, list_images, AugmentationEngine, BatchReport};
use crate::{common::*, processor::PipelineVariant};

/// Name of the training subfolder under the split output directory.
pub const TRAIN_DIR_NAME: &str = "train";
/// Name of the validation subfolder under the split output directory.
pub const VALIDATION_DIR_NAME: &str = "validation";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of the sources assigned to the training set.
    #[serde(default = "default_train_ratio")]
    pub train_ratio: R64,
    /// Shuffle the sources before splitting when set. Sources are split in
    /// file name order otherwise.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.train_ratio.raw()),
            "train_ratio must be in range [0, 1], but get {}",
            self.train_ratio
        );
        Ok(())
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: default_train_ratio(),
            shuffle_seed: None,
        }
    }
}

fn default_train_ratio() -> R64 {
    r64(0.85)
}

/// A partition of source files into training and validation sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<PathBuf>,
    pub validation: Vec<PathBuf>,
}

impl Split {
    /// Put the leading `floor(train_ratio · N)` files into the training set
    /// and the rest into the validation set.
    pub fn new(mut files: Vec<PathBuf>, config: &SplitConfig) -> Result<Self> {
        config.validate()?;

        if let Some(seed) = config.shuffle_seed {
            files.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        let index = train_split_index(files.len(), config.train_ratio.raw());
        let validation = files.split_off(index);

        Ok(Self {
            train: files,
            validation,
        })
    }
}

pub fn train_split_index(len: usize, train_ratio: f64) -> usize {
    ((len as f64 * train_ratio).floor() as usize).min(len)
}

/// The outcome of [DatasetSplitter::create_split].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub train_dir: PathBuf,
    pub validation_dir: PathBuf,
    pub train: BatchReport,
    pub validation: BatchReport,
    /// Image files found in the training folder afterwards.
    pub train_files: usize,
    /// Image files found in the validation folder afterwards.
    pub validation_files: usize,
}

/// Splits a folder into augmented training and validation sets.
#[derive(Debug, Clone)]
pub struct DatasetSplitter {
    engine: AugmentationEngine,
    config: SplitConfig,
}

impl DatasetSplitter {
    pub fn new(engine: AugmentationEngine, config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &AugmentationEngine {
        &self.engine
    }

    /// Split the images in `input_dir`, augment the training part with the
    /// full pipeline into `output_base/train` and the validation part with
    /// the light pipeline into `output_base/validation`.
    pub async fn create_split(
        &self,
        input_dir: impl AsRef<Path>,
        output_base: impl AsRef<Path>,
        train_count: usize,
        val_count: usize,
    ) -> Result<SplitReport> {
        let input_dir = input_dir.as_ref();
        let output_base = output_base.as_ref();

        let files = list_images(input_dir)?;
        let num_files = files.len();
        let Split { train, validation } = Split::new(files, &self.config)?;
        info!(
            "split {} images into {} training and {} validation images",
            num_files,
            train.len(),
            validation.len()
        );

        let (train_seed, validation_seed) = match self.engine.seed() {
            Some(seed) => {
                let mut master = StdRng::seed_from_u64(seed);
                (Some(master.gen()), Some(master.gen()))
            }
            None => (None, None),
        };

        let train_dir = output_base.join(TRAIN_DIR_NAME);
        let validation_dir = output_base.join(VALIDATION_DIR_NAME);

        let train = self
            .engine
            .augment_files(
                train,
                &train_dir,
                train_count,
                PipelineVariant::Full,
                train_seed,
            )
            .await?;
        let validation = self
            .engine
            .augment_files(
                validation,
                &validation_dir,
                val_count,
                PipelineVariant::Light,
                validation_seed,
            )
            .await?;

        let train_files = count_images(&train_dir)?;
        let validation_files = count_images(&validation_dir)?;
        info!(
            "dataset ready: {} training files, {} validation files",
            train_files, validation_files
        );

        Ok(SplitReport {
            train_dir,
            validation_dir,
            train,
            validation,
            train_files,
            validation_files,
        })
    }
}
