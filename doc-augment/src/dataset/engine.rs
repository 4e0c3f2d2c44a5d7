use super::{list_images, process_sources, BatchReport};
use crate::{
    common::*,
    processor::{OutputSize, PipelineInit, PipelineVariant, TransformPipeline},
    raster::Image,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AugmentationEngineInit {
    pub full: PipelineInit,
    pub light: PipelineInit,
    /// Makes batch outputs reproducible when set.
    pub seed: Option<u64>,
}

impl AugmentationEngineInit {
    /// The preset pipelines resized to `output_size`, unseeded.
    pub fn new(output_size: OutputSize) -> Self {
        Self {
            full: PipelineInit::full(output_size),
            light: PipelineInit::light(output_size),
            seed: None,
        }
    }

    pub fn build(self) -> Result<AugmentationEngine> {
        let Self { full, light, seed } = self;
        ensure!(
            full.output_size == light.output_size,
            "full and light pipelines must share the output size, but get {:?} and {:?}",
            full.output_size,
            light.output_size
        );
        light
            .ensure_weaker_than(&full)
            .context("the light pipeline must be a weaker subset of the full pipeline")?;

        let full = full.build().context("invalid full pipeline")?;
        let light = light.build().context("invalid light pipeline")?;

        Ok(AugmentationEngine {
            full: Arc::new(full),
            light: Arc::new(light),
            seed,
        })
    }
}

/// Expands folders of document images with randomized pipelines.
#[derive(Debug, Clone)]
pub struct AugmentationEngine {
    full: Arc<TransformPipeline>,
    light: Arc<TransformPipeline>,
    seed: Option<u64>,
}

impl AugmentationEngine {
    pub fn new(output_size: OutputSize) -> Result<Self> {
        AugmentationEngineInit::new(output_size).build()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn output_size(&self) -> OutputSize {
        self.full.output_size()
    }

    pub fn pipeline(&self, variant: PipelineVariant) -> &TransformPipeline {
        match variant {
            PipelineVariant::Full => &self.full,
            PipelineVariant::Light => &self.light,
        }
    }

    /// Produce `count` independent augmentations of `image`.
    pub fn augment_image<R>(
        &self,
        image: &Image,
        count: usize,
        variant: PipelineVariant,
        rng: &mut R,
    ) -> Result<Vec<Image>>
    where
        R: Rng + ?Sized,
    {
        let pipeline = self.pipeline(variant);
        (0..count).map(|_| pipeline.run(image, rng)).collect()
    }

    /// Augment every image in `input_dir` into `output_dir`.
    ///
    /// Each decodable source yields a resized copy named
    /// `{stem}_original{suffix}` and `count` variants named
    /// `{stem}_aug_{NN}{suffix}`.
    pub async fn augment_dataset(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        count: usize,
        variant: PipelineVariant,
    ) -> Result<BatchReport> {
        let input_dir = input_dir.as_ref();
        let files = list_images(input_dir)?;
        info!(
            "found {} images in '{}'",
            files.len(),
            input_dir.display()
        );
        self.augment_files(files, output_dir, count, variant, self.seed)
            .await
    }

    /// Augment the listed files into `output_dir`, seeding the per-source
    /// generators from `seed`.
    pub async fn augment_files(
        &self,
        files: Vec<PathBuf>,
        output_dir: impl AsRef<Path>,
        count: usize,
        variant: PipelineVariant,
        seed: Option<u64>,
    ) -> Result<BatchReport> {
        let output_dir = output_dir.as_ref();
        let pipeline = match variant {
            PipelineVariant::Full => self.full.clone(),
            PipelineVariant::Light => self.light.clone(),
        };

        let report = process_sources(files, output_dir, seed, move |source, image, dir, rng| {
            let OutputSize { height, width } = pipeline.output_size();
            image
                .resize(height, width)
                .save(dir.join(source.original_name()))?;

            for index in 1..=count {
                pipeline
                    .run(&image, rng)?
                    .save(dir.join(source.augmented_name(index)))?;
            }

            debug!(
                "wrote {} variants of '{}'",
                count + 1,
                source.path.display()
            );
            Ok(count + 1)
        })
        .await?;

        info!(
            "{} pipeline: {} of {} images augmented, {} files written to '{}'",
            variant.as_ref(),
            report.processed,
            report.sources,
            report.files_written,
            output_dir.display()
        );
        Ok(report)
    }
}
