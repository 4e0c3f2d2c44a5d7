//! Hiding personal data on document scans.

use crate::{
    common::*,
    dataset::{list_images, process_sources, BatchReport},
    raster::Image,
};
use doc_template::{Template, TemplateError, TemplateRegistry};

/// Gaussian sigma used to blur sensitive regions.
pub const DEFAULT_BLUR_SIGMA: f32 = 50.0;

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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RedactionMethod {
    Blur,
    Blackout,
}

impl Default for RedactionMethod {
    fn default() -> Self {
        Self::Blur
    }
}

/// Document kinds with built-in layouts.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
    NationalId,
    Certificate,
    Passport,
}

impl DocumentKind {
    /// The approximate locations of the personal fields.
    pub fn regions(&self) -> Vec<NamedRegion> {
        let layout: &[(&str, [f64; 4])] = match self {
            Self::NationalId => &[
                ("photo", [0.05, 0.15, 0.25, 0.35]),
                ("id_number", [0.15, 0.35, 0.4, 0.08]),
                ("name", [0.15, 0.45, 0.5, 0.08]),
                ("date_of_birth", [0.15, 0.55, 0.3, 0.08]),
                ("ghost_image", [0.65, 0.4, 0.2, 0.25]),
            ],
            Self::Certificate => &[
                ("name", [0.3, 0.25, 0.4, 0.05]),
                ("index_number", [0.3, 0.35, 0.4, 0.05]),
                ("school", [0.3, 0.45, 0.4, 0.05]),
            ],
            Self::Passport => &[
                ("photo", [0.05, 0.2, 0.3, 0.4]),
                ("name", [0.4, 0.3, 0.5, 0.08]),
                ("passport_number", [0.4, 0.4, 0.3, 0.06]),
                ("mrz", [0.05, 0.85, 0.9, 0.1]),
            ],
        };

        layout
            .iter()
            .map(|&(name, [x, y, width, height])| NamedRegion {
                name: name.to_owned(),
                region: RatioRegion {
                    x,
                    y,
                    width,
                    height,
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRegion {
    pub name: String,
    pub region: RatioRegion,
}

/// The sensitive field regions declared by a template.
pub fn regions_from_template(template: &Template) -> Vec<NamedRegion> {
    template
        .sensitive_regions()
        .into_iter()
        .map(|(name, region)| NamedRegion {
            name: name.to_owned(),
            region,
        })
        .collect()
}

/// Find the regions to hide for a document type.
///
/// A template in `registry` takes precedence over the built-in layouts.
pub fn resolve_regions(
    document_type: &str,
    registry: Option<&TemplateRegistry>,
) -> Result<Vec<NamedRegion>> {
    if let Some(template) = registry.and_then(|registry| registry.template(document_type).ok()) {
        let regions = regions_from_template(template);
        ensure!(
            !regions.is_empty(),
            "template '{}' declares no field regions",
            document_type
        );
        return Ok(regions);
    }

    let kind = DocumentKind::from_str(document_type).map_err(|_| {
        TemplateError::InvalidDocumentType {
            document_type: document_type.to_owned(),
        }
    })?;
    Ok(kind.regions())
}

/// Blurs or blacks out regions of document images.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    blur_sigma: f32,
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

impl Anonymizer {
    pub fn new(blur_sigma: f32) -> Result<Self> {
        ensure!(
            blur_sigma.is_finite() && blur_sigma > 0.0,
            "blur sigma must be positive, but get {}",
            blur_sigma
        );
        Ok(Self { blur_sigma })
    }

    pub fn blur_region(&self, image: &mut Image, region: &RatioRegion) -> Result<()> {
        if let Some(tlbr) = region.to_pixel_box(image.height(), image.width())? {
            image.blur_box(&tlbr, self.blur_sigma);
        }
        Ok(())
    }

    /// Paint the region black, including its right and bottom edges.
    pub fn black_out_region(&self, image: &mut Image, region: &RatioRegion) -> Result<()> {
        if let Some(tlbr) = region.to_pixel_box(image.height(), image.width())? {
            let [t, l, b, r] = tlbr.tlbr();
            image.fill_rect(l as i32, t as i32, r as i32, b as i32, 0);
        }
        Ok(())
    }

    pub fn anonymize(
        &self,
        image: &mut Image,
        regions: &[NamedRegion],
        method: RedactionMethod,
    ) -> Result<()> {
        regions.iter().try_for_each(|NamedRegion { name, region }| {
            match method {
                RedactionMethod::Blur => self.blur_region(image, region),
                RedactionMethod::Blackout => self.black_out_region(image, region),
            }
            .with_context(|| format!("unable to redact region '{}'", name))
        })
    }

    /// Anonymize every image in `input_dir` into `output_dir` as
    /// `anon_{file_name}`.
    pub async fn batch_anonymize(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        regions: Vec<NamedRegion>,
        method: RedactionMethod,
    ) -> Result<BatchReport> {
        let output_dir = output_dir.as_ref();
        let files = list_images(input_dir)?;
        info!(
            "anonymizing {} images with {} regions by {}",
            files.len(),
            regions.len(),
            method.as_ref()
        );

        let anonymizer = self.clone();
        let report = process_sources(files, output_dir, None, move |source, mut image, dir, _rng| {
            anonymizer.anonymize(&mut image, &regions, method)?;
            image.save(dir.join(source.anonymized_name()))?;
            Ok(1)
        })
        .await?;

        info!(
            "{} of {} images anonymized into '{}'",
            report.processed,
            report.sources,
            output_dir.display()
        );
        Ok(report)
    }
}
