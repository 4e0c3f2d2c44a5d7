//! Synthetic forgeries made by tampering with genuine documents.

use crate::{
    common::*,
    dataset::{list_images, process_sources, BatchReport},
    processor::photometric,
    raster::Image,
    utils,
};
use doc_template::Template;

/// Default location of the hologram, top right of an ID card.
const HOLOGRAM_REGION: RatioRegion = RatioRegion {
    x: 0.7,
    y: 0.1,
    width: 0.25,
    height: 0.2,
};

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
pub enum ForgeryMethod {
    /// White out the hologram.
    RemoveHologram,
    /// White out a text band and scribble over it.
    AlterText,
    /// Degrade the image and add scanner artifacts.
    WrongFont,
    /// Photocopy-like degradation.
    LowQuality,
    /// White out the watermark.
    MissingWatermark,
    /// Wrong printing or scanning colors.
    ColorShift,
}

impl ForgeryMethod {
    pub const ALL: [ForgeryMethod; 6] = [
        Self::RemoveHologram,
        Self::AlterText,
        Self::WrongFont,
        Self::LowQuality,
        Self::MissingWatermark,
        Self::ColorShift,
    ];
}

/// Creates fake documents from genuine ones.
#[derive(Debug, Clone)]
pub struct ForgeryGenerator {
    methods: Vec<ForgeryMethod>,
    hologram: RatioRegion,
    watermark: RatioRegion,
}

impl Default for ForgeryGenerator {
    fn default() -> Self {
        Self {
            methods: ForgeryMethod::ALL.to_vec(),
            hologram: HOLOGRAM_REGION,
            watermark: HOLOGRAM_REGION,
        }
    }
}

impl ForgeryGenerator {
    /// Restrict the methods drawn when no method is requested.
    pub fn with_methods(mut self, methods: Vec<ForgeryMethod>) -> Result<Self> {
        ensure!(!methods.is_empty(), "at least one forgery method is required");
        self.methods = methods;
        Ok(self)
    }

    /// Take the hologram and watermark locations from the security features
    /// of a template. Features without a region keep the default location.
    pub fn with_template(mut self, template: &Template) -> Self {
        let find = |keyword: &str| {
            template
                .security_features
                .iter()
                .filter(|(name, _)| name.to_lowercase().contains(keyword))
                .find_map(|(_, feature)| feature.region)
        };

        if let Some(region) = find("hologram") {
            self.hologram = region;
            self.watermark = region;
        }
        if let Some(region) = find("watermark") {
            self.watermark = region;
        }
        self
    }

    pub fn methods(&self) -> &[ForgeryMethod] {
        &self.methods
    }

    /// Forge a copy of `image`. A method is drawn at random when `method` is
    /// `None`.
    pub fn create_fake<R>(
        &self,
        image: &Image,
        method: Option<ForgeryMethod>,
        rng: &mut R,
    ) -> Result<(Image, ForgeryMethod)>
    where
        R: Rng + ?Sized,
    {
        let method = match method {
            Some(method) => method,
            None => *self
                .methods
                .choose(rng)
                .ok_or_else(|| format_err!("no forgery method available"))?,
        };

        let fake = match method {
            ForgeryMethod::RemoveHologram => self.white_out(image, &self.hologram)?,
            ForgeryMethod::MissingWatermark => self.white_out(image, &self.watermark)?,
            ForgeryMethod::AlterText => alter_text(image, rng),
            ForgeryMethod::LowQuality => reduce_quality(image, rng)?,
            ForgeryMethod::ColorShift => shift_colors(image, rng),
            ForgeryMethod::WrongFont => {
                let mut fake = reduce_quality(image, rng)?;
                add_artifacts(&mut fake, rng);
                fake
            }
        };

        Ok((fake, method))
    }

    /// Write `count` forged variants of every image in `input_dir` as
    /// `{stem}_fake_{NN}{suffix}`.
    pub async fn generate_fake_dataset(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        count: usize,
        method: Option<ForgeryMethod>,
        seed: Option<u64>,
    ) -> Result<BatchReport> {
        let output_dir = output_dir.as_ref();
        let files = list_images(input_dir)?;
        info!(
            "forging {} variants of {} genuine images",
            count,
            files.len()
        );

        let generator = self.clone();
        let report = process_sources(files, output_dir, seed, move |source, image, dir, rng| {
            for index in 1..=count {
                let (fake, method) = generator.create_fake(&image, method, rng)?;
                let name = source.fake_name(index);
                fake.save(dir.join(&name))?;
                debug!("created '{}' by {}", name, method.as_ref());
            }
            Ok(count)
        })
        .await?;

        info!(
            "{} fake documents written to '{}'",
            report.files_written,
            output_dir.display()
        );
        Ok(report)
    }

    fn white_out(&self, image: &Image, region: &RatioRegion) -> Result<Image> {
        let mut fake = image.clone();
        if let Some(tlbr) = region.to_pixel_box(image.height(), image.width())? {
            let [t, l, b, r] = tlbr.tlbr();
            fake.fill_rect(l as i32, t as i32, r as i32, b as i32, 255);
        }
        Ok(fake)
    }
}

/// White out a random text band and draw five short strokes over it.
fn alter_text<R>(image: &Image, rng: &mut R) -> Image
where
    R: Rng + ?Sized,
{
    let mut fake = image.clone();
    let w = image.width() as f64;
    let h = image.height() as f64;

    let x1 = (w * utils::uniform(rng, 0.1, 0.4)) as i32;
    let y1 = (h * utils::uniform(rng, 0.3, 0.6)) as i32;
    let x2 = (x1 as f64 + w * 0.3) as i32;
    let y2 = (y1 as f64 + h * 0.08) as i32;
    fake.fill_rect(x1, y1, x2, y2, 255);

    let inner = |lower: i32, upper: i32| (lower + 5, (upper - 5).max(lower + 5));
    let (x_lo, x_hi) = inner(x1, x2);
    let (y_lo, y_hi) = inner(y1, y2);

    for _ in 0..5 {
        let x = rng.gen_range(x_lo..=x_hi) as f32;
        let y = rng.gen_range(y_lo..=y_hi) as f32;
        fake.draw_line((x, y), (x + 20.0, y), 0);
    }

    fake
}

/// Photocopy-like degradation: heavy JPEG compression, blur and noise.
fn reduce_quality<R>(image: &Image, rng: &mut R) -> Result<Image>
where
    R: Rng + ?Sized,
{
    let quality = rng.gen_range(20..=50);
    let fake = image.jpeg_roundtrip(quality)?;
    let mut fake = photometric::gaussian_blur(&fake, 5);
    photometric::gaussian_noise(&mut fake, 15.0, rng)?;
    Ok(fake)
}

/// Shift all intensities, then unbalance one color channel.
fn shift_colors<R>(image: &Image, rng: &mut R) -> Image
where
    R: Rng + ?Sized,
{
    let mut fake = image.clone();

    // absolute value of the shifted intensity, as a scale-abs conversion does
    let shift: i32 = rng.gen_range(-30..=30);
    let table = {
        let mut table = [0u8; 256];
        table
            .iter_mut()
            .enumerate()
            .for_each(|(value, entry)| *entry = (value as i32 + shift).abs().min(255) as u8);
        table
    };
    fake.apply_lut(&table);

    let channels = fake.channels() as usize;
    let channel = rng.gen_range(0..channels);
    let balance: i32 = rng.gen_range(-20..=20);
    fake.samples_mut()
        .iter_mut()
        .skip(channel)
        .step_by(channels)
        .for_each(|sample| *sample = (*sample as i32 + balance).clamp(0, 255) as u8);

    fake
}

/// Scanner artifacts: light horizontal lines and black specks.
fn add_artifacts<R>(image: &mut Image, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let w = image.width() as i32;
    let h = image.height() as i32;

    for _ in 0..rng.gen_range(1..=3) {
        let y = rng.gen_range(0..=h) as f32;
        image.draw_line((0.0, y), (w as f32, y), 200);
    }

    for _ in 0..rng.gen_range(5..=15) {
        let x = rng.gen_range(0..=(w - 10).max(0));
        let y = rng.gen_range(0..=(h - 10).max(0));
        let radius = rng.gen_range(1..=3);
        image.draw_dot((x, y), radius, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genuine() -> Image {
        let mut image = Image::filled(200, 300, 3, 230).unwrap();
        image.fill_rect(30, 60, 150, 80, 20);
        image
    }

    #[test]
    fn remove_hologram_whites_out_corner() {
        let generator = ForgeryGenerator::default();
        let mut image = genuine();
        image.fill_rect(200, 10, 299, 90, 0);

        let mut rng = StdRng::seed_from_u64(0);
        let (fake, method) = generator
            .create_fake(&image, Some(ForgeryMethod::RemoveHologram), &mut rng)
            .unwrap();
        assert_eq!(method, ForgeryMethod::RemoveHologram);

        let Image::Rgb(buf) = &fake else { unreachable!() };
        // x in 210..=285, y in 20..=60
        assert_eq!(buf.get_pixel(210, 20).0, [255; 3]);
        assert_eq!(buf.get_pixel(285, 60).0, [255; 3]);
        assert_eq!(buf.get_pixel(290, 60).0, [0; 3]);
        assert_eq!(buf.get_pixel(250, 70).0, [0; 3]);
    }

    #[test]
    fn template_moves_watermark() {
        let template: Template = serde_json::from_value(serde_json::json!({
            "document_type": "kcse_certificate",
            "security_features": {
                "Watermark": { "region": { "x": 0.0, "y": 0.0, "width": 0.1, "height": 0.1 } }
            }
        }))
        .unwrap();
        let generator = ForgeryGenerator::default().with_template(&template);

        let image = Image::filled(100, 100, 1, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let (fake, _) = generator
            .create_fake(&image, Some(ForgeryMethod::MissingWatermark), &mut rng)
            .unwrap();
        let white = fake.samples().iter().filter(|&&v| v == 255).count();
        assert_eq!(white, 11 * 11);
    }

    #[test]
    fn every_method_keeps_shape() {
        let generator = ForgeryGenerator::default();
        let mut rng = StdRng::seed_from_u64(21);

        for channels in [1, 3] {
            let image = Image::filled(60, 90, channels, 180).unwrap();
            for method in ForgeryMethod::ALL {
                let (fake, _) = generator.create_fake(&image, Some(method), &mut rng).unwrap();
                assert_eq!(
                    (fake.height(), fake.width(), fake.channels()),
                    (60, 90, channels),
                    "{} changed the shape",
                    method.as_ref()
                );
                // a color shift may draw zero offsets
                if method != ForgeryMethod::ColorShift {
                    assert_ne!(fake, image, "{} left the image intact", method.as_ref());
                }
            }
        }
    }

    #[test]
    fn random_method_is_seeded() {
        let generator = ForgeryGenerator::default()
            .with_methods(vec![ForgeryMethod::AlterText, ForgeryMethod::ColorShift])
            .unwrap();
        let image = genuine();

        let forge = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            generator.create_fake(&image, None, &mut rng).unwrap()
        };
        let (first, method) = forge(8);
        assert!(generator.methods().contains(&method));
        assert_eq!(forge(8), (first, method));
    }

    #[test]
    fn shift_colors_takes_absolute_value() {
        let image = Image::filled(4, 4, 1, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let fake = shift_colors(&image, &mut rng);
        // every sample moved by the same global shift and the same balance
        let first = fake.samples()[0];
        assert!(fake.samples().iter().all(|&v| v == first));
        assert!(first <= 60);
    }

    #[test]
    fn reject_empty_method_set() {
        assert!(ForgeryGenerator::default().with_methods(vec![]).is_err());
    }
}
