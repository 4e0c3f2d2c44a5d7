use crate::{common::*, raster::Image};

/// Extensions of the image files picked up from input folders, matched
/// case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Number of leading files probed for a decodable sample in [folder_stats].
const STATS_PROBE_LIMIT: usize = 10;

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|expect| ext.eq_ignore_ascii_case(expect))
        })
        .unwrap_or(false)
}

/// List the image files directly inside `dir`, sorted by path.
///
/// A missing directory is reported and yields an empty list.
pub fn list_images(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        warn!("input directory not found: '{}'", dir.display());
        return Ok(vec![]);
    }

    let dir_str = dir
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 directory name '{}'", dir.display()))?;
    let pattern = format!("{}/*", glob::Pattern::escape(dir_str));

    let paths: Vec<_> = glob::glob(&pattern)?
        .map(|path| -> Result<_> { Ok(path?) })
        .filter_ok(|path| path.is_file() && is_image_file(path))
        .collect::<Result<_>>()?;
    let paths = paths.into_iter().sorted().collect();

    Ok(paths)
}

/// Count the image files in `dir`, zero if it does not exist.
pub fn count_images(dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(0);
    }
    Ok(list_images(dir)?.len())
}

/// An input image file and the names of the files derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    pub stem: String,
    /// The extension including the leading dot, in its original case.
    pub suffix: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| format_err!("invalid file name '{}'", path.display()))?
            .to_owned();
        let suffix = path
            .extension()
            .map(|ext| {
                let ext = ext
                    .to_str()
                    .ok_or_else(|| format_err!("invalid file name '{}'", path.display()))?;
                Ok::<_, Error>(format!(".{}", ext))
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self { path, stem, suffix })
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.stem, self.suffix)
    }

    /// The plainly resized copy of the source.
    pub fn original_name(&self) -> String {
        format!("{}_original{}", self.stem, self.suffix)
    }

    /// The `index`-th augmented variant, counting from 1.
    pub fn augmented_name(&self, index: usize) -> String {
        format!("{}_aug_{:02}{}", self.stem, index, self.suffix)
    }

    /// The `index`-th forged variant, counting from 1.
    pub fn fake_name(&self, index: usize) -> String {
        format!("{}_fake_{:02}{}", self.stem, index, self.suffix)
    }

    pub fn anonymized_name(&self) -> String {
        format!("anon_{}", self.file_name())
    }
}

/// The image count of a folder with the shape of one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderStats {
    pub folder: PathBuf,
    pub count: usize,
    pub sample: Option<SampleShape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleShape {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
}

/// Count the images in `dir` and read the shape of the first decodable one
/// among the leading files.
pub fn folder_stats(dir: impl AsRef<Path>) -> Result<FolderStats> {
    let dir = dir.as_ref();
    let files = if dir.is_dir() { list_images(dir)? } else { vec![] };

    let sample = files
        .iter()
        .take(STATS_PROBE_LIMIT)
        .find_map(|path| match Image::open(path) {
            Ok(image) => Some(SampleShape {
                height: image.height(),
                width: image.width(),
                channels: image.channels(),
            }),
            Err(err) => {
                debug!("{:#}", err);
                None
            }
        });

    Ok(FolderStats {
        folder: dir.to_owned(),
        count: files.len(),
        sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        let source = SourceFile::new("/data/raw/doc1.JPG").unwrap();
        assert_eq!(source.stem, "doc1");
        assert_eq!(source.suffix, ".JPG");
        assert_eq!(source.original_name(), "doc1_original.JPG");
        assert_eq!(source.augmented_name(3), "doc1_aug_03.JPG");
        assert_eq!(source.augmented_name(120), "doc1_aug_120.JPG");
        assert_eq!(source.fake_name(1), "doc1_fake_01.JPG");
        assert_eq!(source.anonymized_name(), "anon_doc1.JPG");
    }

    #[test]
    fn extension_filter() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("a.JPEG")));
        assert!(is_image_file(Path::new("dir/a.Png")));
        assert!(!is_image_file(Path::new("a.gif")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[test]
    fn list_sorted_images() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.jpeg", "notes.txt", "d.gif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.jpeg"]);
    }

    #[test]
    fn missing_folder() {
        assert!(list_images("/nonexistent/images").unwrap().is_empty());
        assert_eq!(count_images("/nonexistent/images").unwrap(), 0);
        let stats = folder_stats("/nonexistent/images").unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.sample, None);
    }

    #[test]
    fn stats_skip_undecodable_samples() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"not an image").unwrap();
        Image::filled(30, 40, 3, 128)
            .unwrap()
            .save(dir.path().join("b.png"))
            .unwrap();

        let stats = folder_stats(dir.path()).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(
            stats.sample,
            Some(SampleShape {
                height: 30,
                width: 40,
                channels: 3
            })
        );
    }
}
