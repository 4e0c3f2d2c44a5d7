use anyhow::Result;
use doc_augment::{
    dataset::list_images,
    processor::{OutputSize, PipelineVariant},
    AugmentationEngine, AugmentationEngineInit, Image,
};
use std::{fs, path::Path};

/// A synthetic scan: white paper with dark text bars.
fn write_document(path: &Path, height: u32, width: u32) -> Result<()> {
    let mut image = Image::filled(height, width, 3, 245)?;
    let (h, w) = (height as i32, width as i32);
    image.fill_rect(w / 10, h / 5, w / 2, h / 5 + h / 20, 30);
    image.fill_rect(w / 10, h / 3, w * 3 / 5, h / 3 + h / 20, 40);
    image.fill_rect(w * 7 / 10, h / 10, w * 9 / 10, h * 3 / 10, 150);
    image.save(path)
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<_> = fs::read_dir(dir)?
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_>>()?;
    names.sort();
    Ok(names)
}

#[tokio::test]
async fn augment_single_document() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_document(&input.path().join("doc1.jpg"), 600, 800)?;

    let engine = AugmentationEngine::new(OutputSize::default())?;
    let report = engine
        .augment_dataset(input.path(), output.path(), 5, PipelineVariant::Full)
        .await?;

    assert_eq!(report.sources, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(report.files_written, 6);
    assert!(report.skipped.is_empty());

    assert_eq!(
        file_names(output.path())?,
        vec![
            "doc1_aug_01.jpg",
            "doc1_aug_02.jpg",
            "doc1_aug_03.jpg",
            "doc1_aug_04.jpg",
            "doc1_aug_05.jpg",
            "doc1_original.jpg",
        ]
    );

    for path in list_images(output.path())? {
        let image = Image::open(&path)?;
        assert_eq!(
            (image.height(), image.width(), image.channels()),
            (224, 224, 3),
            "unexpected shape of '{}'",
            path.display()
        );
    }

    Ok(())
}

#[tokio::test]
async fn undecodable_files_are_skipped() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    for name in ["a.jpg", "b.png", "c.JPEG"] {
        write_document(&input.path().join(name), 120, 90)?;
    }
    fs::write(input.path().join("corrupt.jpg"), b"definitely not a jpeg")?;
    fs::write(input.path().join("readme.txt"), b"ignored")?;

    let engine = AugmentationEngine::new(OutputSize {
        height: 64,
        width: 64,
    })?;
    let count = 3;
    let report = engine
        .augment_dataset(input.path(), output.path(), count, PipelineVariant::Light)
        .await?;

    assert_eq!(report.sources, 4);
    assert_eq!(report.processed, 3);
    assert_eq!(report.skipped, vec![input.path().join("corrupt.jpg")]);
    assert_eq!(report.files_written, 3 * (count + 1));
    assert_eq!(list_images(output.path())?.len(), 3 * (count + 1));
    assert!(output.path().join("c_aug_03.JPEG").is_file());

    Ok(())
}

#[tokio::test]
async fn seeded_runs_are_identical() -> Result<()> {
    let input = tempfile::tempdir()?;
    for index in 0..4 {
        write_document(&input.path().join(format!("scan_{}.png", index)), 80, 100)?;
    }

    let mut init = AugmentationEngineInit::new(OutputSize {
        height: 48,
        width: 48,
    });
    init.seed = Some(1234);
    let engine = init.build()?;

    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;
    engine
        .augment_dataset(input.path(), first.path(), 2, PipelineVariant::Full)
        .await?;
    engine
        .augment_dataset(input.path(), second.path(), 2, PipelineVariant::Full)
        .await?;

    let names = file_names(first.path())?;
    assert_eq!(names, file_names(second.path())?);
    assert_eq!(names.len(), 12);
    for name in names {
        assert_eq!(
            fs::read(first.path().join(&name))?,
            fs::read(second.path().join(&name))?,
            "'{}' differs between seeded runs",
            name
        );
    }

    Ok(())
}

#[tokio::test]
async fn missing_input_writes_nothing() -> Result<()> {
    let output = tempfile::tempdir()?;
    let target = output.path().join("nested").join("out");

    let engine = AugmentationEngine::new(OutputSize::default())?;
    let report = engine
        .augment_dataset("/nonexistent/input", &target, 5, PipelineVariant::Full)
        .await?;

    assert_eq!(report.sources, 0);
    assert_eq!(report.files_written, 0);
    assert!(target.is_dir());
    Ok(())
}
