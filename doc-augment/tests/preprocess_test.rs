use anyhow::Result;
use doc_augment::{
    dataset::list_images,
    preprocess::image_stats,
    processor::OutputSize,
    Image, PreprocessConfig, Preprocessor,
};
use std::fs;

#[tokio::test]
async fn preprocess_folder() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    let mut scan = Image::filled(120, 90, 3, 200)?;
    scan.fill_rect(10, 30, 80, 40, 30);
    scan.save(input.path().join("id_a.png"))?;
    Image::filled(60, 80, 1, 100)?.save(input.path().join("id_b.jpg"))?;
    fs::write(input.path().join("notes.txt"), b"not a scan")?;

    let preprocessor = Preprocessor::new(
        OutputSize {
            height: 32,
            width: 48,
        },
        PreprocessConfig::default(),
    );
    let report = preprocessor
        .preprocess_batch(input.path(), output.path())
        .await?;

    assert_eq!(report.sources, 2);
    assert_eq!(report.processed, 2);
    assert!(report.skipped.is_empty());

    let outputs = list_images(output.path())?;
    assert_eq!(
        outputs,
        vec![output.path().join("id_a.png"), output.path().join("id_b.jpg")]
    );

    let stats = image_stats(&outputs[0])?;
    assert_eq!((stats.height, stats.width, stats.channels), (32, 48, 3));
    let stats = image_stats(&outputs[1])?;
    assert_eq!((stats.height, stats.width, stats.channels), (32, 48, 1));

    Ok(())
}
