use super::SourceFile;
use crate::{common::*, raster::Image};

/// The outcome of a batch run over a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Number of source files found.
    pub sources: usize,
    /// Number of sources decoded and processed.
    pub processed: usize,
    /// Sources that could not be named or decoded.
    pub skipped: Vec<PathBuf>,
    pub files_written: usize,
}

/// Decode every source file and hand it to `job` in parallel.
///
/// The job writes its outputs into `output_dir` and returns the number of
/// files written. Sources with a non-UTF-8 file name or undecodable content
/// are reported and skipped. Failing to create the output directory or to
/// write an output aborts the batch.
///
/// Each source gets its own generator. With a seed, per-source seeds are
/// drawn in file order from a master generator so the outputs do not depend
/// on scheduling.
pub async fn process_sources<F>(
    files: Vec<PathBuf>,
    output_dir: impl AsRef<Path>,
    seed: Option<u64>,
    job: F,
) -> Result<BatchReport>
where
    F: 'static + Fn(&SourceFile, Image, &Path, &mut StdRng) -> Result<usize> + Send + Sync,
{
    let output_dir = output_dir.as_ref();
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| {
            format!(
                "unable to create output directory '{}'",
                output_dir.display()
            )
        })?;

    let num_sources = files.len();
    let mut master = seed.map(StdRng::seed_from_u64);
    let mut skipped = vec![];

    // seeds are drawn for every file, so a skipped file does not shift the
    // seeds of the files after it
    let sources: Vec<(SourceFile, Option<u64>)> = files
        .into_iter()
        .filter_map(|path| {
            let seed = master.as_mut().map(|master| master.gen());
            match SourceFile::new(path.clone()) {
                Ok(source) => Some((source, seed)),
                Err(err) => {
                    warn!("skip '{}': {:#}", path.display(), err);
                    skipped.push(path);
                    None
                }
            }
        })
        .collect();

    let outcomes: Vec<(PathBuf, Option<usize>)> = {
        let output_dir = Arc::new(output_dir.to_owned());
        let job = Arc::new(job);

        stream::iter(sources)
            .par_map(None, move |(source, seed)| {
                let output_dir = output_dir.clone();
                let job = job.clone();

                move || -> Result<_> {
                    let image = match Image::open(&source.path) {
                        Ok(image) => image,
                        Err(err) => {
                            warn!("skip '{}': {:#}", source.path.display(), err);
                            return Ok((source.path, None));
                        }
                    };
                    let mut rng = match seed {
                        Some(seed) => StdRng::seed_from_u64(seed),
                        None => StdRng::from_entropy(),
                    };

                    let written = (*job)(&source, image, &output_dir, &mut rng)
                        .with_context(|| format!("failed to process '{}'", source.path.display()))?;
                    Ok((source.path, Some(written)))
                }
            })
            .try_collect()
            .await?
    };

    let report = outcomes.into_iter().fold(
        BatchReport {
            sources: num_sources,
            skipped,
            ..Default::default()
        },
        |mut report, (path, written)| {
            match written {
                Some(count) => {
                    report.processed += 1;
                    report.files_written += count;
                }
                None => report.skipped.push(path),
            }
            report
        },
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn skip_non_utf8_file_name() -> Result<()> {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = tempfile::tempdir()?;
        let good = dir.path().join("scan.png");
        Image::filled(8, 8, 1, 128)?.save(&good)?;
        let bad = dir.path().join(OsStr::from_bytes(b"scan_\xff.png"));
        let output = dir.path().join("out");

        let report = process_sources(
            vec![bad.clone(), good],
            &output,
            Some(1),
            |source, image, dir, _rng| {
                image.save(dir.join(source.file_name()))?;
                Ok(1)
            },
        )
        .await?;

        assert_eq!(report.sources, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.files_written, 1);
        assert_eq!(report.skipped, vec![bad]);
        assert!(output.join("scan.png").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn skip_undecodable_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let broken = dir.path().join("broken.jpg");
        fs::write(&broken, b"not an image")?;
        let output = dir.path().join("out");

        let report = process_sources(vec![broken.clone()], &output, None, |_, _, _, _| Ok(1)).await?;
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, vec![broken]);
        assert!(output.is_dir());
        Ok(())
    }
}
