use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use doc_augment::{
    anonymize::resolve_regions,
    dataset::{folder_stats, BatchReport, SplitReport},
    preprocess::image_stats,
    processor::PipelineVariant,
    Anonymizer, Config, ForgeryGenerator, ForgeryMethod, RedactionMethod,
};
use doc_template::TemplateRegistry;
use log::info;
use prettytable::{cell, row, Table};
use std::{env, path::PathBuf};

#[derive(Debug, Clone, Parser)]
/// Prepare document images for forgery detection training
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Write augmented variants of every image in a folder
    Augment {
        /// input image folder
        input_dir: Option<PathBuf>,
        /// output folder
        output_dir: Option<PathBuf>,
        /// augmented variants per image
        #[clap(default_value = "10")]
        count: usize,
        /// use the light validation pipeline
        #[clap(long)]
        light: bool,
        /// JSON5 configuration file
        #[clap(long)]
        config: Option<PathBuf>,
        /// random seed, overrides the configuration
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Split a folder into augmented train and validation sets
    Split {
        /// input image folder
        input_dir: Option<PathBuf>,
        /// output folder receiving train/ and validation/
        output_base: Option<PathBuf>,
        /// augmented variants per training image
        train_count: Option<usize>,
        /// augmented variants per validation image
        val_count: Option<usize>,
        /// JSON5 configuration file
        #[clap(long)]
        config: Option<PathBuf>,
        /// random seed, overrides the configuration
        #[clap(long)]
        seed: Option<u64>,
        /// shuffle the images with this seed before splitting
        #[clap(long)]
        shuffle_seed: Option<u64>,
    },
    /// Hide personal fields on document images
    Anonymize {
        /// input image folder
        input_dir: Option<PathBuf>,
        /// output folder
        output_dir: Option<PathBuf>,
        /// document type: national_id, certificate, passport or a template name
        document_type: Option<String>,
        /// blur or blackout
        #[clap(default_value = "blur")]
        method: RedactionMethod,
        /// template folder
        #[clap(long)]
        templates: Option<PathBuf>,
    },
    /// Create fake documents from genuine ones
    Forge {
        /// input image folder
        input_dir: Option<PathBuf>,
        /// output folder
        output_dir: Option<PathBuf>,
        /// fakes per image
        #[clap(default_value = "1")]
        count: usize,
        /// forgery method, drawn at random when absent
        #[clap(long)]
        method: Option<ForgeryMethod>,
        /// random seed
        #[clap(long)]
        seed: Option<u64>,
        /// template folder
        #[clap(long)]
        templates: Option<PathBuf>,
        /// template that locates the security features
        #[clap(long)]
        document_type: Option<String>,
    },
    /// Denoise, enhance and resize every image in a folder
    Preprocess {
        /// input image folder
        input_dir: Option<PathBuf>,
        /// output folder
        output_dir: Option<PathBuf>,
        /// skip the median denoising
        #[clap(long)]
        no_denoise: bool,
        /// skip the contrast enhancement
        #[clap(long)]
        no_enhance: bool,
        /// JSON5 configuration file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Show pixel statistics of image files
    Inspect {
        /// image files
        files: Vec<PathBuf>,
    },
    /// Show image counts of folders
    Stats {
        /// image folders
        folders: Vec<PathBuf>,
    },
    /// List the document templates
    Templates {
        /// template folder
        #[clap(long, default_value = "templates")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // log at info level unless RUST_LOG says otherwise
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let Args { command } = Args::parse();
    let command = match command {
        Some(command) => command,
        None => {
            Args::command().print_help()?;
            println!();
            return Ok(());
        }
    };

    match command {
        Command::Augment {
            input_dir,
            output_dir,
            count,
            light,
            config,
            seed,
        } => {
            let (input_dir, output_dir) = match (input_dir, output_dir) {
                (Some(input_dir), Some(output_dir)) => (input_dir, output_dir),
                _ => return print_usage("augment"),
            };
            let mut config = load_config(config)?;
            if seed.is_some() {
                config.seed = seed;
            }
            let variant = if light {
                PipelineVariant::Light
            } else {
                PipelineVariant::Full
            };

            let engine = config.build_engine()?;
            let report = engine
                .augment_dataset(&input_dir, &output_dir, count, variant)
                .await?;
            print_batch_reports(&[("augmented", &report)]);
        }
        Command::Split {
            input_dir,
            output_base,
            train_count,
            val_count,
            config,
            seed,
            shuffle_seed,
        } => {
            let (input_dir, output_base) = match (input_dir, output_base) {
                (Some(input_dir), Some(output_base)) => (input_dir, output_base),
                _ => return print_usage("split"),
            };
            let mut config = load_config(config)?;
            if seed.is_some() {
                config.seed = seed;
            }
            if shuffle_seed.is_some() {
                config.split.shuffle_seed = shuffle_seed;
            }
            let train_count = train_count.unwrap_or(config.train_count);
            let val_count = val_count.unwrap_or(config.val_count);

            let splitter = config.build_splitter()?;
            let report = splitter
                .create_split(&input_dir, &output_base, train_count, val_count)
                .await?;
            print_split_report(&report);
        }
        Command::Anonymize {
            input_dir,
            output_dir,
            document_type,
            method,
            templates,
        } => {
            let (input_dir, output_dir, document_type) =
                match (input_dir, output_dir, document_type) {
                    (Some(input_dir), Some(output_dir), Some(document_type)) => {
                        (input_dir, output_dir, document_type)
                    }
                    _ => return print_usage("anonymize"),
                };

            let registry = templates
                .map(|dir| TemplateRegistry::init_global(dir))
                .transpose()?;
            let regions = resolve_regions(&document_type, registry)?;
            info!(
                "hiding {} for {}",
                regions.iter().map(|region| region.name.as_str()).collect::<Vec<_>>().join(", "),
                document_type
            );

            let report = Anonymizer::default()
                .batch_anonymize(&input_dir, &output_dir, regions, method)
                .await?;
            print_batch_reports(&[("anonymized", &report)]);
        }
        Command::Forge {
            input_dir,
            output_dir,
            count,
            method,
            seed,
            templates,
            document_type,
        } => {
            let (input_dir, output_dir) = match (input_dir, output_dir) {
                (Some(input_dir), Some(output_dir)) => (input_dir, output_dir),
                _ => return print_usage("forge"),
            };

            let mut generator = ForgeryGenerator::default();
            if let (Some(templates), Some(document_type)) = (templates, document_type) {
                let registry = TemplateRegistry::init_global(templates)?;
                generator = generator.with_template(registry.template(&document_type)?);
            }

            let report = generator
                .generate_fake_dataset(&input_dir, &output_dir, count, method, seed)
                .await?;
            print_batch_reports(&[("forged", &report)]);
        }
        Command::Preprocess {
            input_dir,
            output_dir,
            no_denoise,
            no_enhance,
            config,
        } => {
            let (input_dir, output_dir) = match (input_dir, output_dir) {
                (Some(input_dir), Some(output_dir)) => (input_dir, output_dir),
                _ => return print_usage("preprocess"),
            };
            let mut config = load_config(config)?;
            if no_denoise {
                config.preprocess.denoise = false;
            }
            if no_enhance {
                config.preprocess.enhance = false;
            }

            let report = config
                .build_preprocessor()
                .preprocess_batch(&input_dir, &output_dir)
                .await?;
            print_batch_reports(&[("preprocessed", &report)]);
        }
        Command::Inspect { files } => {
            if files.is_empty() {
                return print_usage("inspect");
            }
            print_image_stats(&files)?;
        }
        Command::Stats { folders } => {
            if folders.is_empty() {
                return print_usage("stats");
            }
            print_stats(&folders)?;
        }
        Command::Templates { dir } => {
            let registry = TemplateRegistry::init_global(&dir)?;
            print_templates(registry);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::open(&path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => Ok(Config::default()),
    }
}

fn print_usage(subcommand: &str) -> Result<()> {
    let mut command = Args::command();
    match command.find_subcommand_mut(subcommand) {
        Some(subcommand) => subcommand.print_help()?,
        None => command.print_help()?,
    }
    println!();
    Ok(())
}

fn print_batch_reports(reports: &[(&str, &BatchReport)]) {
    let mut table = Table::new();
    table.add_row(row!["set", "sources", "processed", "skipped", "files written"]);

    reports.iter().for_each(|(name, report)| {
        table.add_row(row![
            name,
            report.sources,
            report.processed,
            report.skipped.len(),
            report.files_written
        ]);
    });

    table.printstd();
}

fn print_split_report(report: &SplitReport) {
    print_batch_reports(&[("train", &report.train), ("validation", &report.validation)]);

    let mut table = Table::new();
    table.add_row(row!["folder", "images on disk"]);
    table.add_row(row![report.train_dir.display(), report.train_files]);
    table.add_row(row![report.validation_dir.display(), report.validation_files]);
    table.printstd();
}

fn print_stats(folders: &[PathBuf]) -> Result<()> {
    let mut table = Table::new();
    table.add_row(row!["folder", "images", "sample size"]);

    let mut total = 0;
    for folder in folders {
        let stats = folder_stats(folder)?;
        total += stats.count;

        let sample = stats
            .sample
            .map(|shape| format!("{}x{}x{}", shape.height, shape.width, shape.channels))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(row![folder.display(), stats.count, sample]);
    }
    table.add_row(row!["total", total, ""]);

    table.printstd();
    Ok(())
}

fn print_image_stats(files: &[PathBuf]) -> Result<()> {
    let mut table = Table::new();
    table.add_row(row!["file", "shape", "size (MB)", "mean", "std", "min", "max"]);

    for file in files {
        let stats = image_stats(file)?;
        table.add_row(row![
            file.display(),
            format!("{}x{}x{}", stats.height, stats.width, stats.channels),
            format!("{:.2}", stats.file_size_mb),
            format!("{:.2}", stats.mean),
            format!("{:.2}", stats.std),
            stats.min,
            stats.max
        ]);
    }

    table.printstd();
    Ok(())
}

fn print_templates(registry: &TemplateRegistry) {
    let mut table = Table::new();
    table.add_row(row![
        "document type",
        "security features",
        "data fields",
        "forgery indicators"
    ]);

    registry.document_types().into_iter().for_each(|document_type| {
        if let Ok(template) = registry.template(document_type) {
            table.add_row(row![
                document_type,
                template.security_features.keys().cloned().collect::<Vec<_>>().join("\n"),
                template.data_fields.keys().cloned().collect::<Vec<_>>().join("\n"),
                template.forgery_indicators.join("\n")
            ]);
        }
    });

    table.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn sample_config_is_valid() -> Result<()> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("dataset.json5");
        let config = Config::open(path)?;
        assert_eq!(config.train_count, 10);
        assert_eq!(config.val_count, 3);
        config.build_splitter()?;
        Ok(())
    }

    #[test]
    fn parse_subcommands() {
        let args = Args::try_parse_from(["doc-tool", "augment", "raw", "out", "5", "--light"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Augment { count: 5, light: true, .. })
        ));

        let args = Args::try_parse_from(["doc-tool", "anonymize", "raw", "out", "passport", "blackout"])
            .unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Anonymize {
                method: RedactionMethod::Blackout,
                ..
            })
        ));

        let args = Args::try_parse_from(["doc-tool", "split"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Split { input_dir: None, .. })
        ));

        let args = Args::try_parse_from(["doc-tool", "preprocess", "raw", "clean", "--no-enhance"])
            .unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Preprocess {
                no_denoise: false,
                no_enhance: true,
                ..
            })
        ));

        let args = Args::try_parse_from(["doc-tool", "forge", "in", "out", "--method", "alter_text"])
            .unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Forge {
                count: 1,
                method: Some(ForgeryMethod::AlterText),
                ..
            })
        ));
    }
}
