use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gold_density::{
    BatchConfig, BatchReport, BatchRun, HostCommandMeasurer, OutlineFileSelector, PromptSelector,
};
use tracing::Level;

/// Tabulate gold particle densities for every image/mask pair in a folder:
/// - you outline the cell and its pyrenoid for each image
/// - an external engine measures area and particle count per region
/// - one CSV row per region is written to the folder
#[derive(Parser, Debug)]
#[command(name = "gold-density")]
#[command(about = "Measure pyrenoid and cytoplasm gold densities over a folder of images")]
#[command(long_about = "For every <name>.tif with a matching <name>_seg.tif, ask for the cell and \
pyrenoid outlines, save them to <name>_rois.zip, measure the pyrenoid and the cell minus the \
pyrenoid with an external engine, and write all densities to _GoldResults.csv.")]
struct Args {
    /// Folder holding images and segmentation masks
    folder: PathBuf,

    /// Measurement engine executable
    #[arg(short, long, help = "Engine run per region as: <engine> [engine-args] <image> <mask>")]
    engine: String,

    /// Extra arguments for the engine, repeatable
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Read outlines from <name>_outlines.json instead of asking
    #[arg(long)]
    outlines_from_files: bool,

    /// Image extension, case-sensitive
    #[arg(long, default_value = gold_density::config::DEFAULT_EXTENSION)]
    extension: String,

    /// Mask suffix inserted before the extension
    #[arg(long, default_value = gold_density::config::DEFAULT_MASK_SUFFIX)]
    mask_suffix: String,

    /// Result table file name, written inside the folder
    #[arg(long, default_value = gold_density::config::DEFAULT_RESULTS_FILE)]
    results_file: String,

    /// Prefix region labels with the image name (cellA:pyre)
    #[arg(long)]
    qualify_labels: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = BatchConfig::new(&args.folder)
        .with_extension(&args.extension)
        .with_mask_suffix(&args.mask_suffix)
        .with_results_file(&args.results_file)
        .with_qualified_labels(args.qualify_labels);
    config
        .validate()
        .with_context(|| format!("invalid settings for {}", args.folder.display()))?;

    let engine = HostCommandMeasurer::new(&args.engine).with_args(&args.engine_args);

    let report = if args.outlines_from_files {
        BatchRun::new(config, OutlineFileSelector::new(), engine).run()
    } else {
        BatchRun::new(config, PromptSelector::stdio(), engine).run()
    }
    .context("batch failed")?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!(
        "Processed {} image(s), wrote {} row(s) to {}",
        report.images_processed,
        report.rows_written,
        report.results_path.display()
    );
    for skipped in &report.images_skipped {
        println!("  skipped image {}: {}", skipped.stem, skipped.reason);
    }
    for skipped in &report.regions_skipped {
        println!(
            "  skipped region {} of {}: {}",
            skipped.label, skipped.stem, skipped.reason
        );
    }
}
