//! photostereo - photometric-stereo normal maps from three photographs
//!
//! Calibrates lights from a reference sphere, refines a light matrix by
//! local search and writes the reconstructed normal map.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use photostereo_rs::logger;
use photostereo_rs::photometric::{
    ImageFileReader, IntensityReader, NormalMapFormat, NormalMapPipeline,
    NormalMapWriter, PipelineConfig, StandardNormalMapWriter, TiffCompression, calibrate_files,
    compute_needles, WriteOptions, io::calibration_file, render_needles,
};

use tracing::{error, info};

#[derive(Parser)]
#[command(name = "photostereo")]
#[command(author, version, about = "Photometric-stereo normal maps from three photographs")]
#[command(long_about = "
Reconstructs surface normals from three photographs lit from different directions.

Examples:
  photostereo normal scans/mug 40 2000              # writes scans/mug/normal_40_2000.jpg
  photostereo normal scans/mug 40 2000 --format tiff --calibration lights.txt
  photostereo calibrate sphere.jpg l1.jpg l2.jpg l3.jpg 120 -o lights.txt
  photostereo needles final_1.jpg final_2.jpg final_3.jpg lights.txt 40 -o needles.png
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a light matrix and write the normal map of a scan folder
    #[command(visible_alias = "n")]
    Normal(NormalArgs),

    /// Estimate light vectors from photographs of a reference sphere
    #[command(visible_alias = "c")]
    Calibrate(CalibrateArgs),

    /// Draw a needle map of the normals over the first photograph
    Needles(NeedlesArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Jpg,
    Png,
    Tiff,
}

impl From<OutputFormat> for NormalMapFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jpg => NormalMapFormat::Jpeg,
            OutputFormat::Png => NormalMapFormat::Png,
            OutputFormat::Tiff => NormalMapFormat::Tiff,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lzw,
    Deflate,
}

impl From<Compression> for TiffCompression {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::Deflate => TiffCompression::DeflateBalanced,
        }
    }
}

#[derive(Args)]
struct NormalArgs {
    /// Folder holding final_1.jpg, final_2.jpg and final_3.jpg
    folder: PathBuf,

    /// Pixels at or below this intensity in any photograph are treated as shadow
    threshold: u8,

    /// Number of search iterations
    iterations: u64,

    /// Number of 2x downsampling steps applied before searching
    #[arg(long, default_value = "3")]
    levels: u32,

    /// Seed for a reproducible search
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jpg")]
    format: OutputFormat,

    /// TIFF compression
    #[arg(long, value_enum, default_value = "none")]
    compression: Compression,

    /// Light matrix file used as the starting point instead of a random
    /// matrix; real-valued entries are rounded and clamped
    #[arg(long)]
    calibration: Option<PathBuf>,
}

#[derive(Args)]
struct CalibrateArgs {
    /// Photograph of the sphere used to build the mask
    mask: PathBuf,

    /// Sphere photographed under the first light
    a: PathBuf,

    /// Sphere photographed under the second light
    b: PathBuf,

    /// Sphere photographed under the third light
    c: PathBuf,

    /// Mask binarization cutoff
    cutoff: u8,

    /// Write the light matrix here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the sphere centre and radius (`row col radius`) here
    #[arg(long)]
    centroid: Option<PathBuf>,
}

#[derive(Args)]
struct NeedlesArgs {
    a: PathBuf,
    b: PathBuf,
    c: PathBuf,

    /// Light matrix file
    calibration: PathBuf,

    /// Shadow threshold
    threshold: u8,

    /// Needle spacing in pixels
    #[arg(long, default_value = "10")]
    step: usize,

    /// Output image (format from extension)
    #[arg(short, long)]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    logger::init_with_default(if cli.verbose { "debug" } else { "info" });

    let result = match cli.command {
        Commands::Normal(args) => run_normal(args),
        Commands::Calibrate(args) => run_calibrate(args),
        Commands::Needles(args) => run_needles(args),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_normal(args: NormalArgs) -> Result<()> {
    if !args.folder.is_dir() {
        bail!("{} is not a directory", args.folder.display());
    }

    let initial = match &args.calibration {
        Some(path) => {
            let seed = calibration_file::read_search_seed(path)
                .with_context(|| format!("reading calibration {}", path.display()))?;
            info!(matrix = %seed, "Search seeded from calibration file");
            Some(seed)
        }
        None => None,
    };

    let config = PipelineConfig::builder()
        .threshold(args.threshold)
        .iterations(args.iterations)
        .search_levels(args.levels)
        .seed(args.seed)
        .initial(initial)
        .format(args.format.into())
        .compression(args.compression.into())
        .build();

    let pipeline = NormalMapPipeline::new(config);
    info!("Normal map pipeline initialized");

    let report = pipeline
        .run_folder(&args.folder)
        .with_context(|| format!("processing {}", args.folder.display()))?;

    info!(
        accepted = report.accepted,
        cost = report.search_cost,
        valid = report.valid_pixels,
        "Done"
    );
    println!("{}", report.best_matrix);
    Ok(())
}

fn run_calibrate(args: CalibrateArgs) -> Result<()> {
    let calibration = calibrate_files(
        &ImageFileReader,
        &args.mask,
        [args.a.as_path(), args.b.as_path(), args.c.as_path()],
        args.cutoff,
    )
    .context("sphere calibration failed")?;

    match &args.output {
        Some(path) => {
            calibration_file::write_light_matrix(path, &calibration.lights)?;
            info!(output = %path.display(), "Light matrix written");
        }
        None => print!("{}", calibration_file::format_light_matrix(&calibration.lights)),
    }
    if let Some(path) = &args.centroid {
        calibration_file::write_centroid(path, &calibration.centroid)?;
        info!(output = %path.display(), "Sphere centroid written");
    }
    Ok(())
}

fn run_needles(args: NeedlesArgs) -> Result<()> {
    let reader = ImageFileReader;
    let load = |path: &Path| {
        reader
            .read_gray_file(path)
            .with_context(|| format!("loading {}", path.display()))
    };
    let (a, b, c) = (load(&args.a)?, load(&args.b)?, load(&args.c)?);
    let lights = calibration_file::read_light_matrix(&args.calibration)?;

    let needles = compute_needles(&a, &b, &c, args.threshold, &lights, args.step)?;
    let canvas = render_needles(&a, &needles);

    let extension = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let options = WriteOptions {
        format: NormalMapFormat::from_extension(extension)?,
        ..WriteOptions::default()
    };

    let mut file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    StandardNormalMapWriter.write_field(&canvas, &mut file, &options)?;

    info!(needles = needles.len(), output = %args.output.display(), "Needle map written");
    Ok(())
}
