use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use odoscan_core::DistanceUnit;
use odoscan_ocr::{
    preprocess, MileagePipeline, PipelineConfig, RecognitionResult, ReplayRecognizer,
    TextRecognizer,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Read the mileage from a photo of an odometer.
#[derive(Parser, Debug)]
#[command(name = "odoscan", version, about)]
struct Args {
    /// Photo of the odometer, already oriented and cropped to the display.
    image: PathBuf,

    /// Last known mileage of the vehicle.
    #[arg(long)]
    prior: Option<u32>,

    /// Pipeline settings (TOML). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay recorded recognizer output (JSON) instead of running an engine.
    #[arg(long)]
    observations: Option<PathBuf>,

    /// Unit to report when none is printed on the display.
    #[arg(long)]
    default_unit: Option<DistanceUnit>,

    /// Also report the reading converted to this unit.
    #[arg(long)]
    convert_to: Option<DistanceUnit>,

    /// Write every preprocessing variant as PNG into this directory.
    #[arg(long)]
    dump_variants: Option<PathBuf>,

    /// Tesseract data directory.
    #[cfg(feature = "tesseract")]
    #[arg(long)]
    tessdata: Option<String>,

    /// Tesseract language.
    #[cfg(feature = "tesseract")]
    #[arg(long, default_value = "eng")]
    lang: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct Report {
    #[serde(flatten)]
    result: RecognitionResult,
    /// Detected unit, or the default when the display showed none.
    unit: Option<DistanceUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    converted: Option<Converted>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Converted {
    mileage: u32,
    unit: DistanceUnit,
}

fn build_report(
    result: RecognitionResult,
    default_unit: Option<DistanceUnit>,
    convert_to: Option<DistanceUnit>,
) -> Report {
    let unit = result.detected_unit.or(default_unit);
    let converted = unit.zip(convert_to).map(|(from, to)| Converted {
        mileage: DistanceUnit::convert_mileage(result.mileage.value(), from, to),
        unit: to,
    });
    Report { result, unit, converted }
}

fn dump_variants(image_path: &Path, dir: &Path, config: &PipelineConfig) -> Result<()> {
    let bytes = std::fs::read(image_path)
        .with_context(|| format!("failed to read {}", image_path.display()))?;
    let image = preprocess::load_image(&bytes)?;
    std::fs::create_dir_all(dir)?;
    for variant in preprocess::preprocess(&image, &config.preprocess)? {
        let out = dir.join(format!("{}.png", variant.method));
        variant
            .image
            .save(&out)
            .with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!("Wrote {}", out.display());
    }
    Ok(())
}

#[cfg(feature = "tesseract")]
fn engine_recognizer(args: &Args) -> Result<Box<dyn TextRecognizer>> {
    use odoscan_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    Ok(Box::new(TesseractRecognizer::new(args.tessdata.clone(), &args.lang)))
}

#[cfg(not(feature = "tesseract"))]
fn engine_recognizer(_args: &Args) -> Result<Box<dyn TextRecognizer>> {
    Err(odoscan_ocr::OcrError::NotAvailable).context("pass --observations to replay recorded output")
}

fn build_recognizer(args: &Args) -> Result<Box<dyn TextRecognizer>> {
    match &args.observations {
        Some(path) => Ok(Box::new(ReplayRecognizer::load(path)?)),
        None => engine_recognizer(args),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.dump_variants {
        dump_variants(&args.image, dir, &config)?;
    }

    let pipeline = MileagePipeline::with_config(build_recognizer(&args)?, config);
    let result = pipeline.recognize_file(&args.image, args.prior).await?;
    tracing::info!("Read {} from {}", result.mileage, args.image.display());

    let report = build_report(result, args.default_unit, args.convert_to);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
