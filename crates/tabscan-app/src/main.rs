// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tabscan — reads photographed savings reports into a grouped name list.
//
// Entry point. Initialises logging, loads the pipeline configuration, builds
// the OCR engine lazily, and prints the report for all images on stdout.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tabscan_core::error::Result;
use tabscan_core::{BATCH_FAILURE_MESSAGE, PipelineConfig};
use tabscan_document::{EngineHandle, ImageProcessor, OcrBackend};
use tabscan_table::run_batch;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tabscan",
    version,
    about = "Reconstruct group/person/flag rows from photographed report tables"
)]
struct Cli {
    /// Pipeline configuration (JSON). Missing keys keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding text-detection.rten and text-recognition.rten.
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Report photos, processed in the order given.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

type Backend = Box<dyn OcrBackend>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(images = cli.images.len(), "Tabscan starting");

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Configuration failed");
            println!("{BATCH_FAILURE_MESSAGE}");
            return ExitCode::FAILURE;
        }
    };

    let report = run(&cli.images, cli.models.clone(), &config);
    println!("{report}");
    if report == BATCH_FAILURE_MESSAGE {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Report for `images`; failures are already mapped to the generic message.
fn run(images: &[PathBuf], models: Option<PathBuf>, config: &PipelineConfig) -> String {
    let mut engine: EngineHandle<Backend> = EngineHandle::lazy(move || build_engine(models.as_deref()));
    let images = images
        .iter()
        .map(|path| ImageProcessor::open(path).map(ImageProcessor::into_dynamic));
    let report = run_batch(images, &mut engine, config);
    engine.shutdown();
    report
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            PipelineConfig::from_json_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

#[cfg(feature = "ocr")]
fn build_engine(models: Option<&Path>) -> Result<Backend> {
    use tabscan_document::OcrsBackend;

    let backend = match models {
        Some(dir) => OcrsBackend::from_model_dir(dir)?,
        None => OcrsBackend::with_defaults()?,
    };
    Ok(Box::new(backend))
}

#[cfg(not(feature = "ocr"))]
fn build_engine(_models: Option<&Path>) -> Result<Backend> {
    Err(tabscan_core::TabscanError::PlatformUnavailable(
        "OCR support not compiled in; rebuild with `--features ocr`",
    ))
}
