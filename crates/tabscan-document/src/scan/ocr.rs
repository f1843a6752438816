// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` recognition backend for Tabscan.
//
// Wraps the `ocrs` crate, a pure-Rust OCR engine backed by neural network
// models executed via `rten`, behind the [`OcrBackend`] trait.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// tabscan-document = { path = "crates/tabscan-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates words in the image.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Running the `ocrs-cli` tool once downloads both into the default cache
// directory, `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use tabscan_core::error::{Result, TabscanError};
use tabscan_core::{BoundingBox, SegmentationMode, WordToken};
use tracing::{debug, info, instrument};

use crate::scan::recognize::OcrBackend;

/// `ocrs` does not score its output; every token reports this confidence.
const UNSCORED_CONFIDENCE: f32 = 100.0;

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`, falling
/// back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Model locations for an [`OcrsBackend`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    /// Returns a config pointing at the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(TabscanError::EngineUnavailable(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Word-level recognizer built on `ocrs`.
///
/// Model loading is the expensive step; construct once per run (usually
/// through an `EngineHandle`) and reuse.
pub struct OcrsBackend {
    engine: OcrsEngine,
}

impl OcrsBackend {
    /// Load both models named by `config`.
    ///
    /// # Performance
    ///
    /// The `ocrs` and `rten` crates must be compiled in release mode; debug
    /// builds are 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = load_model(&config.detection_model_path)?;
        info!("Loading OCR recognition model");
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            TabscanError::EngineUnavailable(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised successfully");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }

    /// Load models from a specific directory.
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(OcrConfig::from_dir(dir))
    }
}

fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        TabscanError::EngineUnavailable(format!(
            "failed to load model from {}: {}",
            path.display(),
            err
        ))
    })
}

impl OcrBackend for OcrsBackend {
    /// `SparseText` recognizes every detected word on its own; `SingleBlock`
    /// first groups words into text lines so the recognizer sees context.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), %mode))]
    fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<Vec<WordToken>> {
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            TabscanError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| TabscanError::Ocr(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| TabscanError::Ocr(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let lines = match mode {
            SegmentationMode::SparseText => word_rects.iter().map(|rect| vec![*rect]).collect(),
            SegmentationMode::SingleBlock => self.engine.find_text_lines(&input, &word_rects),
        };

        let recognized = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|err| TabscanError::Ocr(format!("line recognition failed: {}", err)))?;

        let mut tokens = Vec::new();
        for line in recognized.iter().flatten() {
            for word in line.words() {
                let chars = word.chars();
                let text: String = chars.iter().map(|c| c.char).collect();
                if text.trim().is_empty() {
                    continue;
                }
                let bbox = chars.iter().fold(None::<BoundingBox>, |acc, c| {
                    let (x0, y0) = (c.rect.left() as f32, c.rect.top() as f32);
                    let (x1, y1) = (c.rect.right() as f32, c.rect.bottom() as f32);
                    Some(match acc {
                        None => BoundingBox::new(x0, y0, x1, y1),
                        Some(b) => BoundingBox::new(b.x0.min(x0), b.y0.min(y0), b.x1.max(x1), b.y1.max(y1)),
                    })
                });
                if let Some(bbox) = bbox {
                    tokens.push(WordToken::new(text, bbox, UNSCORED_CONFIDENCE));
                }
            }
        }

        debug!(token_count = tokens.len(), "Recognition finished");
        Ok(tokens)
    }
}
