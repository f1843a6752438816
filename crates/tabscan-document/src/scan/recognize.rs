// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition boundary — the engine trait, the lazily constructed engine
// handle, and the attempt-list policy that squeezes the most words out of a
// photo.
//
// Engines are black boxes: the core only asks for word tokens under a given
// segmentation mode and, optionally, for the page orientation. Individual
// attempts may fail; the policy treats a failed attempt as zero words and
// moves on.

use image::{DynamicImage, GrayImage};
use tabscan_core::error::{Result, TabscanError};
use tabscan_core::{BoundingBox, PipelineConfig, SegmentationMode, WordToken};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::preprocess::PreparedImage;

/// A text-recognition engine.
pub trait OcrBackend {
    /// Recognize word tokens in `image` using the given segmentation mode.
    fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<Vec<WordToken>>;

    /// Detected page rotation in degrees, if the engine supports detection.
    fn detect_orientation(&self, _image: &GrayImage) -> Result<Option<i32>> {
        Ok(None)
    }
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<Vec<WordToken>> {
        (**self).recognize(image, mode)
    }

    fn detect_orientation(&self, image: &GrayImage) -> Result<Option<i32>> {
        (**self).detect_orientation(image)
    }
}

// -- Engine handle ------------------------------------------------------------

type EngineFactory<B> = Box<dyn FnMut() -> Result<B>>;

/// Owned, lazily constructed engine.
///
/// The factory runs on first use and at most once successfully; the engine
/// then serves every recognition call of the run. A failed construction is
/// reported to the caller and attempted again on the next call.
pub struct EngineHandle<B> {
    factory: Option<EngineFactory<B>>,
    engine: Option<B>,
}

impl<B: OcrBackend> EngineHandle<B> {
    /// Defer construction until the first recognition call.
    pub fn lazy(factory: impl FnMut() -> Result<B> + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            engine: None,
        }
    }

    /// Wrap an engine that already exists.
    pub fn ready(engine: B) -> Self {
        Self {
            factory: None,
            engine: Some(engine),
        }
    }

    /// Whether the engine has been constructed.
    pub fn is_initialised(&self) -> bool {
        self.engine.is_some()
    }

    /// Borrow the engine, constructing it on first use.
    pub fn get(&mut self) -> Result<&B> {
        if self.engine.is_none() {
            let factory = self.factory.as_mut().ok_or_else(|| {
                TabscanError::EngineUnavailable("engine handle was shut down".into())
            })?;
            info!("Initialising OCR engine");
            let engine = factory()?;
            self.engine = Some(engine);
            self.factory = None;
        }
        self.engine
            .as_ref()
            .ok_or_else(|| TabscanError::EngineUnavailable("engine missing after init".into()))
    }

    /// Release the engine. Only the owner of the run calls this, at exit.
    pub fn shutdown(self) -> Option<B> {
        if self.engine.is_some() {
            info!("Shutting down OCR engine");
        }
        self.engine
    }
}

// -- Attempt policy -----------------------------------------------------------

/// Buffer transformation applied before one recognition attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttemptTransform {
    /// Recognize the buffer as-is.
    Identity,
    /// Recognize an upscaled copy; boxes are mapped back to the original scale.
    Upscale(f32),
}

/// One `(mode, transform)` recognition attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub mode: SegmentationMode,
    pub transform: AttemptTransform,
}

/// Outcome of running the policy over one buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    /// Tokens from the selected attempt, in buffer coordinates.
    pub words: Vec<WordToken>,
    /// Clockwise rotation applied to the buffer before recognition.
    pub rotation: Option<f32>,
    /// Number of attempts that were executed.
    pub attempts_run: usize,
}

/// Ordered recognition attempts with a uniform acceptance rule.
///
/// Attempts run in order until one yields at least `min_words` tokens. If
/// none does, the attempt with the most tokens wins; ties keep the earlier
/// attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionPolicy {
    attempts: Vec<Attempt>,
    min_words: usize,
}

impl Default for RecognitionPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl RecognitionPolicy {
    /// Sparse text, then single block, then single block on an upscaled copy.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            attempts: vec![
                Attempt {
                    mode: SegmentationMode::SparseText,
                    transform: AttemptTransform::Identity,
                },
                Attempt {
                    mode: SegmentationMode::SingleBlock,
                    transform: AttemptTransform::Identity,
                },
                Attempt {
                    mode: SegmentationMode::SingleBlock,
                    transform: AttemptTransform::Upscale(config.retry_upscale),
                },
            ],
            min_words: config.min_words,
        }
    }

    pub fn with_attempts(attempts: Vec<Attempt>, min_words: usize) -> Self {
        Self {
            attempts,
            min_words,
        }
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn min_words(&self) -> usize {
        self.min_words
    }

    /// Clockwise correction for the engine-reported orientation, if any.
    ///
    /// Failures are logged and treated as "upright".
    pub fn orientation_correction<B: OcrBackend + ?Sized>(
        &self,
        backend: &B,
        gray: &GrayImage,
    ) -> Option<f32> {
        match backend.detect_orientation(gray) {
            Ok(Some(degrees)) if degrees.rem_euclid(360) != 0 => {
                let correction = (360 - degrees.rem_euclid(360)) as f32;
                info!(degrees, correction, "Page orientation detected");
                Some(correction)
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "Orientation detection failed; assuming upright");
                None
            }
        }
    }

    /// Correct the page orientation of `image`, then run the attempts.
    ///
    /// Both buffers are rotated together so word boxes keep addressing the
    /// right colour pixels.
    pub fn recognize_prepared<B: OcrBackend + ?Sized>(
        &self,
        backend: &B,
        image: PreparedImage,
    ) -> (PreparedImage, Recognition) {
        let rotation = self.orientation_correction(backend, &image.gray);
        let image = match rotation {
            Some(degrees) => image.rotated(degrees),
            None => image,
        };
        let mut recognition = self.run(backend, &image.gray);
        recognition.rotation = rotation;
        (image, recognition)
    }

    /// Run the attempts over `gray` and return the best token list.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn run<B: OcrBackend + ?Sized>(&self, backend: &B, gray: &GrayImage) -> Recognition {
        let mut best: Vec<WordToken> = Vec::new();
        let mut attempts_run = 0;

        for attempt in &self.attempts {
            attempts_run += 1;
            let words = run_attempt(backend, gray, attempt);
            debug!(
                mode = %attempt.mode,
                transform = ?attempt.transform,
                word_count = words.len(),
                "Recognition attempt finished"
            );
            let accepted = words.len() >= self.min_words;
            if words.len() > best.len() {
                best = words;
            }
            if accepted {
                break;
            }
        }

        info!(word_count = best.len(), attempts_run, "Recognition complete");
        Recognition {
            words: best,
            rotation: None,
            attempts_run,
        }
    }
}

/// Execute one attempt. Errors count as an empty result.
fn run_attempt<B: OcrBackend + ?Sized>(
    backend: &B,
    gray: &GrayImage,
    attempt: &Attempt,
) -> Vec<WordToken> {
    let result = match attempt.transform {
        AttemptTransform::Identity => backend.recognize(gray, attempt.mode),
        AttemptTransform::Upscale(factor) => {
            let upscaled = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(gray.clone()))
                .scale(factor)
                .into_dynamic()
                .to_luma8();
            backend
                .recognize(&upscaled, attempt.mode)
                .map(|words| rescale_words(words, 1.0 / factor))
        }
    };

    match result {
        Ok(words) => words.into_iter().filter_map(sanitize_word).collect(),
        Err(err) => {
            warn!(mode = %attempt.mode, error = %err, "Recognition attempt failed");
            Vec::new()
        }
    }
}

/// Trim the text and drop tokens without any ASCII letter or digit.
fn sanitize_word(mut word: WordToken) -> Option<WordToken> {
    let trimmed = word.text.trim();
    if !trimmed.chars().any(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if trimmed.len() != word.text.len() {
        word.text = trimmed.to_string();
    }
    Some(word)
}

fn rescale_words(words: Vec<WordToken>, factor: f32) -> Vec<WordToken> {
    words
        .into_iter()
        .map(|mut word| {
            let b = word.bbox;
            word.bbox = BoundingBox::new(b.x0 * factor, b.y0 * factor, b.x1 * factor, b.y1 * factor);
            word
        })
        .collect()
}
