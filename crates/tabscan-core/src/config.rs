// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every threshold here was tuned by eye on real report
// photos; the defaults are the tuned values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabscanError};

/// Tunable constants for one run of the table reader.
///
/// Missing keys in a JSON file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // -- Preprocessing --
    /// Images wider than this are downscaled before recognition.
    pub max_width: u32,
    /// Extra scale applied on top of the width cap.
    pub upscale_factor: f32,
    /// Slope of the grayscale contrast stretch.
    pub contrast_slope: f32,
    /// Gray level the contrast stretch pivots around.
    pub contrast_pivot: f32,

    // -- Recognition --
    /// Tokens below this confidence are discarded.
    pub min_confidence: f32,
    /// An attempt yielding at least this many words is accepted.
    pub min_words: usize,
    /// Scale of the last-resort recognition attempt.
    pub retry_upscale: f32,

    // -- Layout --
    /// Fraction of the token vertical extent searched for column headers.
    pub header_fraction: f32,
    /// Inset applied to both sides of the person and flag bands.
    pub header_band_margin: f32,
    /// Gap that splits two clusters of word left edges.
    pub cluster_tolerance: f32,

    // -- Rows --
    /// Lower bound of the line-splitting tolerance.
    pub line_tolerance_min: f32,
    /// Line tolerance as a fraction of the average word height.
    pub line_tolerance_factor: f32,
    /// Extra padding below every line bin.
    pub bin_bottom_pad: f32,

    // -- Cells --
    /// Minimum horizontal overlap for a word to belong to a band.
    pub min_band_overlap: f32,
    /// Sampling grid (columns, rows) inside a flag cell.
    pub flag_grid: (u32, u32),
    /// Vertical padding added around a flag cell before sampling.
    pub flag_pad_y: u32,
    /// Samples with a lower alpha are ignored.
    pub flag_min_alpha: u8,
    /// Red channel must exceed this.
    pub flag_red_min: u8,
    /// Red must exceed both green and blue by more than this.
    pub flag_red_margin: u8,
    /// Reddish fraction at which a cell counts as flagged.
    pub flag_ratio: f64,

    // -- Repair --
    /// Rows with fewer word characters than this are dropped as noise.
    pub min_row_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_width: 2400,
            upscale_factor: 1.0,
            contrast_slope: 1.16,
            contrast_pivot: 128.0,
            min_confidence: 12.0,
            min_words: 30,
            retry_upscale: 1.6,
            header_fraction: 0.25,
            header_band_margin: 6.0,
            cluster_tolerance: 60.0,
            line_tolerance_min: 12.0,
            line_tolerance_factor: 0.85,
            bin_bottom_pad: 2.0,
            min_band_overlap: 8.0,
            flag_grid: (18, 12),
            flag_pad_y: 10,
            flag_min_alpha: 12,
            flag_red_min: 165,
            flag_red_margin: 40,
            flag_ratio: 0.08,
            min_row_chars: 3,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(TabscanError::Config("max_width must be positive".into()));
        }
        if !(self.upscale_factor > 0.0) || !(self.retry_upscale > 0.0) {
            return Err(TabscanError::Config(
                "upscale factors must be positive".into(),
            ));
        }
        if !(self.header_band_margin >= 0.0) {
            return Err(TabscanError::Config(
                "header_band_margin must not be negative".into(),
            ));
        }
        if self.flag_grid.0 == 0 || self.flag_grid.1 == 0 {
            return Err(TabscanError::Config(
                "flag_grid dimensions must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.flag_ratio) {
            return Err(TabscanError::Config(format!(
                "flag_ratio must lie in [0, 1], got {}",
                self.flag_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.header_fraction) {
            return Err(TabscanError::Config(format!(
                "header_fraction must lie in [0, 1], got {}",
                self.header_fraction
            )));
        }
        Ok(())
    }
}
