// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cell extraction — gathers the text that falls inside one (line bin, band)
// cell, and decides whether a flag cell is highlighted red by sampling the
// colour buffer on a coarse grid.

use image::{Rgba, RgbaImage};
use tabscan_core::{Band, LineBin, PipelineConfig, WordToken};
use tracing::trace;

/// Text of the words inside `bin` that overlap `band` by more than
/// `min_overlap` pixels, left to right, single-spaced.
pub fn text_in_band(words: &[WordToken], bin: LineBin, band: Band, min_overlap: f32) -> String {
    let mut inside: Vec<&WordToken> = words
        .iter()
        .filter(|w| bin.contains_span(w.bbox.y0, w.bbox.y1))
        .filter(|w| w.bbox.horizontal_overlap(band.left, band.right) > min_overlap)
        .collect();
    inside.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    inside
        .iter()
        .flat_map(|w| w.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Integer pixel rectangle; may extend past the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CellRect {
    /// The rectangle covering `band` within `bin`, clipped to the canvas.
    pub fn from_cell(band: Band, bin: LineBin, canvas_width: u32, canvas_height: u32) -> Self {
        let x = band.left.max(0.0).round() as i64;
        let y = bin.y0.max(0.0).round() as i64;
        let right = band.right.min(canvas_width as f32).round() as i64;
        let bottom = bin.y1.min(canvas_height as f32).round() as i64;
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Red-highlight detector for flag cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagSampler {
    /// Grid divisions across (columns, rows) of the padded cell.
    pub grid: (u32, u32),
    /// Vertical padding added above and below the cell.
    pub pad_y: u32,
    /// Samples more transparent than this are skipped.
    pub min_alpha: u8,
    pub red_min: u8,
    pub red_margin: u8,
    /// Minimum reddish share of counted samples.
    pub ratio: f64,
}

impl Default for FlagSampler {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl FlagSampler {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            grid: config.flag_grid,
            pad_y: config.flag_pad_y,
            min_alpha: config.flag_min_alpha,
            red_min: config.flag_red_min,
            red_margin: config.flag_red_margin,
            ratio: config.flag_ratio,
        }
    }

    /// `r > red_min` and red exceeds both green and blue by more than the margin.
    pub fn is_reddish(&self, pixel: Rgba<u8>) -> bool {
        let [r, g, b, _] = pixel.0;
        let margin = i16::from(self.red_margin);
        r > self.red_min
            && i16::from(r) - i16::from(g) > margin
            && i16::from(r) - i16::from(b) > margin
    }

    /// Count `(reddish, counted)` grid samples inside the padded cell.
    ///
    /// Returns `None` for cells too thin to sample. Points outside the image
    /// or below the alpha threshold are not counted.
    pub fn sample(&self, image: &RgbaImage, cell: CellRect) -> Option<(usize, usize)> {
        if cell.width <= 2 || cell.height <= 2 {
            return None;
        }
        let pad = i64::from(self.pad_y);
        let top = (cell.y - pad).max(0);
        let height = cell.height + 2 * pad;
        let step_x = (cell.width / i64::from(self.grid.0.max(1))).max(1) as usize;
        let step_y = (height / i64::from(self.grid.1.max(1))).max(1) as usize;
        let (image_w, image_h) = (i64::from(image.width()), i64::from(image.height()));

        let mut reddish = 0;
        let mut counted = 0;
        for y in ((top + 1)..(top + height - 1)).step_by(step_y) {
            if !(0..image_h).contains(&y) {
                continue;
            }
            for x in ((cell.x + 1)..(cell.x + cell.width - 1)).step_by(step_x) {
                if !(0..image_w).contains(&x) {
                    continue;
                }
                let pixel = *image.get_pixel(x as u32, y as u32);
                if pixel.0[3] < self.min_alpha {
                    continue;
                }
                counted += 1;
                if self.is_reddish(pixel) {
                    reddish += 1;
                }
            }
        }
        Some((reddish, counted))
    }

    /// Whether the reddish share of counted samples reaches the ratio.
    pub fn is_flagged(&self, image: &RgbaImage, cell: CellRect) -> bool {
        let Some((reddish, counted)) = self.sample(image, cell) else {
            return false;
        };
        let flagged = counted > 0 && reddish as f64 / counted as f64 >= self.ratio;
        trace!(?cell, reddish, counted, flagged, "Flag cell sampled");
        flagged
    }
}
