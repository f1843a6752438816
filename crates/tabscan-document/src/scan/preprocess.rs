// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report photo preprocessing — produces the colour buffer used for flag-cell
// sampling and the contrast-stretched grayscale buffer used for recognition,
// both at the same scale.

use image::{DynamicImage, GrayImage, RgbaImage};
use tabscan_core::PipelineConfig;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// The two buffers derived from one source photo.
///
/// Coordinates are shared: a word box found in `gray` addresses the same
/// pixels in `color`.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Scaled source, colours untouched.
    pub color: RgbaImage,
    /// Scaled, luma-converted, contrast-stretched copy for the OCR engine.
    pub gray: GrayImage,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Rotate both buffers clockwise by `degrees`, keeping them aligned.
    pub fn rotated(self, degrees: f32) -> Self {
        let color = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(self.color))
            .rotate(degrees)
            .to_rgba();
        let gray = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(self.gray))
            .rotate(degrees)
            .into_dynamic()
            .to_luma8();
        Self { color, gray }
    }
}

/// Scaling and contrast parameters for [`PreparedImage`] construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    pub max_width: u32,
    pub upscale_factor: f32,
    pub contrast_slope: f32,
    pub contrast_pivot: f32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Preprocessor {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_width: config.max_width,
            upscale_factor: config.upscale_factor,
            contrast_slope: config.contrast_slope,
            contrast_pivot: config.contrast_pivot,
        }
    }

    /// Build the colour and grayscale buffers for `image`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn prepare(&self, image: &DynamicImage) -> PreparedImage {
        let scaled = ImageProcessor::from_dynamic(image.clone())
            .fit_width(self.max_width, self.upscale_factor);
        let gray = scaled.to_stretched_gray(self.contrast_slope, self.contrast_pivot);
        let color = scaled.to_rgba();
        debug!(
            width = color.width(),
            height = color.height(),
            "Preprocessing complete"
        );
        PreparedImage { color, gray }
    }
}
