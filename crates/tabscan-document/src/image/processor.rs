// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, scaling, rotation, and the contrast-stretched
// grayscale conversion used for recognition. Operates on in-memory images
// using the `image` and `imageproc` crates.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use tabscan_core::error::TabscanError;
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let gray = ImageProcessor::open("report.jpg")?
///     .fit_width(2400, 1.0)
///     .rotate(90.0)
///     .to_stretched_gray(1.16, 128.0);
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, TabscanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            TabscanError::Image(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Scale both dimensions by `factor` (rounded to whole pixels, at least 1).
    ///
    /// A factor of 1.0 is a no-op.
    pub fn scale(self, factor: f32) -> Self {
        if (factor - 1.0).abs() < f32::EPSILON {
            return self;
        }
        let width = ((self.image.width() as f32 * factor).round() as u32).max(1);
        let height = ((self.image.height() as f32 * factor).round() as u32).max(1);
        debug!(factor, width, height, "Scaling image");
        Self {
            image: self.image.resize_exact(width, height, FilterType::Triangle),
        }
    }

    /// Cap the width at `max_width`, then apply `upscale_factor`.
    ///
    /// Large photos are shrunk so recognition stays fast; small ones keep
    /// their native resolution unless an explicit upscale is requested.
    #[instrument(skip(self))]
    pub fn fit_width(self, max_width: u32, upscale_factor: f32) -> Self {
        let factor = base_scale(self.image.width(), max_width, upscale_factor);
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            factor,
            "Fitting image width"
        );
        self.scale(factor)
    }

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For other
    /// angles the canvas grows to the rotated bounding box and bilinear
    /// interpolation fills it; uncovered corners stay transparent.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: f32) -> Self {
        info!(degrees, "Rotating image");

        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let (w, h) = rgba.dimensions();
        let radians = degrees.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let out_w = (w as f32 * cos + h as f32 * sin).round() as u32;
        let out_h = (w as f32 * sin + h as f32 * cos).round() as u32;

        // Centre the source on the enlarged canvas, then rotate about the centre.
        let transparent = Rgba([255u8, 255, 255, 0]);
        let mut canvas = RgbaImage::from_pixel(out_w.max(w), out_h.max(h), transparent);
        let offset_x = i64::from((canvas.width() - w) / 2);
        let offset_y = i64::from((canvas.height() - h) / 2);
        image::imageops::overlay(&mut canvas, &rgba, offset_x, offset_y);

        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &canvas,
            radians,
            Interpolation::Bilinear,
            transparent,
        );

        debug!(out_w = rotated.width(), out_h = rotated.height(), "General rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// The image as an RGBA buffer, colours untouched.
    pub fn to_rgba(&self) -> RgbaImage {
        self.image.to_rgba8()
    }

    /// Convert to luma (`0.299R + 0.587G + 0.114B`, truncated) and stretch the
    /// contrast linearly around `pivot` by `slope`, clamped to [0, 255].
    #[instrument(skip(self))]
    pub fn to_stretched_gray(&self, slope: f32, pivot: f32) -> GrayImage {
        let rgba = self.image.to_rgba8();
        GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let Rgba([r, g, b, _]) = *rgba.get_pixel(x, y);
            Luma([stretch(luma(r, g, b), slope, pivot)])
        })
    }
}

/// `min(1, max_width / width) * upscale_factor`.
pub fn base_scale(width: u32, max_width: u32, upscale_factor: f32) -> f32 {
    if width == 0 {
        return upscale_factor;
    }
    (max_width as f32 / width as f32).min(1.0) * upscale_factor
}

/// Integer luma with ITU-R BT.601 weights.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) as u8
}

/// Linear contrast stretch around `pivot`, rounded to the nearest level.
fn stretch(value: u8, slope: f32, pivot: f32) -> u8 {
    ((f32::from(value) - pivot) * slope + pivot)
        .round()
        .clamp(0.0, 255.0) as u8
}
