// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tabscan-document — Image handling for the Tabscan table reader.
//
// Provides image processing (decode, scale, rotate, contrast-stretched
// grayscale), report photo preprocessing, and the recognition boundary
// (engine trait, lazily built engine handle, retry policy).

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `tabscan_document::Preprocessor` etc.
pub use self::image::processor::ImageProcessor;
pub use scan::preprocess::{PreparedImage, Preprocessor};
pub use scan::recognize::{EngineHandle, OcrBackend, Recognition, RecognitionPolicy};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsBackend;
