// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — report photo preprocessing and the optical character
// recognition (OCR) boundary.

pub mod preprocess;
pub mod recognize;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use preprocess::{PreparedImage, Preprocessor};
pub use recognize::{EngineHandle, OcrBackend, Recognition, RecognitionPolicy};

#[cfg(feature = "ocr")]
pub use ocr::OcrsBackend;
