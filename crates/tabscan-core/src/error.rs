// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tabscan.

use thiserror::Error;

/// Top-level error type for all Tabscan operations.
///
/// Recognition failures inside the retry policy are swallowed and never reach
/// callers as this type; everything that does surface here aborts the batch.
#[derive(Debug, Error)]
pub enum TabscanError {
    // -- Image errors --
    #[error("image processing failed: {0}")]
    Image(String),

    // -- Recognition errors --
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("OCR engine could not be initialised: {0}")]
    EngineUnavailable(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform --
    #[error("feature not available in this build: {0}")]
    PlatformUnavailable(&'static str),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TabscanError>;
