// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Tabscan table reader.

use serde::{Deserialize, Serialize};

/// Group-name value of a row whose group cell could not be read.
pub const GROUP_PLACEHOLDER: &str = "(sentra?)";

/// Person-name value of a row whose person cell could not be read.
pub const PERSON_PLACEHOLDER: &str = "(nama?)";

/// Marker appended to a person line when the row's flag cell is highlighted.
pub const FLAG_MARKER: &str = " (tabkur)";

/// Report text emitted when no row survives a whole batch.
pub const EMPTY_REPORT: &str = "(Tidak ada baris valid yang terbaca)";

/// The single user-facing message for a batch-fatal failure.
pub const BATCH_FAILURE_MESSAGE: &str = "Terjadi error saat memproses gambar.";

/// Axis-aligned pixel rectangle, `(x0, y0)` top-left, `(x1, y1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Length of the horizontal overlap with `[left, right]` (negative when
    /// disjoint).
    pub fn horizontal_overlap(&self, left: f32, right: f32) -> f32 {
        self.x1.min(right) - self.x0.max(left)
    }
}

/// One recognized text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    pub bbox: BoundingBox,
    /// Engine confidence on a 0..=100 scale.
    pub confidence: f32,
}

impl WordToken {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// Horizontal interval assigned to one logical column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub left: f32,
    pub right: f32,
}

impl Band {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// The three column bands, always ordered left to right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub group: Band,
    pub person: Band,
    pub flag: Band,
}

/// How the bands of an image were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandSource {
    /// Anchored on recognized column headers.
    Header,
    /// Derived from clusters of word left edges.
    Geometric,
}

/// Vertical interval representing one reconstructed table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineBin {
    pub y0: f32,
    pub y1: f32,
}

impl LineBin {
    pub fn new(y0: f32, y1: f32) -> Self {
        Self { y0, y1 }
    }

    /// Whether `[top, bottom]` lies fully inside the bin.
    pub fn contains_span(&self, top: f32, bottom: f32) -> bool {
        top >= self.y0 && bottom <= self.y1
    }
}

/// One logical table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub group_name: String,
    pub person_name: String,
    /// Set when the flag cell has a reddish background.
    pub flagged: bool,
}

impl Row {
    pub fn new(group_name: impl Into<String>, person_name: impl Into<String>, flagged: bool) -> Self {
        Self {
            group_name: group_name.into(),
            person_name: person_name.into(),
            flagged,
        }
    }
}

/// Page-segmentation strategy requested from the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentationMode {
    /// Find as much text as possible, in no particular order.
    SparseText,
    /// Treat the image as one uniform block of text.
    SingleBlock,
}

impl std::fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SparseText => f.write_str("sparse-text"),
            Self::SingleBlock => f.write_str("single-block"),
        }
    }
}
