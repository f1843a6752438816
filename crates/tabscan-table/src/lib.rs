// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tabscan-table — Table reconstruction for the Tabscan report reader.
//
// Infers column bands and row bins from recognized word boxes, extracts and
// cleans the group and person cells, detects red-highlighted flag cells,
// repairs missing group names, and formats the grouped text report.

pub mod cells;
pub mod format;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod repair;
pub mod rows;

pub use format::{format_report, render_report};
pub use layout::detect_bands;
pub use normalize::{TokenClass, classify_token, clean_group_name, clean_person_name};
pub use pipeline::{extract_rows, process_batch, process_image, run_batch};
