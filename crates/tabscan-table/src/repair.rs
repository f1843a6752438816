// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row repair — the group column is only printed on the first row of each
// group, so missing or garbled group names are carried forward from the
// last good one. Rows with almost no text are dropped as noise.

use tabscan_core::{GROUP_PLACEHOLDER, PERSON_PLACEHOLDER, Row};
use tracing::debug;

/// A usable group name: not the placeholder, has an ASCII letter, and at
/// least two words.
pub fn is_valid_group_name(name: &str) -> bool {
    name != GROUP_PLACEHOLDER
        && name.chars().any(|c| c.is_ascii_alphabetic())
        && name.split_whitespace().count() >= 2
}

/// Replace invalid group names with the most recent valid one, in order.
pub fn carry_forward(rows: Vec<Row>) -> Vec<Row> {
    let mut last_valid: Option<String> = None;
    rows.into_iter()
        .map(|mut row| {
            if is_valid_group_name(&row.group_name) {
                last_valid = Some(row.group_name.clone());
            } else {
                row.group_name = last_valid
                    .clone()
                    .unwrap_or_else(|| GROUP_PLACEHOLDER.to_string());
            }
            row
        })
        .collect()
}

/// `[A-Za-z0-9_]` characters, placeholders counting as empty.
fn word_char_count(text: &str, placeholder: &str) -> usize {
    if text == placeholder {
        return 0;
    }
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count()
}

/// Whether the row's combined text is too short to be a real entry.
pub fn is_noise(row: &Row, min_chars: usize) -> bool {
    word_char_count(&row.group_name, GROUP_PLACEHOLDER)
        + word_char_count(&row.person_name, PERSON_PLACEHOLDER)
        < min_chars
}

/// Carry group names forward, then drop noise rows.
pub fn repair_rows(rows: Vec<Row>, min_chars: usize) -> Vec<Row> {
    let before = rows.len();
    let mut repaired = carry_forward(rows);
    repaired.retain(|row| !is_noise(row, min_chars));
    debug!(before, after = repaired.len(), "Rows repaired");
    repaired
}
