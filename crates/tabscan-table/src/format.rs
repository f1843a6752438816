// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report formatting — rows grouped by group name in first-appearance order.

use std::collections::HashMap;

use tabscan_core::{EMPTY_REPORT, FLAG_MARKER, PERSON_PLACEHOLDER, Row};

/// Group name with whitespace collapsed, used as the grouping key.
fn group_key(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One block per group: the group name, then one line per person (with the
/// flag marker when flagged). Blocks are separated by a blank line.
///
/// Rows with an empty group name are skipped; placeholder or empty person
/// names produce no line. Returns `""` when nothing is left.
pub fn format_report(rows: &[Row]) -> String {
    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in rows {
        let key = group_key(&row.group_name);
        if key.is_empty() {
            continue;
        }
        if !members.contains_key(&key) {
            order.push(key.clone());
        }
        members.entry(key).or_default().push(row);
    }

    let blocks: Vec<String> = order
        .iter()
        .map(|key| {
            let mut lines = vec![key.clone()];
            for row in members.get(key).into_iter().flatten() {
                let person = row.person_name.trim();
                if person.is_empty() || person == PERSON_PLACEHOLDER {
                    continue;
                }
                if row.flagged {
                    lines.push(format!("{person}{FLAG_MARKER}"));
                } else {
                    lines.push(person.to_string());
                }
            }
            lines.join("\n")
        })
        .collect();

    blocks.join("\n\n").trim().to_string()
}

/// [`format_report`], with a fixed message when no rows survive.
pub fn render_report(rows: &[Row]) -> String {
    let report = format_report(rows);
    if report.is_empty() {
        EMPTY_REPORT.to_string()
    } else {
        report
    }
}
