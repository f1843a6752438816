// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Column layout — splits the horizontal axis into the group, person, and flag
// bands. Recognized column headers anchor the bands when they can be found;
// otherwise clusters of word left edges stand in for the columns.

use std::sync::LazyLock;

use regex::Regex;
use tabscan_core::{Band, BandSource, Bands, PipelineConfig, WordToken};
use tracing::{debug, info, instrument};

static GROUP_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^nm[_\s-]*sentra$").expect("hardcoded group header regex is valid")
});

static PERSON_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^customer(?:name)?$").expect("hardcoded person header regex is valid")
});

static FLAG_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ket|kettabungan|saldo.*tab|current.*month")
        .expect("hardcoded flag header regex is valid")
});

/// Fallback centers when a header is missing, as fractions of the width.
const GROUP_CENTER_FRACTION: f32 = 0.07;
const FLAG_CENTER_FRACTION: f32 = 0.75;

/// Column centers used when not a single word is available.
const EMPTY_PAGE_FRACTIONS: [f32; 3] = [0.10, 0.45, 0.75];

/// Group 1-D values into clusters and return the rounded mean of each.
///
/// Values are sorted first; a new cluster starts whenever the gap to the
/// previous value exceeds `tolerance`. Non-finite values are ignored.
pub fn cluster_1d(values: &[f32], tolerance: f32) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f32::total_cmp);

    let mut centers = Vec::new();
    let mut bucket: Vec<f32> = Vec::new();
    for value in sorted {
        let gap_exceeded = bucket.last().is_some_and(|&last| value - last > tolerance);
        if gap_exceeded {
            centers.push(mean(&bucket).round());
            bucket.clear();
        }
        bucket.push(value);
    }
    if !bucket.is_empty() {
        centers.push(mean(&bucket).round());
    }
    centers
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// Header text normalised for matching: pipes removed, lower-cased.
fn header_key(text: &str) -> String {
    text.replace('|', "").to_lowercase()
}

/// Derive bands from recognized column headers.
///
/// Only words in the top `header_fraction` of the token extent are
/// considered. Returns `None` unless a person header and at least one of
/// the group or flag headers are found in left-to-right order.
pub fn detect_bands_by_header(
    words: &[WordToken],
    canvas_width: f32,
    config: &PipelineConfig,
) -> Option<Bands> {
    let min_y = words.iter().map(|w| w.bbox.y0).reduce(f32::min)?;
    let max_y = words.iter().map(|w| w.bbox.y1).reduce(f32::max)?;
    let header_limit = min_y + (max_y - min_y) * config.header_fraction;

    let mut group_centers = Vec::new();
    let mut person_centers = Vec::new();
    let mut flag_centers = Vec::new();
    for word in words.iter().filter(|w| w.bbox.center_y() <= header_limit) {
        let key = header_key(&word.text);
        let center = word.bbox.center_x();
        if GROUP_HEADER_RE.is_match(&key) {
            group_centers.push(center);
        }
        if PERSON_HEADER_RE.is_match(&key) {
            person_centers.push(center);
        }
        if FLAG_HEADER_RE.is_match(&key) {
            flag_centers.push(center);
        }
    }

    let person_x = person_centers.first()?.round();
    if group_centers.is_empty() && flag_centers.is_empty() {
        return None;
    }
    let group_x = group_centers
        .first()
        .copied()
        .unwrap_or(canvas_width * GROUP_CENTER_FRACTION)
        .round();
    // Flag headers often repeat (e.g. "ket" inside "kettabungan"); the
    // rightmost one is the real column.
    let flag_x = flag_centers
        .last()
        .copied()
        .unwrap_or(canvas_width * FLAG_CENTER_FRACTION)
        .round();

    if !(group_x < person_x && person_x < flag_x) {
        debug!(group_x, person_x, flag_x, "Header centers out of order");
        return None;
    }

    let margin = config.header_band_margin;
    let group_right = ((group_x + person_x) / 2.0).round();
    let person_right = ((person_x + flag_x) / 2.0).round();
    Some(Bands {
        group: Band::new((group_x - (group_right - group_x)).max(0.0), group_right),
        person: Band::new(group_right + margin, person_right - margin),
        flag: Band::new(
            person_right + margin,
            (flag_x + (flag_x - person_right)).min(canvas_width) - margin,
        ),
    })
}

/// Reduce arbitrary cluster centers to exactly three column centers.
fn three_centers(centers: &[f32], canvas_width: f32) -> [f32; 3] {
    match centers {
        [] => EMPTY_PAGE_FRACTIONS.map(|fraction| (canvas_width * fraction).round()),
        [only] => {
            let c = *only;
            [(c * 0.6).round(), c, (c + (canvas_width - c) * 0.5).round().max(c)]
        }
        [left, right] => [*left, ((left + right) / 2.0).round(), *right],
        many => [many[0], many[many.len() / 2], many[many.len() - 1]],
    }
}

/// Derive bands from clusters of word left edges.
pub fn detect_bands_fallback(words: &[WordToken], canvas_width: f32, tolerance: f32) -> Bands {
    let lefts: Vec<f32> = words.iter().map(|w| w.bbox.x0).collect();
    let centers = cluster_1d(&lefts, tolerance);
    let [group_x, person_x, flag_x] = three_centers(&centers, canvas_width);
    debug!(
        cluster_count = centers.len(),
        group_x, person_x, flag_x, "Fallback column centers"
    );

    let group_right = ((group_x + person_x) / 2.0).round();
    let person_right = ((person_x + flag_x) / 2.0).round();
    Bands {
        group: Band::new((group_x - (group_right - group_x)).max(0.0), group_right),
        person: Band::new(group_right, person_right),
        flag: Band::new(
            person_right,
            (flag_x + (flag_x - person_right)).min(canvas_width).max(person_right),
        ),
    }
}

/// Header-driven bands when possible, geometric clustering otherwise.
#[instrument(skip_all, fields(word_count = words.len(), canvas_width = canvas_width))]
pub fn detect_bands(
    words: &[WordToken],
    canvas_width: f32,
    config: &PipelineConfig,
) -> (Bands, BandSource) {
    if let Some(bands) = detect_bands_by_header(words, canvas_width, config) {
        info!(?bands, "Column bands anchored on headers");
        return (bands, BandSource::Header);
    }
    let bands = detect_bands_fallback(words, canvas_width, config.cluster_tolerance);
    info!(?bands, "Column bands derived from word clusters");
    (bands, BandSource::Geometric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabscan_core::BoundingBox;

    const EPS: f32 = 1e-3;

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> WordToken {
        WordToken::new(text, BoundingBox::new(x0, y0, x1, y1), 90.0)
    }

    fn assert_ordered(bands: &Bands) {
        assert!(bands.group.right <= bands.person.left + EPS, "{bands:?}");
        assert!(bands.person.right <= bands.flag.left + EPS, "{bands:?}");
    }

    #[test]
    fn cluster_collapses_values_within_tolerance() {
        assert_eq!(cluster_1d(&[100.0, 130.0, 155.0, 110.0], 60.0), vec![124.0]);
    }

    #[test]
    fn cluster_splits_on_large_gaps() {
        let centers = cluster_1d(&[10.0, 20.0, 300.0, 310.0, 700.0], 60.0);
        assert_eq!(centers, vec![15.0, 305.0, 700.0]);
    }

    #[test]
    fn cluster_is_order_independent() {
        let a = cluster_1d(&[700.0, 10.0, 310.0, 20.0, 300.0], 60.0);
        let b = cluster_1d(&[300.0, 310.0, 20.0, 700.0, 10.0], 60.0);
        assert_eq!(a, b);
        assert!(cluster_1d(&[], 60.0).is_empty());
    }

    #[test]
    fn header_bands_center_on_group_header() {
        let words = vec![
            word("nm_sentra", 150.0, 10.0, 250.0, 30.0),
            word("customername", 340.0, 10.0, 460.0, 30.0),
            word("ket", 780.0, 10.0, 820.0, 30.0),
            word("SENTRA", 110.0, 60.0, 180.0, 80.0),
            word("BUDI", 320.0, 160.0, 380.0, 180.0),
        ];
        let (bands, source) = detect_bands(&words, 1000.0, &PipelineConfig::default());
        assert_eq!(source, BandSource::Header);
        assert!(((bands.group.left + bands.group.right) / 2.0 - 200.0).abs() < EPS);
        assert_eq!(bands.person, Band::new(306.0, 594.0));
        assert_eq!(bands.flag, Band::new(606.0, 994.0));
        assert_ordered(&bands);
    }

    #[test]
    fn header_matching_ignores_case_and_pipes() {
        let words = vec![
            word("|NM SENTRA", 150.0, 10.0, 250.0, 30.0),
            word("CustomerName|", 340.0, 10.0, 460.0, 30.0),
            word("body", 340.0, 300.0, 460.0, 320.0),
        ];
        let bands = detect_bands_by_header(&words, 1000.0, &PipelineConfig::default())
            .expect("person + group headers suffice");
        // Flag header missing: its center defaults to 75% of the width, so
        // person 400 / flag 750 meet at 575 and the flag band ends at 925.
        assert_eq!(bands.flag.right, 925.0 - 6.0);
        assert_ordered(&bands);
    }

    #[test]
    fn last_flag_header_wins() {
        let words = vec![
            word("customer", 300.0, 10.0, 400.0, 30.0),
            word("ket", 500.0, 10.0, 540.0, 30.0),
            word("kettabungan", 760.0, 10.0, 840.0, 30.0),
            word("BUDI", 300.0, 300.0, 360.0, 320.0),
        ];
        let bands = detect_bands_by_header(&words, 1000.0, &PipelineConfig::default())
            .expect("headers present");
        // person 350, flag 800 → boundary 575.
        assert_eq!(bands.flag.left, 581.0);
    }

    #[test]
    fn person_header_alone_is_not_enough() {
        let words = vec![
            word("customername", 340.0, 10.0, 460.0, 30.0),
            word("BUDI", 340.0, 100.0, 400.0, 120.0),
        ];
        assert!(detect_bands_by_header(&words, 1000.0, &PipelineConfig::default()).is_none());
    }

    #[test]
    fn headers_below_top_quartile_are_ignored() {
        let words = vec![
            word("top", 0.0, 0.0, 10.0, 10.0),
            word("nm_sentra", 150.0, 500.0, 250.0, 520.0),
            word("customername", 340.0, 500.0, 460.0, 520.0),
            word("bottom", 0.0, 990.0, 10.0, 1000.0),
        ];
        let (_, source) = detect_bands(&words, 1000.0, &PipelineConfig::default());
        assert_eq!(source, BandSource::Geometric);
    }

    #[test]
    fn inverted_headers_fall_back() {
        let words = vec![
            word("nm_sentra", 700.0, 10.0, 800.0, 30.0),
            word("customername", 340.0, 10.0, 460.0, 30.0),
            word("BUDI", 340.0, 300.0, 400.0, 320.0),
        ];
        assert!(detect_bands_by_header(&words, 1000.0, &PipelineConfig::default()).is_none());
    }

    #[test]
    fn fallback_picks_first_middle_last_cluster() {
        let words: Vec<_> = [100.0, 300.0, 500.0, 700.0, 900.0]
            .iter()
            .map(|&x| word("w", x, 0.0, x + 40.0, 20.0))
            .collect();
        let bands = detect_bands_fallback(&words, 1000.0, 60.0);
        // Centers 100 / 500 / 900.
        assert_eq!(bands.group, Band::new(0.0, 300.0));
        assert_eq!(bands.person, Band::new(300.0, 700.0));
        assert_eq!(bands.flag, Band::new(700.0, 1000.0));
    }

    #[test]
    fn fallback_with_two_clusters_adds_midpoint() {
        assert_eq!(three_centers(&[100.0, 500.0], 1000.0), [100.0, 300.0, 500.0]);
    }

    #[test]
    fn fallback_with_one_cluster_extrapolates() {
        assert_eq!(three_centers(&[400.0], 1000.0), [240.0, 400.0, 700.0]);
    }

    #[test]
    fn fallback_without_words_uses_fixed_fractions() {
        let (bands, source) = detect_bands(&[], 1000.0, &PipelineConfig::default());
        assert_eq!(source, BandSource::Geometric);
        assert_eq!(three_centers(&[], 1000.0), [100.0, 450.0, 750.0]);
        assert_ordered(&bands);
    }

    #[test]
    fn bands_never_invert() {
        let layouts: Vec<Vec<WordToken>> = vec![
            vec![word("a", 990.0, 0.0, 999.0, 10.0)],
            vec![word("a", 0.0, 0.0, 5.0, 10.0)],
            vec![
                word("a", 10.0, 0.0, 20.0, 10.0),
                word("b", 15.0, 20.0, 25.0, 30.0),
            ],
            vec![
                word("customer", 500.0, 0.0, 510.0, 10.0),
                word("ket", 505.0, 0.0, 515.0, 10.0),
                word("x", 0.0, 100.0, 5.0, 110.0),
            ],
        ];
        for words in &layouts {
            let (bands, _) = detect_bands(words, 1000.0, &PipelineConfig::default());
            assert_ordered(&bands);
        }
    }
}
