// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row segmentation — groups word vertical centers into horizontal line bins.

use tabscan_core::{LineBin, PipelineConfig, WordToken};
use tracing::debug;

/// Vertical tolerance derived from the average word height.
fn line_tolerance(words: &[WordToken], config: &PipelineConfig) -> f32 {
    let average_height = words.iter().map(|w| w.bbox.height()).sum::<f32>() / words.len() as f32;
    config
        .line_tolerance_min
        .max((average_height * config.line_tolerance_factor).round())
}

/// Build one [`LineBin`] per visual line, ordered top to bottom.
///
/// Centers closer than the tolerance share a bin. Each bin spans its first
/// to last center widened by the tolerance, clamped at the top edge and
/// padded at the bottom.
pub fn build_line_bins(words: &[WordToken], config: &PipelineConfig) -> Vec<LineBin> {
    if words.is_empty() {
        return Vec::new();
    }
    let tolerance = line_tolerance(words, config);

    let mut centers: Vec<f32> = words
        .iter()
        .map(|w| w.bbox.center_y().round())
        .filter(|c| c.is_finite())
        .collect();
    centers.sort_by(f32::total_cmp);

    let mut spans: Vec<(f32, f32)> = Vec::new();
    for center in centers {
        match spans.last_mut() {
            Some((_, last)) if center - *last <= tolerance => *last = center,
            _ => spans.push((center, center)),
        }
    }

    let bins: Vec<LineBin> = spans
        .into_iter()
        .map(|(first, last)| {
            LineBin::new(
                (first - tolerance).max(0.0),
                last + tolerance + config.bin_bottom_pad,
            )
        })
        .collect();
    debug!(tolerance, bin_count = bins.len(), "Line bins built");
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabscan_core::BoundingBox;

    fn word_at(y0: f32, y1: f32) -> WordToken {
        WordToken::new("w", BoundingBox::new(0.0, y0, 10.0, y1), 90.0)
    }

    #[test]
    fn no_words_no_bins() {
        assert!(build_line_bins(&[], &PipelineConfig::default()).is_empty());
    }

    #[test]
    fn tolerance_has_a_floor() {
        let words = vec![word_at(0.0, 4.0)];
        assert_eq!(line_tolerance(&words, &PipelineConfig::default()), 12.0);
        let tall = vec![word_at(0.0, 40.0)];
        assert_eq!(line_tolerance(&tall, &PipelineConfig::default()), 34.0);
    }

    #[test]
    fn nearby_centers_share_a_bin() {
        // Heights 20 → tolerance max(12, 17) = 17.
        let words = vec![
            word_at(60.0, 80.0),
            word_at(65.0, 85.0),
            word_at(110.0, 130.0),
        ];
        let bins = build_line_bins(&words, &PipelineConfig::default());
        assert_eq!(
            bins,
            vec![LineBin::new(53.0, 94.0), LineBin::new(103.0, 139.0)]
        );
    }

    #[test]
    fn bins_clamp_at_top_edge() {
        let bins = build_line_bins(&[word_at(0.0, 20.0)], &PipelineConfig::default());
        assert_eq!(bins, vec![LineBin::new(0.0, 29.0)]);
    }

    #[test]
    fn chained_centers_extend_one_bin() {
        let words: Vec<_> = (0..5)
            .map(|i| word_at(100.0 + i as f32 * 10.0, 120.0 + i as f32 * 10.0))
            .collect();
        let bins = build_line_bins(&words, &PipelineConfig::default());
        assert_eq!(bins.len(), 1);
        assert!(bins[0].contains_span(100.0, 160.0));
    }

    #[test]
    fn bins_are_sorted_regardless_of_input_order() {
        let words = vec![word_at(300.0, 320.0), word_at(10.0, 30.0), word_at(150.0, 170.0)];
        let bins = build_line_bins(&words, &PipelineConfig::default());
        assert_eq!(bins.len(), 3);
        assert!(bins.windows(2).all(|pair| pair[0].y0 < pair[1].y0));
    }
}
