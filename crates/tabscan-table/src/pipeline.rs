// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver — runs each photo through preprocessing, recognition, layout,
// cell extraction, and repair, then formats the rows of the whole batch.

use image::{DynamicImage, RgbaImage};
use tabscan_core::error::Result;
use tabscan_core::{
    BATCH_FAILURE_MESSAGE, GROUP_PLACEHOLDER, PERSON_PLACEHOLDER, PipelineConfig, Row, WordToken,
};
use tabscan_document::{EngineHandle, OcrBackend, Preprocessor, RecognitionPolicy};
use tracing::{debug, error, info, instrument};

use crate::cells::{CellRect, FlagSampler, text_in_band};
use crate::format::render_report;
use crate::layout::detect_bands;
use crate::normalize::{clean_group_name, clean_person_name};
use crate::repair::repair_rows;
use crate::rows::build_line_bins;

/// Reconstruct rows from confidence-filtered `words` laid over `color`.
pub fn extract_rows(words: &[WordToken], color: &RgbaImage, config: &PipelineConfig) -> Vec<Row> {
    let (width, height) = color.dimensions();
    let (bands, source) = detect_bands(words, width as f32, config);
    let bins = build_line_bins(words, config);
    let sampler = FlagSampler::from_config(config);

    let mut rows = Vec::with_capacity(bins.len());
    for bin in bins {
        let group = clean_group_name(&text_in_band(words, bin, bands.group, config.min_band_overlap));
        let person =
            clean_person_name(&text_in_band(words, bin, bands.person, config.min_band_overlap));
        if group.is_empty() && person.is_empty() {
            continue;
        }

        let flagged = sampler.is_flagged(color, CellRect::from_cell(bands.flag, bin, width, height));
        rows.push(Row::new(
            if group.is_empty() { GROUP_PLACEHOLDER.to_string() } else { group },
            if person.is_empty() { PERSON_PLACEHOLDER.to_string() } else { person },
            flagged,
        ));
    }
    debug!(?source, raw_rows = rows.len(), "Cells extracted");
    repair_rows(rows, config.min_row_chars)
}

/// Rows of one photo. An engine that cannot be built is an error; a photo
/// without recognizable words yields no rows.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn process_image<B: OcrBackend>(
    image: &DynamicImage,
    engine: &mut EngineHandle<B>,
    config: &PipelineConfig,
) -> Result<Vec<Row>> {
    let prepared = Preprocessor::from_config(config).prepare(image);
    let backend = engine.get()?;
    let (prepared, recognition) =
        RecognitionPolicy::from_config(config).recognize_prepared(backend, prepared);
    if recognition.words.is_empty() {
        info!("No words recognized");
        return Ok(Vec::new());
    }

    let words: Vec<WordToken> = recognition
        .words
        .into_iter()
        .filter(|w| w.confidence >= config.min_confidence)
        .collect();
    let rows = extract_rows(&words, &prepared.color, config);
    info!(word_count = words.len(), row_count = rows.len(), "Image processed");
    Ok(rows)
}

/// Process photos in order and format all their rows as one report.
///
/// The first failure, decoding included, aborts the batch.
pub fn process_batch<B, I>(
    images: I,
    engine: &mut EngineHandle<B>,
    config: &PipelineConfig,
) -> Result<String>
where
    B: OcrBackend,
    I: IntoIterator<Item = Result<DynamicImage>>,
{
    let mut rows = Vec::new();
    for (index, image) in images.into_iter().enumerate() {
        let image = image?;
        debug!(index, "Processing image");
        rows.extend(process_image(&image, engine, config)?);
    }
    Ok(render_report(&rows))
}

/// [`process_batch`], reporting any failure with a generic message.
pub fn run_batch<B, I>(images: I, engine: &mut EngineHandle<B>, config: &PipelineConfig) -> String
where
    B: OcrBackend,
    I: IntoIterator<Item = Result<DynamicImage>>,
{
    match process_batch(images, engine, config) {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "Batch failed");
            BATCH_FAILURE_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgba};
    use tabscan_core::{BoundingBox, EMPTY_REPORT, SegmentationMode, TabscanError};

    /// Returns the words registered for the buffer's width, nothing otherwise.
    struct PageBackend {
        pages: Vec<(u32, Vec<WordToken>)>,
    }

    impl OcrBackend for PageBackend {
        fn recognize(&self, image: &GrayImage, _mode: SegmentationMode) -> Result<Vec<WordToken>> {
            Ok(self
                .pages
                .iter()
                .find(|(width, _)| *width == image.width())
                .map(|(_, words)| words.clone())
                .unwrap_or_default())
        }
    }

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> WordToken {
        WordToken::new(text, BoundingBox::new(x0, y0, x1, y1), 91.0)
    }

    /// Header plus three body rows; the first body row's flag cell is red.
    fn table_words() -> Vec<WordToken> {
        let mut ghost = word("GHOST", 470.0, 110.0, 540.0, 130.0);
        ghost.confidence = 5.0;
        vec![
            word("nm_sentra", 150.0, 10.0, 250.0, 30.0),
            word("customername", 340.0, 10.0, 460.0, 30.0),
            word("ket", 780.0, 10.0, 820.0, 30.0),
            word("SENTRA", 110.0, 60.0, 180.0, 80.0),
            word("MAWAR", 190.0, 60.0, 260.0, 80.0),
            word("BUDI", 320.0, 60.0, 380.0, 80.0),
            word("SANTOSO", 390.0, 60.0, 470.0, 80.0),
            word("PM31", 480.0, 60.0, 520.0, 80.0),
            word("SITI", 320.0, 110.0, 370.0, 130.0),
            word("AMINAH", 380.0, 110.0, 460.0, 130.0),
            ghost,
            word("SENTRA", 110.0, 160.0, 180.0, 180.0),
            word("MELATI", 190.0, 160.0, 260.0, 180.0),
            word("ANI", 320.0, 160.0, 370.0, 180.0),
        ]
    }

    fn table_image() -> DynamicImage {
        let mut image = RgbaImage::from_pixel(1000, 400, Rgba([255, 255, 255, 255]));
        for y in 55..85 {
            for x in 600..1000 {
                image.put_pixel(x, y, Rgba([225, 45, 50, 255]));
            }
        }
        DynamicImage::ImageRgba8(image)
    }

    /// A second photo whose only body row has no group name.
    fn orphan_words() -> Vec<WordToken> {
        vec![
            word("nm_sentra", 150.0, 10.0, 250.0, 30.0),
            word("customername", 340.0, 10.0, 460.0, 30.0),
            word("DEWI", 320.0, 60.0, 380.0, 80.0),
        ]
    }

    fn orphan_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(900, 200, Rgba([255, 255, 255, 255])))
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            min_words: 5,
            ..PipelineConfig::default()
        }
    }

    fn engine() -> EngineHandle<PageBackend> {
        EngineHandle::ready(PageBackend {
            pages: vec![(1000, table_words()), (900, orphan_words())],
        })
    }

    const TABLE_REPORT: &str = "SENTRA MAWAR\nBudi Santoso (tabkur)\nSiti Aminah\n\nSENTRA MELATI\nAni";

    #[test]
    fn rows_are_reconstructed_from_a_photo() {
        let rows = process_image(&table_image(), &mut engine(), &config()).expect("rows");
        assert_eq!(
            rows,
            vec![
                Row::new("SENTRA MAWAR", "Budi Santoso", true),
                Row::new("SENTRA MAWAR", "Siti Aminah", false),
                Row::new("SENTRA MELATI", "Ani", false),
            ]
        );
    }

    #[test]
    fn single_photo_report() {
        let report = process_batch(vec![Ok(table_image())], &mut engine(), &config()).expect("report");
        assert_eq!(report, TABLE_REPORT);
    }

    #[test]
    fn group_names_do_not_carry_across_photos() {
        let report = run_batch(vec![Ok(table_image()), Ok(orphan_image())], &mut engine(), &config());
        assert_eq!(report, format!("{TABLE_REPORT}\n\n{GROUP_PLACEHOLDER}\nDewi"));
    }

    #[test]
    fn photo_without_words_gives_empty_report() {
        let blank = DynamicImage::ImageRgba8(RgbaImage::from_pixel(640, 480, Rgba([255, 255, 255, 255])));
        assert_eq!(run_batch(vec![Ok(blank)], &mut engine(), &config()), EMPTY_REPORT);
    }

    #[test]
    fn engine_failure_yields_generic_message() {
        let mut failing: EngineHandle<PageBackend> =
            EngineHandle::lazy(|| Err(TabscanError::EngineUnavailable("no models".into())));
        assert_eq!(
            run_batch(vec![Ok(table_image())], &mut failing, &config()),
            BATCH_FAILURE_MESSAGE
        );
    }

    #[test]
    fn decode_failure_discards_partial_results() {
        let images = vec![
            Ok(table_image()),
            Err(TabscanError::Image("truncated file".into())),
        ];
        assert_eq!(run_batch(images, &mut engine(), &config()), BATCH_FAILURE_MESSAGE);
    }

    #[test]
    fn engine_is_built_once_per_batch() {
        let builds = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = builds.clone();
        let mut handle = EngineHandle::lazy(move || {
            counter.set(counter.get() + 1);
            Ok(PageBackend {
                pages: vec![(1000, table_words())],
            })
        });
        let images = vec![Ok(table_image()), Ok(table_image())];
        let report = run_batch(images, &mut handle, &config());
        assert!(report.starts_with("SENTRA MAWAR\nBudi Santoso (tabkur)"));
        assert_eq!(builds.get(), 1);
    }
}
