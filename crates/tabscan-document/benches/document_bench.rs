// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the tabscan-document crate. Measures photo
// preprocessing (width fitting plus the colour and contrast-stretched
// grayscale buffers) on synthetic report photos.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};

use tabscan_document::Preprocessor;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Light background with a few red flag cells, like a photographed report.
fn synthetic_photo(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([236, 232, 225, 255]));
    for y in (height / 4)..(height / 4 + height / 20) {
        for x in (width * 3 / 4)..width {
            img.put_pixel(x, y, Rgba([220, 50, 45, 255]));
        }
    }
    DynamicImage::ImageRgba8(img)
}

/// A photo already narrower than the width cap: only buffer conversion runs.
fn bench_prepare_native(c: &mut Criterion) {
    let photo = synthetic_photo(1600, 1200);
    let preprocessor = Preprocessor::default();

    c.bench_function("prepare (1600x1200, no resize)", |b| {
        b.iter(|| black_box(preprocessor.prepare(black_box(&photo))));
    });
}

/// A phone-camera sized photo that is shrunk to the width cap first.
fn bench_prepare_downscale(c: &mut Criterion) {
    let photo = synthetic_photo(4000, 3000);
    let preprocessor = Preprocessor::default();

    c.bench_function("prepare (4000x3000, downscale)", |b| {
        b.iter(|| black_box(preprocessor.prepare(black_box(&photo))));
    });
}

criterion_group!(benches, bench_prepare_native, bench_prepare_downscale);
criterion_main!(benches);
