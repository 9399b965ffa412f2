// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the sheetalign-align crate: binarization and the
// full template-to-sample alignment on a synthetic answer sheet.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma};

use sheetalign_align::raster::raster_from_gray;
use sheetalign_align::{AlignmentOrchestrator, Preprocessor};
use sheetalign_core::RasterImage;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 400x300 light sheet with a dark frame and four corner squares.
fn synthetic_sheet(offset: u32) -> RasterImage {
    let mut img = GrayImage::from_pixel(400, 300, Luma([240u8]));
    let (x0, y0, x1, y1) = (20 + offset, 20 + offset, 380 - offset, 280 - offset);
    for y in y0..y1 {
        for x in x0..x1 {
            let on_border = x < x0 + 4 || x >= x1 - 4 || y < y0 + 4 || y >= y1 - 4;
            if on_border {
                img.put_pixel(x, y, Luma([20u8]));
            }
        }
    }
    for (sx, sy) in [(40, 40), (340, 40), (340, 240), (40, 240)] {
        for y in sy..sy + 20 {
            for x in sx..sx + 20 {
                img.put_pixel(x, y, Luma([20u8]));
            }
        }
    }
    match raster_from_gray(img) {
        Ok(raster) => raster,
        Err(err) => panic!("synthetic sheet: {err}"),
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_binarize(c: &mut Criterion) {
    let sheet = synthetic_sheet(0);
    let preprocessor = Preprocessor::default();

    c.bench_function("binarize (400x300)", |b| {
        b.iter(|| black_box(preprocessor.binarize(black_box(&sheet))));
    });
}

/// Full alignment of a slightly inset sample against the synthetic template.
fn bench_align(c: &mut Criterion) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => panic!("tokio runtime: {err}"),
    };
    let template = synthetic_sheet(0);
    let sample = synthetic_sheet(6);

    let mut orchestrator = AlignmentOrchestrator::default();
    if let Err(err) = runtime.block_on(orchestrator.initialize_with_template(&template)) {
        panic!("template initialization: {err}");
    }

    c.bench_function("align_user_image (400x300)", |b| {
        b.iter(|| {
            let result = runtime.block_on(orchestrator.align_user_image(black_box(&sample)));
            black_box(result);
        });
    });
}

criterion_group!(benches, bench_binarize, bench_align);
criterion_main!(benches);
