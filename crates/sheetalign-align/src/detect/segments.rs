// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line segment extraction. Hough lines (1 px / 1° accumulator) are found on
// the foreground mask, then each line is walked across the image to recover
// the finite runs of foreground that support it.

use image::GrayImage;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use sheetalign_core::Point2D;
use tracing::debug;

/// Parameters for [`detect_segments`].
#[derive(Debug, Clone, Copy)]
pub struct SegmentOptions {
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_length: f64,
    pub max_gap: u32,
}

/// A finite line segment in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Find foreground line segments at least `min_length` long, bridging gaps of
/// up to `max_gap` pixels.
pub fn detect_segments(mask: &GrayImage, options: SegmentOptions) -> Vec<LineSegment> {
    let lines = detect_lines(
        mask,
        LineDetectionOptions {
            vote_threshold: options.vote_threshold,
            suppression_radius: options.suppression_radius,
        },
    );
    debug!(line_count = lines.len(), "Hough lines detected");

    let segments: Vec<LineSegment> = lines
        .iter()
        .flat_map(|line| trace_line(mask, line, options.min_length, options.max_gap))
        .collect();
    debug!(segment_count = segments.len(), "Line segments traced");
    segments
}

/// Walk a polar line one pixel at a time and split it into supported runs.
///
/// A `PolarLine` `(r, θ)` is the set `x·cosθ + y·sinθ = r`. A sample counts as
/// supported when the pixel on the line or one of its two neighbours across
/// the line is foreground, which absorbs rasterisation jitter.
pub(crate) fn trace_line(
    mask: &GrayImage,
    line: &PolarLine,
    min_length: f64,
    max_gap: u32,
) -> Vec<LineSegment> {
    let (width, height) = mask.dimensions();
    let theta = (line.angle_in_degrees as f64).to_radians();
    let (sin, cos) = theta.sin_cos();
    let r = line.r as f64;

    // Foot of the normal from the origin, and the direction along the line.
    let (ox, oy) = (r * cos, r * sin);
    let (dx, dy) = (-sin, cos);
    let reach = (width as f64).hypot(height as f64);

    let on = |x: f64, y: f64| -> bool {
        let (xi, yi) = (x.round(), y.round());
        xi >= 0.0
            && yi >= 0.0
            && xi < width as f64
            && yi < height as f64
            && mask.get_pixel(xi as u32, yi as u32).0[0] > 0
    };

    let mut segments = Vec::new();
    let mut run: Option<(Point2D, Point2D)> = None;
    let mut gap = 0u32;

    let steps = (2.0 * reach).ceil() as i64;
    for step in 0..=steps {
        let t = step as f64 - reach;
        let (x, y) = (ox + t * dx, oy + t * dy);
        let hit = on(x, y) || on(x + cos, y + sin) || on(x - cos, y - sin);

        if hit {
            let point = Point2D::new(x.round(), y.round());
            run = Some(match run {
                Some((start, _)) => (start, point),
                None => (point, point),
            });
            gap = 0;
        } else if let Some((start, end)) = run {
            gap += 1;
            if gap > max_gap {
                push_if_long(&mut segments, start, end, min_length);
                run = None;
                gap = 0;
            }
        }
    }
    if let Some((start, end)) = run {
        push_if_long(&mut segments, start, end, min_length);
    }
    segments
}

fn push_if_long(segments: &mut Vec<LineSegment>, start: Point2D, end: Point2D, min_length: f64) {
    let segment = LineSegment { start, end };
    if segment.length() >= min_length {
        segments.push(segment);
    }
}
