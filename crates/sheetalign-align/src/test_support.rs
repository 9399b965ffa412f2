// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic sheet builders shared by the unit tests.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use sheetalign_core::config::{InterpolationKind, WarpConfig};
use sheetalign_core::{Point2D, RasterImage, Size};

use crate::raster::raster_from_gray;
use crate::transform::{Warper, compute_homography};

pub(crate) fn blank_gray(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

pub(crate) fn gray_raster(gray: GrayImage) -> RasterImage {
    raster_from_gray(gray).expect("gray buffer always fits its dimensions")
}

/// Filled `side`×`side` squares with their top-left corners at `origins`.
pub(crate) fn draw_squares(gray: &mut GrayImage, origins: &[(i32, i32)], side: u32, value: u8) {
    for &(x, y) in origins {
        draw_filled_rect_mut(gray, Rect::at(x, y).of_size(side, side), Luma([value]));
    }
}

/// Hollow rectangle of the given outer origin/size and border thickness.
pub(crate) fn draw_frame(
    gray: &mut GrayImage,
    origin: (i32, i32),
    size: (u32, u32),
    thickness: u32,
    value: u8,
) {
    let (x, y) = origin;
    let (w, h) = size;
    let t = thickness;
    for rect in [
        Rect::at(x, y).of_size(w, t),
        Rect::at(x, y + (h - t) as i32).of_size(w, t),
        Rect::at(x, y).of_size(t, h),
        Rect::at(x + (w - t) as i32, y).of_size(t, h),
    ] {
        draw_filled_rect_mut(gray, rect, Luma([value]));
    }
}

/// An 800×600 answer-sheet template: a dark outer frame with a solid square
/// registration mark just inside each corner.
pub(crate) fn sheet_template() -> GrayImage {
    let mut gray = blank_gray(800, 600, 245);
    draw_frame(&mut gray, (40, 40), (720, 520), 5, 15);
    draw_squares(&mut gray, &[(60, 60), (710, 60), (710, 510), (60, 510)], 30, 15);
    gray
}

/// Rotate `image` by `degrees` and scale it by `scale` about its centre,
/// filling uncovered pixels with white paper.
pub(crate) fn rotate_and_scale(image: &RasterImage, degrees: f64, scale: f64) -> RasterImage {
    let Size { width, height } = image.size();
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let corners = [
        Point2D::new(0.0, 0.0),
        Point2D::new(width as f64, 0.0),
        Point2D::new(width as f64, height as f64),
        Point2D::new(0.0, height as f64),
    ];
    let moved: Vec<Point2D> = corners
        .iter()
        .map(|p| {
            let (dx, dy) = (p.x - cx, p.y - cy);
            Point2D::new(
                cx + scale * (dx * cos - dy * sin),
                cy + scale * (dx * sin + dy * cos),
            )
        })
        .collect();

    let homography = compute_homography(&corners, &moved).expect("similarity is non-degenerate");
    let warper = Warper::new(WarpConfig {
        interpolation: InterpolationKind::Bilinear,
        background: 255,
    });
    warper
        .warp(image, &homography, image.size())
        .expect("warp into a non-empty canvas")
}
