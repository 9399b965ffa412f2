// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry helpers shared by the detectors: external contour
// extraction, polygon area and perimeter, Douglas–Peucker simplification of
// closed contours, and angular ordering of corners.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use sheetalign_core::{Contour, Point2D};

/// Outer borders of every top-level foreground region (non-zero pixels).
///
/// Holes and regions nested inside holes are skipped.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            Contour::new(
                c.points
                    .into_iter()
                    .map(|p| Point2D::new(p.x as f64, p.y as f64))
                    .collect(),
            )
        })
        .collect()
}

/// Area enclosed by a closed polygon (shoelace formula). Winding-independent.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice.abs() / 2.0
}

/// Length of a closed polygon's boundary.
pub fn closed_perimeter(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| points[i].distance(&points[(i + 1) % n])).sum()
}

/// Mean of a point set.
pub fn centroid(points: &[Point2D]) -> Point2D {
    if points.is_empty() {
        return Point2D::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2D::new(sx / n, sy / n)
}

/// Sort points by ascending `atan2` angle around their centroid.
///
/// With y pointing down this yields a consistent cyclic order starting from
/// the point nearest the negative x axis, going clockwise on screen.
pub fn sort_by_angle(points: &mut [Point2D]) {
    let center = centroid(points);
    points.sort_by(|a, b| {
        let angle_a = (a.y - center.y).atan2(a.x - center.x);
        let angle_b = (b.y - center.y).atan2(b.x - center.x);
        angle_a.total_cmp(&angle_b)
    });
}

/// Simplify a closed contour with the Douglas–Peucker algorithm.
///
/// The contour is split at two mutually distant points so that the result does
/// not depend on where boundary tracing happened to start. The returned polygon
/// is implicitly closed (the first vertex is not repeated).
pub fn approximate_closed(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let far_a = farthest_from(points, &points[0]);
    let far_b = farthest_from(points, &points[far_a]);
    if far_a == far_b {
        return vec![points[far_a]];
    }

    // Rotate so the walk starts at `far_b`; `far_a` then sits at `split`.
    let rotated: Vec<Point2D> = points[far_b..].iter().chain(&points[..far_b]).copied().collect();
    let split = (far_a + n - far_b) % n;

    let mut first = simplify_open(&rotated[..=split], epsilon);
    let mut second_chain: Vec<Point2D> = rotated[split..].to_vec();
    second_chain.push(rotated[0]);
    let mut second = simplify_open(&second_chain, epsilon);

    first.pop();
    second.pop();
    first.extend(second);
    first
}

fn farthest_from(points: &[Point2D], origin: &Point2D) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Douglas–Peucker on an open polyline; both endpoints are always kept.
fn simplify_open(chain: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = chain.len();
    if n <= 2 {
        return chain.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in start + 1..end {
            let d = distance_to_line(&chain[i], &chain[start], &chain[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
fn distance_to_line(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len < f64::EPSILON {
        return p.distance(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn square_outline(side: usize) -> Vec<Point2D> {
        // Dense boundary walk starting mid-edge, like a traced contour.
        let s = side as f64;
        let mut pts = Vec::new();
        for i in side / 2..side {
            pts.push(Point2D::new(i as f64, 0.0));
        }
        for i in 0..side {
            pts.push(Point2D::new(s, i as f64));
        }
        for i in 0..side {
            pts.push(Point2D::new(s - i as f64, s));
        }
        for i in 0..side {
            pts.push(Point2D::new(0.0, s - i as f64));
        }
        for i in 0..side / 2 {
            pts.push(Point2D::new(i as f64, 0.0));
        }
        pts
    }

    #[test]
    fn polygon_area_of_rectangle() {
        let rect = [
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 5.0),
            Point2D::new(0.0, 5.0),
        ];
        assert!((polygon_area(&rect) - 50.0).abs() < 1e-9);
        assert!((closed_perimeter(&rect) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn approximation_recovers_square_corners_from_any_start() {
        let outline = square_outline(100);
        let perimeter = closed_perimeter(&outline);
        let approx = approximate_closed(&outline, 0.02 * perimeter);
        assert_eq!(approx.len(), 4, "got {approx:?}");
        for corner in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)] {
            assert!(
                approx.iter().any(|p| p.x == corner.0 && p.y == corner.1),
                "missing corner {corner:?} in {approx:?}"
            );
        }
    }

    #[test]
    fn angular_sort_orders_corners_clockwise_from_top_left() {
        let mut corners = vec![
            Point2D::new(90.0, 95.0),
            Point2D::new(10.0, 5.0),
            Point2D::new(5.0, 90.0),
            Point2D::new(95.0, 10.0),
        ];
        sort_by_angle(&mut corners);
        assert_eq!(
            corners,
            vec![
                Point2D::new(10.0, 5.0),
                Point2D::new(95.0, 10.0),
                Point2D::new(90.0, 95.0),
                Point2D::new(5.0, 90.0),
            ]
        );
    }

    #[test]
    fn external_contours_skip_nested_regions() {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(50, 50), Luma([255u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(15, 15).of_size(30, 30), Luma([0u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(25, 25).of_size(10, 10), Luma([255u8]));

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert!(polygon_area(&contours[0].points) > 2000.0);
    }
}
