// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Algorithms over ordered point sequences: length, RDP simplification, discrete Fréchet distance.

use crate::segment::point_segment_distance;
use crate::types::Point;

/// Sum of the lengths of consecutive segments.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Ramer–Douglas–Peucker simplification as a keep-mask.
///
/// The returned vector has one entry per input point; `true` marks points that
/// survive. The first and last points are always kept. For a range `[a, b]`
/// the interior point farthest from segment `ab` is kept (and both halves are
/// processed) when its distance strictly exceeds `tolerance`; otherwise every
/// interior point of the range is dropped.
///
/// Ties on the maximum distance resolve to the earliest point, which makes the
/// simplification idempotent: running it again over the kept points keeps them all.
pub fn simplify_mask(points: &[Point], tolerance: f64) -> Vec<bool> {
    let mut kept = vec![false; points.len()];
    if let Some(first) = kept.first_mut() {
        *first = true;
    }
    if let Some(last) = kept.last_mut() {
        *last = true;
    }
    if points.len() > 2 {
        rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);
    }
    kept
}

fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = point_segment_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Discrete Fréchet distance between two ordered point sequences.
///
/// Computed bottom-up over the full `|a| × |b|` coupling table:
///
/// - `d(0, 0) = |a0 - b0|`
/// - `d(i, 0) = max(d(i-1, 0), |ai - b0|)`
/// - `d(0, j) = max(d(0, j-1), |a0 - bj|)`
/// - `d(i, j) = max(min(d(i-1, j), d(i, j-1), d(i-1, j-1)), |ai - bj|)`
///
/// Returns `None` if either sequence is empty.
pub fn discrete_frechet(a: &[Point], b: &[Point]) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let cols = b.len();
    let mut table = vec![0.0_f64; a.len() * cols];
    for (i, ai) in a.iter().enumerate() {
        for (j, bj) in b.iter().enumerate() {
            let dist = ai.distance(*bj);
            let reach = match (i, j) {
                (0, 0) => dist,
                (_, 0) => table[(i - 1) * cols],
                (0, _) => table[j - 1],
                _ => table[(i - 1) * cols + j]
                    .min(table[i * cols + j - 1])
                    .min(table[(i - 1) * cols + j - 1]),
            };
            table[i * cols + j] = reach.max(dist);
        }
    }
    table.last().copied()
}
