// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closest-distance queries between points and segments.
//!
//! [`segment_segment_distance`] uses the classical clamped-parametric formulation:
//! minimize `|P(s) - Q(t)|²` over `(s, t) ∈ [0, 1]²` where `P(s) = p0 + s (p1 - p0)`
//! and `Q(t) = q0 + t (q1 - q0)`. The unconstrained optimum is computed from the
//! normal equations and clamped to the unit square edge by edge.

use crate::types::Point;

/// Determinant threshold below which two segments are treated as parallel.
const SMALL_NUM: f64 = 1e-8;

/// Distance from `p` to the closest point of segment `ab`.
///
/// A zero-length segment degenerates to the point distance `|p - a|`.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Closest distance between segments `p0p1` and `q0q1`.
///
/// Near-parallel pairs (determinant below an internal threshold) take the
/// fallback `s = 0` (numerator `0`, denominator `1`) and only optimize `t`,
/// which avoids dividing by a vanishing determinant. Zero-length segments are
/// answered with [`point_segment_distance`].
pub fn segment_segment_distance(p0: Point, p1: Point, q0: Point, q1: Point) -> f64 {
    let u = p1 - p0;
    let v = q1 - q0;
    let w = p0 - q0;
    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w);
    let e = v.dot(w);

    // Point-like segments reduce to a point query.
    if a == 0.0 {
        return point_segment_distance(p0, q0, q1);
    }
    if c == 0.0 {
        return point_segment_distance(q0, p0, p1);
    }

    let det = a * c - b * b;

    let (mut s_n, mut s_d);
    let (mut t_n, mut t_d);

    if det < SMALL_NUM {
        s_n = 0.0;
        s_d = 1.0;
        t_n = e;
        t_d = c;
    } else {
        s_d = det;
        t_d = det;
        s_n = b * e - c * d;
        t_n = a * e - b * d;
        if s_n < 0.0 {
            s_n = 0.0;
            t_n = e;
            t_d = c;
        } else if s_n > s_d {
            s_n = s_d;
            t_n = e + b;
            t_d = c;
        }
    }

    if t_n < 0.0 {
        t_n = 0.0;
        if -d < 0.0 {
            s_n = 0.0;
        } else if -d > a {
            s_n = s_d;
        } else {
            s_n = -d;
            s_d = a;
        }
    } else if t_n > t_d {
        t_n = t_d;
        if -d + b < 0.0 {
            s_n = 0.0;
        } else if -d + b > a {
            s_n = s_d;
        } else {
            s_n = -d + b;
            s_d = a;
        }
    }

    let sc = if s_n.abs() < SMALL_NUM { 0.0 } else { s_n / s_d };
    let tc = if t_n.abs() < SMALL_NUM { 0.0 } else { t_n / t_d };

    (w + u * sc - v * tc).length()
}
