// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive point type and small vector helpers.

use glam::DVec3;

/// A position in 3D space.
///
/// Equality is exact and component-wise.
pub type Point = DVec3;

/// Angle between two vectors in radians, in `[0, π]`.
///
/// Returns `0.0` when either vector has zero length.
pub fn vector_angle(a: DVec3, b: DVec3) -> f64 {
    let denom = a.length() * b.length();
    if denom == 0.0 {
        return 0.0;
    }
    // Clamp guards acos against rounding just outside [-1, 1].
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Arithmetic mean of a set of points. Returns `None` if the set is empty.
pub fn barycenter<I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = Point>,
{
    let mut sum = DVec3::ZERO;
    let mut count = 0_usize;
    for p in points {
        sum += p;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
