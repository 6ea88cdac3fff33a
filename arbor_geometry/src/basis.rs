// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orthonormal local frames for sampled points.

use glam::DVec3;

use crate::types::Point;

/// Right-handed orthonormal basis at `position`, oriented by its predecessor.
///
/// - The first axis is the normalized `parent → position` vector. If that
///   vector is zero, `position` itself (as a vector from the origin) is used,
///   and if that is zero too, the x axis.
/// - The third axis is `up` with its component along the first axis removed,
///   normalized. When `up` is parallel to the first axis (or zero), any unit
///   vector orthogonal to the first axis is used.
/// - The second axis is `third × first`, so `first × second == third`.
pub fn local_basis(position: Point, parent: Point, up: DVec3) -> [DVec3; 3] {
    let mut e1 = (position - parent).normalize_or_zero();
    if e1 == DVec3::ZERO {
        e1 = position.normalize_or_zero();
    }
    if e1 == DVec3::ZERO {
        e1 = DVec3::X;
    }

    let mut e3 = (up - e1 * up.dot(e1)).normalize_or_zero();
    if e3 == DVec3::ZERO {
        e3 = e1.any_orthonormal_vector();
    }
    let e2 = e3.cross(e1);
    [e1, e2, e3]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(b: [DVec3; 3]) {
        for (i, v) in b.iter().enumerate() {
            assert!((v.length() - 1.0).abs() < 1e-12, "axis {i} not unit: {v}");
        }
        assert!(b[0].dot(b[1]).abs() < 1e-12);
        assert!(b[0].dot(b[2]).abs() < 1e-12);
        assert!(b[1].dot(b[2]).abs() < 1e-12);
        assert!(
            (b[0].cross(b[1]) - b[2]).length() < 1e-12,
            "basis must be right-handed"
        );
    }

    #[test]
    fn axis_aligned_segment() {
        let b = local_basis(Point::new(2.0, 0.0, 0.0), Point::ZERO, DVec3::Z);
        assert_eq!(b[0], DVec3::X);
        assert_eq!(b[2], DVec3::Z);
        assert_eq!(b[1], DVec3::Y);
        assert_orthonormal(b);
    }

    #[test]
    fn oblique_up_is_orthogonalized() {
        let b = local_basis(
            Point::new(1.0, 1.0, 0.5),
            Point::new(0.0, 0.0, 0.0),
            DVec3::new(0.2, 0.1, 1.0),
        );
        assert_orthonormal(b);
    }

    #[test]
    fn coincident_parent_uses_position() {
        let p = Point::new(0.0, 3.0, 0.0);
        let b = local_basis(p, p, DVec3::Z);
        assert_eq!(b[0], DVec3::Y);
        assert_orthonormal(b);
    }

    #[test]
    fn up_parallel_to_segment() {
        let b = local_basis(Point::new(0.0, 0.0, 5.0), Point::ZERO, DVec3::Z);
        assert_eq!(b[0], DVec3::Z);
        assert_orthonormal(b);
    }

    #[test]
    fn everything_at_origin() {
        let b = local_basis(Point::ZERO, Point::ZERO, DVec3::Z);
        assert_eq!(b[0], DVec3::X);
        assert_orthonormal(b);
    }
}
