// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Geometry: 3D polyline primitives for neuron reconstructions.
//!
//! Arbor Geometry is the leaf building block of the Arbor workspace.
//!
//! - Point/vector helpers over [`glam::DVec3`] (re-exported as [`Point`]).
//! - Closest distance between a point and a segment, and between two segments.
//! - Ramer–Douglas–Peucker simplification expressed as a keep-mask over a point slice.
//! - Discrete Fréchet distance between two ordered point sequences.
//! - Orthonormal local basis construction for a sampled point and its predecessor.
//!
//! It knows nothing about nodes, branches or trees. Higher layers (like the
//! `arbor_tree` crate) gather positions from their own structures and feed them here.
//!
//! # Example
//!
//! ```rust
//! use arbor_geometry::{Point, discrete_frechet, segment_segment_distance};
//!
//! // Two parallel unit segments, one unit apart.
//! let d = segment_segment_distance(
//!     Point::new(0.0, 0.0, 0.0),
//!     Point::new(1.0, 0.0, 0.0),
//!     Point::new(0.0, 1.0, 0.0),
//!     Point::new(1.0, 1.0, 0.0),
//! );
//! assert_eq!(d, 1.0);
//!
//! // Fréchet distance between a polyline and itself is zero.
//! let line = [Point::ZERO, Point::X, Point::new(2.0, 1.0, 0.0)];
//! assert_eq!(discrete_frechet(&line, &line), Some(0.0));
//! ```
//!
//! ### Float semantics
//!
//! Coordinates are assumed finite (no NaNs). Degenerate inputs (zero-length
//! segments, coincident points, parallel segments) are handled by documented
//! fallbacks rather than errors.

pub mod basis;
pub mod polyline;
pub mod segment;
pub mod types;

pub use basis::local_basis;
pub use glam::{DQuat, DVec3};
pub use polyline::{discrete_frechet, polyline_length, simplify_mask};
pub use segment::{point_segment_distance, segment_segment_distance};
pub use types::{Point, barycenter, vector_angle};
