// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoModel Geometry
//!
//! Transform folding for GeoModel volume trees, using nalgebra for the
//! rotation and translation parts.

pub mod transform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Vector3};

pub use transform::FoldedTransform;
