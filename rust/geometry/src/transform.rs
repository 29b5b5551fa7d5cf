// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transform accumulation along a root-to-node path.
//!
//! GeoModel places a volume by the transform nodes that precede it among its
//! siblings. Walking down the tree, each transform met is folded into the
//! running accumulator: its rotation is left-multiplied onto the accumulated
//! rotation and its translation is added to the accumulated translation.
//!
//! Translations are summed without being rotated. That is how the indexed
//! documents have always been produced, so downstream consumers expect it.

use geomodel_core::TransformRecord;
use nalgebra::{Matrix3, Vector3};

/// Accumulated rotation and translation.
///
/// This is a `Copy` value. A walker copies it once per fan-out level so that
/// sibling subtrees never observe each other's folds, and lends it by
/// reference down a single chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldedTransform {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl Default for FoldedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl FoldedTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Single-step transform read from a `Transforms`/`AlignableTransforms` row.
    pub fn from_record(record: &TransformRecord) -> Self {
        Self {
            rotation: Matrix3::from_row_slice(&record.rotation_rows()),
            translation: Vector3::from(record.offset()),
        }
    }

    /// Fold a transform row into the accumulator.
    #[inline]
    pub fn fold(&mut self, record: &TransformRecord) {
        self.fold_with(&Self::from_record(record));
    }

    /// Fold another transform into the accumulator: `R = step.R * R`, `t = t + step.t`.
    #[inline]
    pub fn fold_with(&mut self, step: &FoldedTransform) {
        self.rotation = step.rotation * self.rotation;
        self.translation += step.translation;
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Flat form: row-major rotation (`xx, xy, xz, yx, ..., zz`) then `dx, dy, dz`.
    pub fn to_array(&self) -> [f64; 12] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
            t.x,
            t.y,
            t.z,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rotation_record(id: i64, rows: [f64; 9]) -> TransformRecord {
        TransformRecord {
            id,
            xx: rows[0],
            xy: rows[1],
            xz: rows[2],
            yx: rows[3],
            yy: rows[4],
            yz: rows[5],
            zx: rows[6],
            zy: rows[7],
            zz: rows[8],
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
        }
    }

    // 90 degrees about z, then about x.
    const RZ: [f64; 9] = [0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
    const RX: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0];

    #[test]
    fn test_identity_array() {
        let t = FoldedTransform::identity();
        assert_eq!(
            t.to_array(),
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_translations_are_summed() {
        let mut t = FoldedTransform::identity();
        t.fold(&TransformRecord::translation(1, 5.0, 0.0, 0.0));
        t.fold(&TransformRecord::translation(2, 1.0, 2.0, -3.0));

        let flat = t.to_array();
        assert_eq!(&flat[9..], &[6.0, 2.0, -3.0]);
        assert_eq!(t.rotation(), &Matrix3::identity());
    }

    #[test]
    fn test_rotation_is_left_multiplied() {
        let mut t = FoldedTransform::identity();
        t.fold(&rotation_record(1, RZ));
        t.fold(&rotation_record(2, RX));

        // Rx * Rz
        let expected = [0.0, -1.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0];
        for (got, want) in t.to_array()[..9].iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fold_order_matters() {
        let mut zx = FoldedTransform::identity();
        zx.fold(&rotation_record(1, RZ));
        zx.fold(&rotation_record(2, RX));

        let mut xz = FoldedTransform::identity();
        xz.fold(&rotation_record(2, RX));
        xz.fold(&rotation_record(1, RZ));

        assert_ne!(zx.to_array(), xz.to_array());
    }

    #[test]
    fn test_fold_is_associative() {
        let a = FoldedTransform::from_record(&rotation_record(1, RZ));
        let b = FoldedTransform::from_record(&rotation_record(2, RX));
        let c = FoldedTransform::from_parts(
            Matrix3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 3.0),
        );

        // ((I . a) . b) . c
        let mut sequential = FoldedTransform::identity();
        sequential.fold_with(&a);
        sequential.fold_with(&b);
        sequential.fold_with(&c);

        // I . (a . b . c) with the inner chain composed first
        let mut inner = a;
        inner.fold_with(&b);
        inner.fold_with(&c);
        let mut grouped = FoldedTransform::identity();
        grouped.fold_with(&inner);

        assert_relative_eq!(*sequential.rotation(), *grouped.rotation(), epsilon = 1e-12);
        assert_relative_eq!(
            *sequential.translation(),
            *grouped.translation(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            *sequential.rotation(),
            c.rotation() * b.rotation() * a.rotation(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_copy_does_not_alias() {
        let mut parent = FoldedTransform::identity();
        parent.fold(&TransformRecord::translation(1, 1.0, 0.0, 0.0));

        let mut branch = parent;
        branch.fold(&TransformRecord::translation(2, 0.0, 7.0, 0.0));

        assert_eq!(parent.to_array()[10], 0.0);
        assert_eq!(branch.to_array()[10], 7.0);
    }
}
