// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed GeoModel records, one struct per geometry table.

use crate::schema::{ItemId, NodeKind, TableId};
use serde::Serialize;

/// `PhysVols` / `FullPhysVols` row: a placement of a logical volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysVol {
    pub id: ItemId,
    pub logvol: ItemId,
}

/// `LogVols` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogVol {
    pub id: ItemId,
    pub name: String,
    pub shape: ItemId,
    pub material: ItemId,
}

/// `Materials` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub id: ItemId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<String>,
}

/// `Shapes` row. `parameters` is kept verbatim (e.g. `"DX=10;DY=10;DZ=10"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub shape_type: String,
    pub parameters: String,
}

/// `NameTags` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameTag {
    pub id: ItemId,
    pub name: String,
}

/// `Transforms` / `AlignableTransforms` row: row-major rotation plus translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformRecord {
    pub id: ItemId,
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yx: f64,
    pub yy: f64,
    pub yz: f64,
    pub zx: f64,
    pub zy: f64,
    pub zz: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl TransformRecord {
    /// Pure translation.
    pub fn translation(id: ItemId, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            id,
            xx: 1.0,
            xy: 0.0,
            xz: 0.0,
            yx: 0.0,
            yy: 1.0,
            yz: 0.0,
            zx: 0.0,
            zy: 0.0,
            zz: 1.0,
            dx,
            dy,
            dz,
        }
    }

    /// Rotation matrix in row-major order.
    pub fn rotation_rows(&self) -> [f64; 9] {
        [
            self.xx, self.xy, self.xz, self.yx, self.yy, self.yz, self.zx, self.zy, self.zz,
        ]
    }

    pub fn offset(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }
}

/// `SerialDenominators` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialDenominator {
    pub id: ItemId,
    pub base_name: String,
}

/// `Functions` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub id: ItemId,
    pub expression: String,
}

/// `SerialTransformers` row: `copies` placements of one volume driven by a function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialTransformer {
    pub id: ItemId,
    pub func_id: ItemId,
    pub vol_id: ItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol_table: Option<TableId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<i64>,
}

/// `RootVolume` row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootVolume {
    pub id: ItemId,
    pub vol_id: ItemId,
    pub vol_table: TableId,
}

/// `ChildrenPositions` row: an ordered parent → child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildEdge {
    pub id: ItemId,
    pub parent_table: TableId,
    pub parent_id: ItemId,
    pub position: i64,
    pub child_table: TableId,
    pub child_id: ItemId,
}

/// A decoded geometry record, tagged by the table it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeoRecord {
    PhysVol(PhysVol),
    FullPhysVol(PhysVol),
    LogVol(LogVol),
    Material(Material),
    Shape(Shape),
    NameTag(NameTag),
    Transform(TransformRecord),
    AlignableTransform(TransformRecord),
    SerialDenominator(SerialDenominator),
    Function(Function),
    SerialTransformer(SerialTransformer),
}

impl GeoRecord {
    pub fn kind(&self) -> NodeKind {
        match self {
            GeoRecord::PhysVol(_) => NodeKind::PhysVol,
            GeoRecord::FullPhysVol(_) => NodeKind::FullPhysVol,
            GeoRecord::LogVol(_) => NodeKind::LogVol,
            GeoRecord::Material(_) => NodeKind::Material,
            GeoRecord::Shape(_) => NodeKind::Shape,
            GeoRecord::NameTag(_) => NodeKind::NameTag,
            GeoRecord::Transform(_) => NodeKind::Transform,
            GeoRecord::AlignableTransform(_) => NodeKind::AlignableTransform,
            GeoRecord::SerialDenominator(_) => NodeKind::SerialDenominator,
            GeoRecord::Function(_) => NodeKind::Function,
            GeoRecord::SerialTransformer(_) => NodeKind::SerialTransformer,
        }
    }

    pub fn id(&self) -> ItemId {
        match self {
            GeoRecord::PhysVol(r) | GeoRecord::FullPhysVol(r) => r.id,
            GeoRecord::LogVol(r) => r.id,
            GeoRecord::Material(r) => r.id,
            GeoRecord::Shape(r) => r.id,
            GeoRecord::NameTag(r) => r.id,
            GeoRecord::Transform(r) | GeoRecord::AlignableTransform(r) => r.id,
            GeoRecord::SerialDenominator(r) => r.id,
            GeoRecord::Function(r) => r.id,
            GeoRecord::SerialTransformer(r) => r.id,
        }
    }

    /// Logical volume reference, present only on physical volumes.
    pub fn logvol_ref(&self) -> Option<ItemId> {
        match self {
            GeoRecord::PhysVol(r) | GeoRecord::FullPhysVol(r) => Some(r.logvol),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<&TransformRecord> {
        match self {
            GeoRecord::Transform(r) | GeoRecord::AlignableTransform(r) => Some(r),
            _ => None,
        }
    }

    /// Record as a JSON object, column name → value.
    pub fn to_json(&self) -> serde_json::Value {
        // Every variant serializes as a plain struct of numbers and strings.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
