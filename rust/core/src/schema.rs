// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoModel schema: table names, node kinds and the node-type registry rows.
//!
//! The GeoModel database stores every node type in its own table and keeps a
//! `GeoNodesTypes` table mapping a numeric table id to `(nodeType, tableName)`.
//! Child edges reference children by that numeric id, so resolving an edge
//! always goes `table id -> GeoNodesTypes row -> GeoTable -> record`.

use serde::Serialize;
use std::fmt;

/// Numeric table id as used by `GeoNodesTypes` and `ChildrenPositions`.
pub type TableId = i64;

/// Row id inside a GeoModel table.
pub type ItemId = i64;

/// Parent table id used by `ChildrenPositions` rows hanging off the root volume.
pub const ROOT_PARENT_TABLE: TableId = 1;

/// Every table of the GeoModel database this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GeoTable {
    GeoNodesTypes,
    RootVolume,
    ChildrenPositions,
    PhysVols,
    FullPhysVols,
    LogVols,
    Materials,
    Shapes,
    SerialDenominators,
    Functions,
    SerialTransformers,
    AlignableTransforms,
    NameTags,
    Transforms,
}

impl GeoTable {
    pub const ALL: [GeoTable; 14] = [
        GeoTable::GeoNodesTypes,
        GeoTable::RootVolume,
        GeoTable::ChildrenPositions,
        GeoTable::PhysVols,
        GeoTable::FullPhysVols,
        GeoTable::LogVols,
        GeoTable::Materials,
        GeoTable::Shapes,
        GeoTable::SerialDenominators,
        GeoTable::Functions,
        GeoTable::SerialTransformers,
        GeoTable::AlignableTransforms,
        GeoTable::NameTags,
        GeoTable::Transforms,
    ];

    /// Tables holding geometry node records (everything but the bookkeeping tables).
    pub const RECORD_TABLES: [GeoTable; 11] = [
        GeoTable::PhysVols,
        GeoTable::FullPhysVols,
        GeoTable::LogVols,
        GeoTable::Materials,
        GeoTable::Shapes,
        GeoTable::SerialDenominators,
        GeoTable::Functions,
        GeoTable::SerialTransformers,
        GeoTable::AlignableTransforms,
        GeoTable::NameTags,
        GeoTable::Transforms,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            GeoTable::GeoNodesTypes => "GeoNodesTypes",
            GeoTable::RootVolume => "RootVolume",
            GeoTable::ChildrenPositions => "ChildrenPositions",
            GeoTable::PhysVols => "PhysVols",
            GeoTable::FullPhysVols => "FullPhysVols",
            GeoTable::LogVols => "LogVols",
            GeoTable::Materials => "Materials",
            GeoTable::Shapes => "Shapes",
            GeoTable::SerialDenominators => "SerialDenominators",
            GeoTable::Functions => "Functions",
            GeoTable::SerialTransformers => "SerialTransformers",
            GeoTable::AlignableTransforms => "AlignableTransforms",
            GeoTable::NameTags => "NameTags",
            GeoTable::Transforms => "Transforms",
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        GeoTable::ALL.iter().copied().find(|t| t.table_name() == name)
    }

    /// Node kind stored in this table, if it holds geometry nodes.
    pub fn node_kind(self) -> Option<NodeKind> {
        match self {
            GeoTable::PhysVols => Some(NodeKind::PhysVol),
            GeoTable::FullPhysVols => Some(NodeKind::FullPhysVol),
            GeoTable::LogVols => Some(NodeKind::LogVol),
            GeoTable::Materials => Some(NodeKind::Material),
            GeoTable::Shapes => Some(NodeKind::Shape),
            GeoTable::SerialDenominators => Some(NodeKind::SerialDenominator),
            GeoTable::Functions => Some(NodeKind::Function),
            GeoTable::SerialTransformers => Some(NodeKind::SerialTransformer),
            GeoTable::AlignableTransforms => Some(NodeKind::AlignableTransform),
            GeoTable::NameTags => Some(NodeKind::NameTag),
            GeoTable::Transforms => Some(NodeKind::Transform),
            GeoTable::GeoNodesTypes | GeoTable::RootVolume | GeoTable::ChildrenPositions => None,
        }
    }
}

impl fmt::Display for GeoTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Semantic node type, as spelled in the `nodeType` column of `GeoNodesTypes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    PhysVol,
    FullPhysVol,
    LogVol,
    Shape,
    Material,
    NameTag,
    Transform,
    AlignableTransform,
    SerialDenominator,
    SerialTransformer,
    Function,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::PhysVol => "GeoPhysVol",
            NodeKind::FullPhysVol => "GeoFullPhysVol",
            NodeKind::LogVol => "GeoLogVol",
            NodeKind::Shape => "GeoShape",
            NodeKind::Material => "GeoMaterial",
            NodeKind::NameTag => "GeoNameTag",
            NodeKind::Transform => "GeoTransform",
            NodeKind::AlignableTransform => "GeoAlignableTransform",
            NodeKind::SerialDenominator => "GeoSerialDenominator",
            NodeKind::SerialTransformer => "GeoSerialTransformer",
            NodeKind::Function => "Function",
        }
    }

    pub fn from_node_type(node_type: &str) -> Option<Self> {
        let kind = match node_type {
            "GeoPhysVol" => NodeKind::PhysVol,
            "GeoFullPhysVol" => NodeKind::FullPhysVol,
            "GeoLogVol" => NodeKind::LogVol,
            "GeoShape" => NodeKind::Shape,
            "GeoMaterial" => NodeKind::Material,
            "GeoNameTag" => NodeKind::NameTag,
            "GeoTransform" => NodeKind::Transform,
            "GeoAlignableTransform" => NodeKind::AlignableTransform,
            "GeoSerialDenominator" => NodeKind::SerialDenominator,
            "GeoSerialTransformer" => NodeKind::SerialTransformer,
            "Function" | "GeoFunction" => NodeKind::Function,
            _ => return None,
        };
        Some(kind)
    }

    /// Physical volumes are the only nodes that own children and produce documents.
    #[inline]
    pub fn is_physical_volume(self) -> bool {
        matches!(self, NodeKind::PhysVol | NodeKind::FullPhysVol)
    }

    #[inline]
    pub fn is_transform(self) -> bool {
        matches!(self, NodeKind::Transform | NodeKind::AlignableTransform)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `GeoNodesTypes`.
///
/// The raw strings are kept so that rows naming node types or tables this
/// crate does not decode can still be reported by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeEntry {
    pub id: TableId,
    pub node_type: String,
    pub table_name: String,
}

impl NodeTypeEntry {
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_node_type(&self.node_type)
    }

    pub fn table(&self) -> Option<GeoTable> {
        GeoTable::from_table_name(&self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_round_trip() {
        for table in GeoTable::ALL {
            assert_eq!(GeoTable::from_table_name(table.table_name()), Some(table));
        }
        assert_eq!(GeoTable::from_table_name("Identifiers"), None);
    }

    #[test]
    fn test_record_tables_have_kinds() {
        for table in GeoTable::RECORD_TABLES {
            assert!(table.node_kind().is_some(), "{table} has no node kind");
        }
        assert_eq!(GeoTable::ChildrenPositions.node_kind(), None);
    }

    #[test]
    fn test_node_kind_classification() {
        assert!(NodeKind::FullPhysVol.is_physical_volume());
        assert!(!NodeKind::LogVol.is_physical_volume());
        assert!(NodeKind::AlignableTransform.is_transform());
        assert_eq!(NodeKind::from_node_type("GeoNameTag"), Some(NodeKind::NameTag));
        assert_eq!(NodeKind::from_node_type("GeoIdentifierTag"), None);
    }
}
