// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Expanded views: references replaced by the records they point to.

use geomodel_core::{
    Error, GeoRecord, GeoTable, ItemId, NodeKind, RecordSource, Result, TableId,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shape of a logical volume, without its row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedShape {
    #[serde(rename = "type")]
    pub shape_type: String,
    pub parameters: String,
}

/// Material of a logical volume, without its row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedMaterial {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedLogVol {
    pub id: ItemId,
    pub name: String,
    pub shape: ExpandedShape,
    pub material: ExpandedMaterial,
}

/// A physical volume with its logical volume expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedPhysVol {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub logvol: ExpandedLogVol,
}

/// A serial transformer with its function and placed volume expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedSerialTransformer {
    pub id: ItemId,
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<i64>,
    pub vol: ExpandedPhysVol,
}

/// One direct child, as listed by [`children_expanded`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedChild {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub object: serde_json::Value,
}

/// Direct children of one volume grouped by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildrenExpanded {
    pub phys_vol_id: ItemId,
    pub children: BTreeMap<i64, Vec<ExpandedChild>>,
}

impl ChildrenExpanded {
    /// Positions shared by more than one child.
    pub fn shared_positions(&self) -> Vec<i64> {
        self.children
            .iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(p, _)| *p)
            .collect()
    }
}

/// Expand a physical volume's logical volume into shape, material and name.
///
/// Fails with [`Error::TypeMismatch`] if `record` has no logical-volume
/// reference, i.e. the resolver handed over something that is not a
/// physical volume.
pub fn expand_physical_volume<S>(source: &S, record: &GeoRecord) -> Result<ExpandedPhysVol>
where
    S: RecordSource + ?Sized,
{
    let logvol_id = record.logvol_ref().ok_or(Error::TypeMismatch {
        expected: NodeKind::PhysVol.as_str(),
        found: record.kind().as_str(),
    })?;

    Ok(ExpandedPhysVol {
        id: record.id(),
        node_type: record.kind().as_str(),
        logvol: expand_logical_volume(source, logvol_id)?,
    })
}

pub fn expand_logical_volume<S>(source: &S, logvol_id: ItemId) -> Result<ExpandedLogVol>
where
    S: RecordSource + ?Sized,
{
    let logvol = match source.record(GeoTable::LogVols, logvol_id)? {
        GeoRecord::LogVol(lv) => lv,
        other => return Err(mismatch(NodeKind::LogVol, other)),
    };

    let shape = match source.record(GeoTable::Shapes, logvol.shape)? {
        GeoRecord::Shape(s) => ExpandedShape {
            shape_type: s.shape_type.clone(),
            parameters: s.parameters.clone(),
        },
        other => return Err(mismatch(NodeKind::Shape, other)),
    };

    let material = match source.record(GeoTable::Materials, logvol.material)? {
        GeoRecord::Material(m) => ExpandedMaterial {
            name: m.name.clone(),
            density: m.density,
        },
        other => return Err(mismatch(NodeKind::Material, other)),
    };

    Ok(ExpandedLogVol {
        id: logvol.id,
        name: logvol.name.clone(),
        shape,
        material,
    })
}

pub fn expand_serial_transformer<S>(
    source: &S,
    record: &GeoRecord,
) -> Result<ExpandedSerialTransformer>
where
    S: RecordSource + ?Sized,
{
    let st = match record {
        GeoRecord::SerialTransformer(st) => st,
        other => return Err(mismatch(NodeKind::SerialTransformer, other)),
    };

    let function = match source.record(GeoTable::Functions, st.func_id)? {
        GeoRecord::Function(f) => f.expression.clone(),
        other => return Err(mismatch(NodeKind::Function, other)),
    };

    let vol_record = match st.vol_table {
        Some(table_id) => source.resolve(table_id, st.vol_id)?.1,
        None => source.record(GeoTable::PhysVols, st.vol_id)?,
    };

    Ok(ExpandedSerialTransformer {
        id: st.id,
        function,
        copies: st.copies,
        vol: expand_physical_volume(source, vol_record)?,
    })
}

/// List the direct children of `(parent_table, parent_id)`, each with its
/// node type and record; physical volumes and serial transformers are
/// expanded.
///
/// Children are grouped by position. The GeoModel schema does not promise
/// positions are unique per parent, so shared positions are kept and logged.
pub fn children_expanded<S>(
    source: &S,
    parent_table: TableId,
    parent_id: ItemId,
) -> Result<ChildrenExpanded>
where
    S: RecordSource + ?Sized,
{
    let mut children: BTreeMap<i64, Vec<ExpandedChild>> = BTreeMap::new();

    for edge in source.children(parent_table, parent_id) {
        let (kind, record) = source.resolve(edge.child_table, edge.child_id)?;
        let object = match kind {
            k if k.is_physical_volume() => {
                serde_json::to_value(expand_physical_volume(source, record)?)?
            }
            NodeKind::SerialTransformer => {
                serde_json::to_value(expand_serial_transformer(source, record)?)?
            }
            _ => record.to_json(),
        };

        let slot = children.entry(edge.position).or_default();
        if !slot.is_empty() {
            tracing::warn!(
                parent_id,
                position = edge.position,
                child_id = edge.child_id,
                "Several children share the same position"
            );
        }
        slot.push(ExpandedChild {
            node_type: kind.as_str(),
            object,
        });
    }

    Ok(ChildrenExpanded {
        phys_vol_id: parent_id,
        children,
    })
}

fn mismatch(expected: NodeKind, found: &GeoRecord) -> Error {
    Error::TypeMismatch {
        expected: expected.as_str(),
        found: found.kind().as_str(),
    }
}
