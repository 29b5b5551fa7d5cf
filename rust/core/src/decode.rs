// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Row decoders: the static mapping from a GeoModel table to its typed record.
//!
//! Columns are looked up by name so that databases written by different
//! GeoModel versions (with extra or reordered columns) decode the same way.

use crate::error::{Error, Result};
use crate::records::{
    ChildEdge, Function, GeoRecord, LogVol, Material, NameTag, PhysVol, RootVolume,
    SerialDenominator, SerialTransformer, Shape, TransformRecord,
};
use crate::schema::{GeoTable, NodeTypeEntry, ROOT_PARENT_TABLE};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, ValueRef};

/// Decode one row of a geometry table into its record variant.
pub fn decode_record(table: GeoTable, row: &SqliteRow) -> Result<GeoRecord> {
    let name = table.table_name();
    let record = match table {
        GeoTable::PhysVols => GeoRecord::PhysVol(phys_vol(name, row)?),
        GeoTable::FullPhysVols => GeoRecord::FullPhysVol(phys_vol(name, row)?),
        GeoTable::LogVols => GeoRecord::LogVol(LogVol {
            id: int(name, row, "id")?,
            name: text(name, row, "name")?,
            shape: int(name, row, "shape")?,
            material: int(name, row, "material")?,
        }),
        GeoTable::Materials => GeoRecord::Material(Material {
            id: int(name, row, "id")?,
            name: text(name, row, "name")?,
            density: opt_float(row, "density"),
            elements: opt_text(row, "elements"),
        }),
        GeoTable::Shapes => GeoRecord::Shape(Shape {
            id: int(name, row, "id")?,
            shape_type: text(name, row, "type")?,
            parameters: text(name, row, "parameters")?,
        }),
        GeoTable::NameTags => GeoRecord::NameTag(NameTag {
            id: int(name, row, "id")?,
            name: text(name, row, "name")?,
        }),
        GeoTable::Transforms => GeoRecord::Transform(transform(name, row)?),
        GeoTable::AlignableTransforms => GeoRecord::AlignableTransform(transform(name, row)?),
        GeoTable::SerialDenominators => GeoRecord::SerialDenominator(SerialDenominator {
            id: int(name, row, "id")?,
            base_name: text(name, row, "baseName")?,
        }),
        GeoTable::Functions => GeoRecord::Function(Function {
            id: int(name, row, "id")?,
            expression: text(name, row, "expression")?,
        }),
        GeoTable::SerialTransformers => GeoRecord::SerialTransformer(SerialTransformer {
            id: int(name, row, "id")?,
            func_id: int_any(name, row, &["funcId", "func"])?,
            vol_id: int_any(name, row, &["volId", "vol"])?,
            vol_table: opt_int(row, "volTable"),
            copies: opt_int(row, "copies"),
        }),
        GeoTable::GeoNodesTypes | GeoTable::RootVolume | GeoTable::ChildrenPositions => {
            return Err(Error::UnsupportedTable(name.to_string()))
        }
    };
    Ok(record)
}

pub fn decode_node_type(row: &SqliteRow) -> Result<NodeTypeEntry> {
    let name = GeoTable::GeoNodesTypes.table_name();
    Ok(NodeTypeEntry {
        id: int(name, row, "id")?,
        node_type: text(name, row, "nodeType")?,
        table_name: text(name, row, "tableName")?,
    })
}

/// Older databases only carry `id`; the root then is the physical volume with that id.
pub fn decode_root(row: &SqliteRow) -> Result<RootVolume> {
    let name = GeoTable::RootVolume.table_name();
    let id = int(name, row, "id")?;
    Ok(RootVolume {
        id,
        vol_id: opt_int(row, "volId").unwrap_or(id),
        vol_table: opt_int(row, "volTable").unwrap_or(ROOT_PARENT_TABLE),
    })
}

pub fn decode_child_edge(row: &SqliteRow) -> Result<ChildEdge> {
    let name = GeoTable::ChildrenPositions.table_name();
    Ok(ChildEdge {
        id: int(name, row, "id")?,
        parent_table: int(name, row, "parentTable")?,
        parent_id: int(name, row, "parentId")?,
        position: int(name, row, "position")?,
        child_table: int(name, row, "childTable")?,
        child_id: int(name, row, "childId")?,
    })
}

/// Generic row → JSON object conversion, used for table dumps.
pub fn row_to_json(row: &SqliteRow) -> serde_json::Map<String, serde_json::Value> {
    let mut object = serde_json::Map::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => serde_json::Value::Null,
            Ok(_) => {
                if let Ok(v) = row.try_get::<i64, _>(idx) {
                    v.into()
                } else if let Ok(v) = row.try_get::<f64, _>(idx) {
                    v.into()
                } else if let Ok(v) = row.try_get::<String, _>(idx) {
                    v.into()
                } else {
                    serde_json::Value::Null
                }
            }
            Err(_) => serde_json::Value::Null,
        };
        object.insert(column.name().to_string(), value);
    }
    object
}

fn phys_vol(table: &'static str, row: &SqliteRow) -> Result<PhysVol> {
    Ok(PhysVol {
        id: int(table, row, "id")?,
        logvol: int(table, row, "logvol")?,
    })
}

fn transform(table: &'static str, row: &SqliteRow) -> Result<TransformRecord> {
    Ok(TransformRecord {
        id: int(table, row, "id")?,
        xx: float(table, row, "xx")?,
        xy: float(table, row, "xy")?,
        xz: float(table, row, "xz")?,
        yx: float(table, row, "yx")?,
        yy: float(table, row, "yy")?,
        yz: float(table, row, "yz")?,
        zx: float(table, row, "zx")?,
        zy: float(table, row, "zy")?,
        zz: float(table, row, "zz")?,
        dx: float(table, row, "dx")?,
        dy: float(table, row, "dy")?,
        dz: float(table, row, "dz")?,
    })
}

fn int(table: &'static str, row: &SqliteRow, column: &'static str) -> Result<i64> {
    row.try_get::<i64, _>(column).map_err(|source| Error::Decode {
        table,
        column,
        source,
    })
}

fn int_any(table: &'static str, row: &SqliteRow, columns: &[&'static str]) -> Result<i64> {
    let mut last = None;
    for &column in columns {
        match int(table, row, column) {
            Ok(v) => return Ok(v),
            Err(e) => last = Some(e),
        }
    }
    Err(last.unwrap_or(Error::UnsupportedTable(table.to_string())))
}

// SQLite happily stores `0` for a REAL column, so integers are accepted too.
fn float(table: &'static str, row: &SqliteRow, column: &'static str) -> Result<f64> {
    match row.try_get::<f64, _>(column) {
        Ok(v) => Ok(v),
        Err(err) => row
            .try_get::<i64, _>(column)
            .map(|v| v as f64)
            .map_err(|_| Error::Decode {
                table,
                column,
                source: err,
            }),
    }
}

fn text(table: &'static str, row: &SqliteRow, column: &'static str) -> Result<String> {
    row.try_get::<Option<String>, _>(column)
        .map(Option::unwrap_or_default)
        .map_err(|source| Error::Decode {
            table,
            column,
            source,
        })
}

fn opt_int(row: &SqliteRow, column: &str) -> Option<i64> {
    row.try_get::<Option<i64>, _>(column).ok().flatten()
}

fn opt_float(row: &SqliteRow, column: &str) -> Option<f64> {
    row.try_get::<Option<f64>, _>(column)
        .ok()
        .flatten()
        .or_else(|| opt_int(row, column).map(|v| v as f64))
}

fn opt_text(row: &SqliteRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column).ok().flatten()
}
