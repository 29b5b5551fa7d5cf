// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only SQLite access: opens a GeoModel file and snapshots it.

use crate::decode::{decode_child_edge, decode_node_type, decode_record, decode_root, row_to_json};
use crate::error::{Error, Result};
use crate::schema::GeoTable;
use crate::store::GeoModelStore;
use rustc_hash::FxHashSet;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;

/// Tables without which no traversal is possible.
const REQUIRED_TABLES: [GeoTable; 3] = [
    GeoTable::GeoNodesTypes,
    GeoTable::RootVolume,
    GeoTable::ChildrenPositions,
];

/// Open a GeoModel database file read-only. One connection is enough: the
/// whole file is read once and then released.
pub async fn open_read_only(path: impl AsRef<Path>) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path.as_ref())
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    tracing::debug!(path = %path.as_ref().display(), "Opened GeoModel database");
    Ok(pool)
}

/// Load every known table into a [`GeoModelStore`].
///
/// Geometry tables missing from the file are treated as empty (older
/// GeoModel files have no `AlignableTransforms`, for instance).
///
/// Every row is decoded up front, so a malformed row fails the load even if
/// no walk would ever reach it.
pub async fn load_store(pool: &SqlitePool) -> Result<GeoModelStore> {
    let present = existing_tables(pool).await?;
    for table in REQUIRED_TABLES {
        if !present.contains(table.table_name()) {
            return Err(Error::MissingTable(table.table_name()));
        }
    }

    let mut store = GeoModelStore::new();

    for row in fetch_table(pool, GeoTable::GeoNodesTypes).await? {
        store.insert_node_type(decode_node_type(&row)?);
    }
    for row in fetch_table(pool, GeoTable::RootVolume).await? {
        store.set_root(decode_root(&row)?);
    }
    for row in fetch_table(pool, GeoTable::ChildrenPositions).await? {
        store.insert_edge(decode_child_edge(&row)?);
    }

    for table in GeoTable::RECORD_TABLES {
        if !present.contains(table.table_name()) {
            tracing::warn!(table = %table, "Table not present in database, treating as empty");
            continue;
        }
        let rows = fetch_table(pool, table).await?;
        tracing::debug!(table = %table, rows = rows.len(), "Loaded table");
        for row in &rows {
            store.insert_record(table, decode_record(table, row)?);
        }
    }

    let store = store.finish();
    tracing::info!(
        records = store.record_count(),
        edges = store.edge_count(),
        duplicates = store.duplicate_count(),
        "Loaded GeoModel snapshot"
    );
    Ok(store)
}

/// Dump every known table present in the database as
/// `{ "TableName": [ {column: value, ...}, ... ] }`.
pub async fn dump_tables(pool: &SqlitePool) -> Result<serde_json::Value> {
    let present = existing_tables(pool).await?;
    let mut out = serde_json::Map::new();

    for table in GeoTable::ALL {
        if !present.contains(table.table_name()) {
            continue;
        }
        let rows = fetch_table(pool, table).await?;
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| serde_json::Value::Object(row_to_json(row)))
            .collect();
        out.insert(table.table_name().to_string(), serde_json::Value::Array(items));
    }

    Ok(serde_json::Value::Object(out))
}

async fn existing_tables(pool: &SqlitePool) -> Result<FxHashSet<String>> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;
    Ok(names.into_iter().collect())
}

async fn fetch_table(pool: &SqlitePool, table: GeoTable) -> Result<Vec<SqliteRow>> {
    let sql = format!("SELECT * FROM \"{}\"", table.table_name());
    Ok(sqlx::query(&sql).fetch_all(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::GeoRecord;
    use crate::schema::NodeKind;
    use crate::source::RecordSource;

    const SCHEMA: &[&str] = &[
        "CREATE TABLE GeoNodesTypes (id INTEGER PRIMARY KEY, nodeType TEXT, tableName TEXT)",
        "CREATE TABLE RootVolume (id INTEGER PRIMARY KEY, volId INTEGER, volTable INTEGER)",
        "CREATE TABLE ChildrenPositions (id INTEGER PRIMARY KEY, parentId INTEGER, parentTable INTEGER, parentCopyNumber INTEGER, position INTEGER, childTable INTEGER, childId INTEGER, childCopyNumber INTEGER)",
        "CREATE TABLE PhysVols (id INTEGER, logvol INTEGER)",
        "CREATE TABLE LogVols (id INTEGER PRIMARY KEY, name TEXT, shape INTEGER, material INTEGER)",
        "CREATE TABLE Materials (id INTEGER PRIMARY KEY, name TEXT, density REAL, elements TEXT)",
        "CREATE TABLE Shapes (id INTEGER PRIMARY KEY, type TEXT, parameters TEXT)",
        "CREATE TABLE Transforms (id INTEGER PRIMARY KEY, xx REAL, xy REAL, xz REAL, yx REAL, yy REAL, yz REAL, zx REAL, zy REAL, zz REAL, dx REAL, dy REAL, dz REAL)",
        "INSERT INTO GeoNodesTypes VALUES (1, 'GeoPhysVol', 'PhysVols'), (3, 'GeoLogVol', 'LogVols'), (4, 'GeoMaterial', 'Materials'), (5, 'GeoShape', 'Shapes'), (9, 'GeoTransform', 'Transforms')",
        "INSERT INTO RootVolume VALUES (1, 1, 1)",
        "INSERT INTO ChildrenPositions VALUES (1, 1, 1, 1, 2, 1, 2, 1), (2, 1, 1, 1, 1, 9, 1, 1)",
        "INSERT INTO PhysVols VALUES (1, 1), (2, 1), (2, 7)",
        "INSERT INTO LogVols VALUES (1, 'Envelope', 1, 1)",
        "INSERT INTO Materials VALUES (1, 'Iron', 7.87, NULL)",
        "INSERT INTO Shapes VALUES (1, 'Box', 'DX=10;DY=10;DZ=10')",
        "INSERT INTO Transforms VALUES (1, 1, 0, 0, 0, 1, 0, 0, 0, 1, 5, 0, 0)",
    ];

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_load_store_from_sqlite() {
        let pool = memory_pool().await;
        let store = load_store(&pool).await.unwrap();

        let root = store.root().unwrap();
        assert_eq!(root.vol_id, 1);

        let children = store.children(1, 1);
        assert_eq!(children.len(), 2);
        // Ordered by position: the transform (position 1) comes first.
        assert_eq!(children[0].child_table, 9);
        assert_eq!(children[1].child_id, 2);

        let (kind, record) = store.resolve(9, 1).unwrap();
        assert_eq!(kind, NodeKind::Transform);
        let transform = record.as_transform().unwrap();
        assert_eq!(transform.dx, 5.0);
        assert_eq!(transform.xx, 1.0);

        // PhysVols row 2 appears twice; the first one wins.
        assert_eq!(store.duplicate_count(), 1);
        assert_eq!(
            store.record(GeoTable::PhysVols, 2).unwrap().logvol_ref(),
            Some(1)
        );

        match store.record(GeoTable::Materials, 1).unwrap() {
            GeoRecord::Material(m) => {
                assert_eq!(m.name, "Iron");
                assert_eq!(m.elements, None);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_required_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE GeoNodesTypes (id INTEGER, nodeType TEXT, tableName TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let err = load_store(&pool).await.unwrap_err();
        assert!(matches!(err, Error::MissingTable("RootVolume")));
    }

    #[tokio::test]
    async fn test_malformed_row_in_unvisited_table_fails_load() {
        let pool = memory_pool().await;
        for statement in [
            "CREATE TABLE SerialTransformers (id INTEGER PRIMARY KEY, funcId INTEGER, volId INTEGER, volTable INTEGER, copies INTEGER)",
            "INSERT INTO SerialTransformers VALUES (1, NULL, 2, 1, 4)",
        ] {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }

        let err = load_store(&pool).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                table: "SerialTransformers",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_dump_tables() {
        let pool = memory_pool().await;
        let dump = dump_tables(&pool).await.unwrap();

        assert_eq!(dump["Shapes"][0]["type"], "Box");
        assert_eq!(dump["Materials"][0]["elements"], serde_json::Value::Null);
        assert_eq!(dump["PhysVols"].as_array().unwrap().len(), 3);
        assert!(dump.get("NameTags").is_none());
    }
}
