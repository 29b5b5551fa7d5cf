// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # GeoModel Core
//!
//! Read-only access to GeoModel detector-geometry databases.
//!
//! ## Overview
//!
//! - **Schema**: table names, node kinds and the `GeoNodesTypes` registry
//! - **Records**: one typed struct per geometry table, unified in [`GeoRecord`]
//! - **Decoding**: static table → decoder mapping over SQLite rows
//! - **Snapshot**: [`GeoModelStore`], an in-memory copy of the database
//! - **Resolution**: [`RecordSource`], `(table id, item id) -> (kind, record)`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geomodel_core::{load_store, open_read_only, RecordSource};
//!
//! let pool = open_read_only("geometry_atlas.db").await?;
//! let store = load_store(&pool).await?;
//!
//! let root = store.root()?;
//! for edge in store.children(geomodel_core::ROOT_PARENT_TABLE, root.vol_id) {
//!     let (kind, record) = store.resolve(edge.child_table, edge.child_id)?;
//!     println!("{} {}", kind, record.id());
//! }
//! ```

pub mod decode;
pub mod error;
pub mod loader;
pub mod records;
pub mod schema;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use loader::{dump_tables, load_store, open_read_only};
pub use records::{
    ChildEdge, Function, GeoRecord, LogVol, Material, NameTag, PhysVol, RootVolume,
    SerialDenominator, SerialTransformer, Shape, TransformRecord,
};
pub use schema::{GeoTable, ItemId, NodeKind, NodeTypeEntry, TableId, ROOT_PARENT_TABLE};
pub use source::RecordSource;
pub use store::GeoModelStore;
