// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Document sinks: the Elasticsearch bulk API and an NDJSON file.

pub mod elastic;
pub mod file;

pub use elastic::ElasticSink;
pub use file::NdjsonFileSink;

use geomodel_processing::FlattenedDocument;
use serde::Serialize;

/// Where every document of a run goes.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkTarget {
    pub index: String,
    pub doc_type: Option<String>,
}

#[derive(Serialize)]
struct IndexAction<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    doc_type: Option<&'a str>,
}

/// Build an NDJSON `_bulk` body: one action line and one source line per
/// document, newline terminated.
pub fn bulk_body(
    target: &BulkTarget,
    documents: &[FlattenedDocument],
) -> Result<String, serde_json::Error> {
    let action = serde_json::to_string(&IndexAction {
        index: ActionMeta {
            index: &target.index,
            doc_type: target.doc_type.as_deref(),
        },
    })?;

    let mut body = String::with_capacity(documents.len() * 256);
    for doc in documents {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}
