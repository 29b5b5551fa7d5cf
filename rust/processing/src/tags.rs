// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Name tags active along the current path, keyed by the depth that declared them.

use std::collections::BTreeMap;

/// Depth → name tag.
///
/// A tag declared at depth `d` labels every later sibling at `d` and all of
/// their descendants, until another tag is declared at `d` or the walker
/// unwinds past `d`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStack {
    tags: BTreeMap<usize, String>,
}

impl TagStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) the tag at `depth`.
    pub fn declare(&mut self, depth: usize, name: impl Into<String>) {
        self.tags.insert(depth, name.into());
    }

    /// Drop the tag declared at `depth`, if any.
    pub fn unwind(&mut self, depth: usize) -> Option<String> {
        self.tags.remove(&depth)
    }

    pub fn get(&self, depth: usize) -> Option<&str> {
        self.tags.get(&depth).map(String::as_str)
    }

    /// Current tags in ascending depth order.
    pub fn snapshot(&self) -> Vec<String> {
        self.tags.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_depth_ordered() {
        let mut tags = TagStack::new();
        tags.declare(2, "Module");
        tags.declare(0, "ATLAS");
        tags.declare(1, "Barrel");

        assert_eq!(tags.snapshot(), vec!["ATLAS", "Barrel", "Module"]);
    }

    #[test]
    fn test_redeclare_replaces() {
        let mut tags = TagStack::new();
        tags.declare(1, "A");
        tags.declare(1, "B");
        assert_eq!(tags.get(1), Some("B"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_unwind() {
        let mut tags = TagStack::new();
        tags.declare(0, "outer");
        tags.declare(1, "inner");

        assert_eq!(tags.unwind(1).as_deref(), Some("inner"));
        assert_eq!(tags.unwind(1), None);
        assert_eq!(tags.snapshot(), vec!["outer"]);
    }
}
