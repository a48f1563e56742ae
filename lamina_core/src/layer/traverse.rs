// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{GraphicsLayerId, INVALID};
use super::store::GraphicsLayerStore;

/// An iterator over the direct children of a layer, in sublayer order.
///
/// Created by [`GraphicsLayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a GraphicsLayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a GraphicsLayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = GraphicsLayerId;

    fn next(&mut self) -> Option<GraphicsLayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(GraphicsLayerId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}

/// A depth-first pre-order walk over a layer and its descendants.
///
/// Created by [`GraphicsLayerStore::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    store: &'a GraphicsLayerStore,
    stack: alloc::vec::Vec<(u32, usize)>,
}

impl Iterator for Descendants<'_> {
    /// The layer and its depth below the starting layer.
    type Item = (GraphicsLayerId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, depth) = self.stack.pop()?;
        let mut children = alloc::vec::Vec::new();
        let mut child = self.store.first_child[idx as usize];
        while child != INVALID {
            children.push(child);
            child = self.store.next_sibling[child as usize];
        }
        self.stack
            .extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        Some((
            GraphicsLayerId {
                idx,
                generation: self.store.generation[idx as usize],
            },
            depth,
        ))
    }
}

impl GraphicsLayerStore {
    /// Walks `root` and its descendants depth-first, yielding each with its
    /// depth (`0` for `root`).
    #[must_use]
    pub fn descendants(&self, root: GraphicsLayerId) -> Descendants<'_> {
        self.validate(root);
        Descendants {
            store: self,
            stack: alloc::vec![(root.idx, 0)],
        }
    }
}
