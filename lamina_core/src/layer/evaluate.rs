// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation commit and change tracking.
//!
//! A commit follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **TOPOLOGY**: If any layer was attached, detached, created, or
//!    released since the last commit, rebuild the depth-first traversal
//!    order and report `topology_changed`.
//! 2. **GEOMETRY**: Drain dirty indices (already propagated to
//!    descendants) and recompute each layer's `world_transform` in
//!    parent-before-child order.
//! 3. **PROPERTIES**: Drain dirty indices; no recomputation, presenters read
//!    the current values directly from the store.
//! 4. **DISPLAY**: Drain dirty indices and move each layer's pending
//!    [`NeedsDisplay`] into the change set, leaving the layer clean.
//!
//! [`LayerChanges`] uses raw slot indices (`u32`) rather than
//! [`GraphicsLayerId`](super::GraphicsLayerId) handles so presenters can
//! index into the store via [`handle_at`](GraphicsLayerStore::handle_at)
//! and the `*_at()` accessors.

use alloc::vec::Vec;

use kurbo::Vec2;

use super::display::NeedsDisplay;
use super::id::INVALID;
use super::store::GraphicsLayerStore;
use crate::dirty;
use crate::transform::Transform3d;

/// The set of changes produced by a single [`GraphicsLayerStore::commit`].
#[derive(Clone, Debug, Default)]
pub struct LayerChanges {
    /// Layers whose world transform was recomputed.
    pub geometry: Vec<u32>,
    /// Layers with changed non-geometric properties.
    pub properties: Vec<u32>,
    /// Layers with pending repaints, and what to repaint.
    pub repaint: Vec<(u32, NeedsDisplay)>,
    /// Layers created since the last commit.
    pub added: Vec<u32>,
    /// Layers released since the last commit.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl LayerChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.properties.clear();
        self.repaint.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.properties.is_empty()
            && self.repaint.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl GraphicsLayerStore {
    /// Commits the current generation, recomputing world transforms and
    /// returning the set of changes since the previous commit.
    pub fn commit(&mut self) -> LayerChanges {
        let mut changes = LayerChanges::default();
        self.commit_into(&mut changes);
        changes
    }

    /// Like [`commit`](Self::commit), but reuses a caller-provided buffer.
    pub fn commit_into(&mut self, changes: &mut LayerChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let dirty_geometry: Vec<u32> = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_geometry {
            if self.free_list.contains(&idx) {
                continue;
            }
            let i = idx as usize;
            let parent_idx = self.parent[i];
            let parent_space = if parent_idx != INVALID {
                self.world_transform[parent_idx as usize]
                    * self.children_transform[parent_idx as usize]
            } else {
                Transform3d::IDENTITY
            };
            let position = self.position[i].to_vec2();
            self.world_transform[i] = parent_space
                * Transform3d::from_translation(position.x, position.y, 0.0)
                * self.transform[i].about_origin(self.transform_origin[i]);
        }
        changes.geometry = dirty_geometry
            .into_iter()
            .filter(|idx| !self.free_list.contains(idx))
            .collect();

        changes.properties = self
            .dirty
            .drain(dirty::PROPERTIES)
            .deterministic()
            .run()
            .filter(|idx| !self.free_list.contains(idx))
            .collect();

        let dirty_display: Vec<u32> = self
            .dirty
            .drain(dirty::DISPLAY)
            .deterministic()
            .run()
            .collect();
        for idx in dirty_display {
            if self.free_list.contains(&idx) {
                continue;
            }
            let pending = core::mem::take(&mut self.needs_display[idx as usize]);
            changes.repaint.push((idx, pending));
        }

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after [`commit`](Self::commit) has been called at least once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Translation from `layer`'s space into the root's, ignoring any
    /// non-translation parts of ancestor transforms.
    #[must_use]
    pub fn offset_to_root(&self, layer: super::GraphicsLayerId) -> Vec2 {
        self.validate(layer);
        let mut offset = Vec2::ZERO;
        let mut idx = layer.idx;
        while idx != INVALID {
            offset += self.position[idx as usize].to_vec2();
            idx = self.parent[idx as usize];
        }
        offset
    }

    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
    }

    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}
