// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays graphics layer storage with allocation, topology, and
//! property management.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::display::NeedsDisplay;
use super::id::{ElementId, GraphicsLayerId, INVALID, SurfaceId};
use super::traverse::Children;
use crate::dirty;
use crate::phase::PaintPhase;
use crate::reasons::CompositingReasons;
use crate::role::LayerRole;
use crate::style::{BlendMode, Color, FilterOperation};
use crate::transform::{Transform3d, TransformOrigin};

/// Per-layer boolean flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer has its own painted backing.
    pub draws_content: bool,
    /// Whether the layer clips its sublayers to its bounds.
    pub masks_to_bounds: bool,
    /// Whether the layer's contents are visible at all.
    pub contents_visible: bool,
    /// Whether painted contents are known to cover every pixel.
    pub contents_opaque: bool,
    /// Whether the back face is visible when rotated.
    pub backface_visible: bool,
    /// Whether the layer flattens its subtree into its plane.
    pub flatten_transform: bool,
    /// Whether the layer starts an isolated blending group.
    pub isolation_root: bool,
}

impl LayerFlags {
    /// Whether the layer has painted content that is shown.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.draws_content && self.contents_visible
    }
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self {
            draws_content: false,
            masks_to_bounds: false,
            contents_visible: true,
            contents_opaque: false,
            backface_visible: true,
            flatten_transform: true,
            isolation_root: false,
        }
    }
}

/// Externally produced contents shown by a layer instead of painted content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerContents {
    /// A decoded image.
    Image(SurfaceId),
    /// A platform surface: video, canvas, or plugin output.
    Platform(SurfaceId),
}

/// Struct-of-arrays storage for all graphics layers.
///
/// Layers are addressed by [`GraphicsLayerId`] handles. Each layer records
/// the [`LayerRole`] it was created for and the element that owns it.
/// Released layers are recycled via a free list, and generation counters
/// prevent stale handle access.
///
/// Every setter is change-detecting: writing the value a layer already has
/// marks nothing dirty.
#[derive(Debug)]
pub struct GraphicsLayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Identity --
    pub(crate) role: Vec<LayerRole>,
    pub(crate) owner: Vec<ElementId>,
    pub(crate) reasons: Vec<CompositingReasons>,

    // -- Geometry --
    pub(crate) position: Vec<Point>,
    pub(crate) size: Vec<Size>,
    pub(crate) offset_from_owner: Vec<Vec2>,
    pub(crate) transform: Vec<Transform3d>,
    pub(crate) transform_origin: Vec<TransformOrigin>,
    pub(crate) children_transform: Vec<Transform3d>,

    // -- Properties --
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) painting_phase: Vec<PaintPhase>,
    pub(crate) mask_layer: Vec<Option<GraphicsLayerId>>,
    pub(crate) contents_clipping_mask: Vec<Option<GraphicsLayerId>>,
    pub(crate) replica: Vec<Option<GraphicsLayerId>>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) blend_mode: Vec<BlendMode>,
    pub(crate) background_color: Vec<Color>,
    pub(crate) filters: Vec<Vec<FilterOperation>>,
    pub(crate) rendering_context: Vec<u64>,
    pub(crate) contents: Vec<Option<LayerContents>>,
    pub(crate) contents_rect: Vec<Rect>,

    // -- Repaint --
    pub(crate) needs_display: Vec<NeedsDisplay>,

    // -- Computed (written by commit) --
    pub(crate) world_transform: Vec<Transform3d>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for GraphicsLayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsLayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            role: Vec::new(),
            owner: Vec::new(),
            reasons: Vec::new(),
            position: Vec::new(),
            size: Vec::new(),
            offset_from_owner: Vec::new(),
            transform: Vec::new(),
            transform_origin: Vec::new(),
            children_transform: Vec::new(),
            flags: Vec::new(),
            painting_phase: Vec::new(),
            mask_layer: Vec::new(),
            contents_clipping_mask: Vec::new(),
            replica: Vec::new(),
            opacity: Vec::new(),
            blend_mode: Vec::new(),
            background_color: Vec::new(),
            filters: Vec::new(),
            rendering_context: Vec::new(),
            contents: Vec::new(),
            contents_rect: Vec::new(),
            needs_display: Vec::new(),
            world_transform: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new layer for `owner` in the given role and returns its
    /// handle.
    ///
    /// The layer starts unparented at the origin with zero size, with the
    /// role's [initial configuration](LayerRole::initial_config) and the
    /// role's compositing reason.
    pub fn create_layer(&mut self, role: LayerRole, owner: ElementId) -> GraphicsLayerId {
        let initial = role.initial_config();
        let flags = LayerFlags {
            draws_content: initial.draws_content,
            masks_to_bounds: initial.masks_to_bounds,
            ..LayerFlags::default()
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.role[i] = role;
            self.owner[i] = owner;
            self.reasons[i] = role.layer_reason();
            self.position[i] = Point::ZERO;
            self.size[i] = Size::ZERO;
            self.offset_from_owner[i] = Vec2::ZERO;
            self.transform[i] = Transform3d::IDENTITY;
            self.transform_origin[i] = TransformOrigin::default();
            self.children_transform[i] = Transform3d::IDENTITY;
            self.flags[i] = flags;
            self.painting_phase[i] = initial.painting_phase;
            self.mask_layer[i] = None;
            self.contents_clipping_mask[i] = None;
            self.replica[i] = None;
            self.opacity[i] = 1.0;
            self.blend_mode[i] = BlendMode::Normal;
            self.background_color[i] = Color::TRANSPARENT;
            self.filters[i].clear();
            self.rendering_context[i] = 0;
            self.contents[i] = None;
            self.contents_rect[i] = Rect::ZERO;
            self.needs_display[i] = NeedsDisplay::None;
            self.world_transform[i] = Transform3d::IDENTITY;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.role.push(role);
            self.owner.push(owner);
            self.reasons.push(role.layer_reason());
            self.position.push(Point::ZERO);
            self.size.push(Size::ZERO);
            self.offset_from_owner.push(Vec2::ZERO);
            self.transform.push(Transform3d::IDENTITY);
            self.transform_origin.push(TransformOrigin::default());
            self.children_transform.push(Transform3d::IDENTITY);
            self.flags.push(flags);
            self.painting_phase.push(initial.painting_phase);
            self.mask_layer.push(None);
            self.contents_clipping_mask.push(None);
            self.replica.push(None);
            self.opacity.push(1.0);
            self.blend_mode.push(BlendMode::Normal);
            self.background_color.push(Color::TRANSPARENT);
            self.filters.push(Vec::new());
            self.rendering_context.push(0);
            self.contents.push(None);
            self.contents_rect.push(Rect::ZERO);
            self.needs_display.push(NeedsDisplay::None);
            self.world_transform.push(Transform3d::IDENTITY);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);

        GraphicsLayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Releases a layer, freeing its slot for reuse.
    ///
    /// The layer is detached from its parent and its children are detached
    /// from it; they become roots until something attaches them again.
    /// Weak references to the layer (as a mask or replica) stop resolving.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release_layer(&mut self, id: GraphicsLayerId) {
        self.validate(id);
        self.remove_all_children(id);
        if self.parent[id.idx as usize] != INVALID {
            self.remove_from_parent(id);
        }
        let idx = id.idx;

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: GraphicsLayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live layers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    ///
    /// Does nothing if `child` already is the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `child` is `parent`.
    pub fn add_child(&mut self, parent: GraphicsLayerId, child: GraphicsLayerId) {
        self.validate(parent);
        self.validate(child);
        assert!(parent != child, "cannot add a layer to itself");
        let p = parent.idx;
        let c = child.idx;
        if self.parent[c as usize] == p && self.next_sibling[c as usize] == INVALID {
            return;
        }
        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child world transform depends on the parent's.
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);

        self.dirty.mark_with(c, dirty::GEOMETRY, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent. Does nothing if unparented.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_from_parent(&mut self, child: GraphicsLayerId) {
        self.validate(child);
        if self.parent[child.idx as usize] != INVALID {
            self.detach(child.idx);
        }
    }

    /// Detaches every child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_all_children(&mut self, parent: GraphicsLayerId) {
        self.validate(parent);
        while self.first_child[parent.idx as usize] != INVALID {
            let c = self.first_child[parent.idx as usize];
            self.detach(c);
        }
    }

    /// Replaces the children of `parent` with `children`, in order.
    ///
    /// Does nothing if the children already match.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn set_children(&mut self, parent: GraphicsLayerId, children: &[GraphicsLayerId]) {
        self.validate(parent);
        if self.children(parent).eq(children.iter().copied()) {
            return;
        }
        self.remove_all_children(parent);
        for &child in children {
            self.add_child(parent, child);
        }
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.validate(id);
        self.handle_at(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: GraphicsLayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the root layers (those with no parent), in slot order.
    #[must_use]
    pub fn roots(&self) -> Vec<GraphicsLayerId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .filter_map(|idx| self.handle_at(idx))
            .collect()
    }

    // -- Identity getters --

    /// Returns the role the layer was created for.
    #[must_use]
    pub fn role(&self, id: GraphicsLayerId) -> LayerRole {
        self.validate(id);
        self.role[id.idx as usize]
    }

    /// Returns the element owning the layer.
    #[must_use]
    pub fn owner(&self, id: GraphicsLayerId) -> ElementId {
        self.validate(id);
        self.owner[id.idx as usize]
    }

    /// Returns the compositing reasons recorded on the layer.
    #[must_use]
    pub fn compositing_reasons(&self, id: GraphicsLayerId) -> CompositingReasons {
        self.validate(id);
        self.reasons[id.idx as usize]
    }

    // -- Geometry getters --

    /// Position relative to the parent layer.
    #[must_use]
    pub fn position(&self, id: GraphicsLayerId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Size of the layer.
    #[must_use]
    pub fn size(&self, id: GraphicsLayerId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Translation from the owner's paint space to the layer's space.
    #[must_use]
    pub fn offset_from_owner(&self, id: GraphicsLayerId) -> Vec2 {
        self.validate(id);
        self.offset_from_owner[id.idx as usize]
    }

    /// Local transform, applied about the transform origin.
    #[must_use]
    pub fn transform(&self, id: GraphicsLayerId) -> Transform3d {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Transform origin in the layer's space.
    #[must_use]
    pub fn transform_origin(&self, id: GraphicsLayerId) -> TransformOrigin {
        self.validate(id);
        self.transform_origin[id.idx as usize]
    }

    /// Transform applied to sublayers.
    #[must_use]
    pub fn children_transform(&self, id: GraphicsLayerId) -> Transform3d {
        self.validate(id);
        self.children_transform[id.idx as usize]
    }

    /// Accumulated transform from the root into this layer's space.
    ///
    /// Only valid after [`commit`](Self::commit).
    #[must_use]
    pub fn world_transform(&self, id: GraphicsLayerId) -> Transform3d {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    // -- Property getters --

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: GraphicsLayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Shorthand for `flags(id).draws_content`.
    #[must_use]
    pub fn draws_content(&self, id: GraphicsLayerId) -> bool {
        self.flags(id).draws_content
    }

    /// Shorthand for `flags(id).masks_to_bounds`.
    #[must_use]
    pub fn masks_to_bounds(&self, id: GraphicsLayerId) -> bool {
        self.flags(id).masks_to_bounds
    }

    /// The painting phase of the layer.
    #[must_use]
    pub fn painting_phase(&self, id: GraphicsLayerId) -> PaintPhase {
        self.validate(id);
        self.painting_phase[id.idx as usize]
    }

    /// The layer used as this layer's mask, if it is still alive.
    #[must_use]
    pub fn mask_layer(&self, id: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.validate(id);
        self.mask_layer[id.idx as usize].filter(|&m| self.is_alive(m))
    }

    /// The layer masking external contents, if it is still alive.
    #[must_use]
    pub fn contents_clipping_mask_layer(&self, id: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.validate(id);
        self.contents_clipping_mask[id.idx as usize].filter(|&m| self.is_alive(m))
    }

    /// The layer this layer is replicated by (a reflection), if alive.
    #[must_use]
    pub fn replica_layer(&self, id: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.validate(id);
        self.replica[id.idx as usize].filter(|&m| self.is_alive(m))
    }

    /// Layer opacity.
    #[must_use]
    pub fn opacity(&self, id: GraphicsLayerId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Layer blend mode.
    #[must_use]
    pub fn blend_mode(&self, id: GraphicsLayerId) -> BlendMode {
        self.validate(id);
        self.blend_mode[id.idx as usize]
    }

    /// Layer background color.
    #[must_use]
    pub fn background_color(&self, id: GraphicsLayerId) -> Color {
        self.validate(id);
        self.background_color[id.idx as usize]
    }

    /// Layer filters.
    #[must_use]
    pub fn filters(&self, id: GraphicsLayerId) -> &[FilterOperation] {
        self.validate(id);
        &self.filters[id.idx as usize]
    }

    /// 3-D rendering context id; `0` means none.
    #[must_use]
    pub fn rendering_context(&self, id: GraphicsLayerId) -> u64 {
        self.validate(id);
        self.rendering_context[id.idx as usize]
    }

    /// External contents, if any.
    #[must_use]
    pub fn contents(&self, id: GraphicsLayerId) -> Option<LayerContents> {
        self.validate(id);
        self.contents[id.idx as usize]
    }

    /// Where external contents are placed in the layer.
    #[must_use]
    pub fn contents_rect(&self, id: GraphicsLayerId) -> Rect {
        self.validate(id);
        self.contents_rect[id.idx as usize]
    }

    /// Pending repaint for the layer.
    #[must_use]
    pub fn needs_display(&self, id: GraphicsLayerId) -> &NeedsDisplay {
        self.validate(id);
        &self.needs_display[id.idx as usize]
    }

    // -- Geometry setters (propagate to descendants) --

    /// Sets the position relative to the parent layer.
    pub fn set_position(&mut self, id: GraphicsLayerId, position: Point) {
        self.validate(id);
        if self.position[id.idx as usize] != position {
            self.position[id.idx as usize] = position;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the size of the layer.
    pub fn set_size(&mut self, id: GraphicsLayerId, size: Size) {
        self.validate(id);
        if self.size[id.idx as usize] != size {
            self.size[id.idx as usize] = size;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the translation from the owner's paint space.
    ///
    /// This only affects painting; it marks the layer's properties dirty.
    pub fn set_offset_from_owner(&mut self, id: GraphicsLayerId, offset: Vec2) {
        self.validate(id);
        if self.offset_from_owner[id.idx as usize] != offset {
            self.offset_from_owner[id.idx as usize] = offset;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the local transform.
    pub fn set_transform(&mut self, id: GraphicsLayerId, transform: Transform3d) {
        self.validate(id);
        if self.transform[id.idx as usize] != transform {
            self.transform[id.idx as usize] = transform;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the transform origin.
    pub fn set_transform_origin(&mut self, id: GraphicsLayerId, origin: TransformOrigin) {
        self.validate(id);
        if self.transform_origin[id.idx as usize] != origin {
            self.transform_origin[id.idx as usize] = origin;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the transform applied to sublayers.
    pub fn set_children_transform(&mut self, id: GraphicsLayerId, transform: Transform3d) {
        self.validate(id);
        if self.children_transform[id.idx as usize] != transform {
            self.children_transform[id.idx as usize] = transform;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    // -- Property setters (local only) --

    /// Sets whether the layer paints its own content.
    ///
    /// Turning drawing on requests a full repaint.
    pub fn set_draws_content(&mut self, id: GraphicsLayerId, draws_content: bool) {
        self.update_flags(id, |f| f.draws_content = draws_content);
    }

    /// Sets whether the layer clips its sublayers.
    pub fn set_masks_to_bounds(&mut self, id: GraphicsLayerId, masks_to_bounds: bool) {
        self.update_flags(id, |f| f.masks_to_bounds = masks_to_bounds);
    }

    /// Sets whether the layer's contents are visible.
    ///
    /// Showing the contents of a drawing layer requests a full repaint.
    pub fn set_contents_visible(&mut self, id: GraphicsLayerId, visible: bool) {
        self.update_flags(id, |f| f.contents_visible = visible);
    }

    /// Sets whether painted contents are opaque.
    pub fn set_contents_opaque(&mut self, id: GraphicsLayerId, opaque: bool) {
        self.update_flags(id, |f| f.contents_opaque = opaque);
    }

    /// Sets backface visibility.
    pub fn set_backface_visible(&mut self, id: GraphicsLayerId, visible: bool) {
        self.update_flags(id, |f| f.backface_visible = visible);
    }

    /// Sets whether the layer flattens its subtree.
    pub fn set_flatten_transform(&mut self, id: GraphicsLayerId, flatten: bool) {
        self.update_flags(id, |f| f.flatten_transform = flatten);
    }

    /// Sets whether the layer starts an isolated group.
    pub fn set_isolation_root(&mut self, id: GraphicsLayerId, isolation_root: bool) {
        self.update_flags(id, |f| f.isolation_root = isolation_root);
    }

    /// Sets the painting phase.
    pub fn set_painting_phase(&mut self, id: GraphicsLayerId, phase: PaintPhase) {
        self.validate(id);
        if self.painting_phase[id.idx as usize] != phase {
            self.painting_phase[id.idx as usize] = phase;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets (weakly) the layer used as this layer's mask.
    pub fn set_mask_layer(&mut self, id: GraphicsLayerId, mask: Option<GraphicsLayerId>) {
        self.validate(id);
        if self.mask_layer[id.idx as usize] != mask {
            self.mask_layer[id.idx as usize] = mask;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets (weakly) the layer masking external contents.
    pub fn set_contents_clipping_mask_layer(
        &mut self,
        id: GraphicsLayerId,
        mask: Option<GraphicsLayerId>,
    ) {
        self.validate(id);
        if self.contents_clipping_mask[id.idx as usize] != mask {
            self.contents_clipping_mask[id.idx as usize] = mask;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets (weakly) the reflection layer replicating this layer.
    pub fn set_replica_layer(&mut self, id: GraphicsLayerId, replica: Option<GraphicsLayerId>) {
        self.validate(id);
        if self.replica[id.idx as usize] != replica {
            self.replica[id.idx as usize] = replica;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the layer opacity.
    pub fn set_opacity(&mut self, id: GraphicsLayerId, opacity: f32) {
        self.validate(id);
        if self.opacity[id.idx as usize] != opacity {
            self.opacity[id.idx as usize] = opacity;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the blend mode.
    pub fn set_blend_mode(&mut self, id: GraphicsLayerId, mode: BlendMode) {
        self.validate(id);
        if self.blend_mode[id.idx as usize] != mode {
            self.blend_mode[id.idx as usize] = mode;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the background color.
    pub fn set_background_color(&mut self, id: GraphicsLayerId, color: Color) {
        self.validate(id);
        if self.background_color[id.idx as usize] != color {
            self.background_color[id.idx as usize] = color;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the filter chain.
    pub fn set_filters(&mut self, id: GraphicsLayerId, filters: &[FilterOperation]) {
        self.validate(id);
        if self.filters[id.idx as usize] != filters {
            self.filters[id.idx as usize] = filters.to_vec();
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the 3-D rendering context id.
    pub fn set_rendering_context(&mut self, id: GraphicsLayerId, context: u64) {
        self.validate(id);
        if self.rendering_context[id.idx as usize] != context {
            self.rendering_context[id.idx as usize] = context;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets the compositing reasons recorded on the layer.
    pub fn set_compositing_reasons(&mut self, id: GraphicsLayerId, reasons: CompositingReasons) {
        self.validate(id);
        if self.reasons[id.idx as usize] != reasons {
            self.reasons[id.idx as usize] = reasons;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Sets external contents.
    pub fn set_contents(&mut self, id: GraphicsLayerId, contents: Option<LayerContents>) {
        self.validate(id);
        if self.contents[id.idx as usize] != contents {
            self.contents[id.idx as usize] = contents;
            self.dirty.mark(id.idx, dirty::DISPLAY);
        }
    }

    /// Reports that external contents changed in place, as when an
    /// accelerated canvas draws a new frame. Ignored for layers without
    /// external contents.
    pub fn set_contents_changed(&mut self, id: GraphicsLayerId) {
        self.validate(id);
        if self.contents[id.idx as usize].is_some() {
            self.dirty.mark(id.idx, dirty::DISPLAY);
        }
    }

    /// Sets where external contents are placed.
    pub fn set_contents_rect(&mut self, id: GraphicsLayerId, rect: Rect) {
        self.validate(id);
        if self.contents_rect[id.idx as usize] != rect {
            self.contents_rect[id.idx as usize] = rect;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
        }
    }

    /// Requests a full repaint. Ignored for layers that do not draw content.
    pub fn set_needs_display(&mut self, id: GraphicsLayerId) {
        self.validate(id);
        if !self.flags[id.idx as usize].draws_content {
            return;
        }
        self.needs_display[id.idx as usize] = NeedsDisplay::Full;
        self.dirty.mark(id.idx, dirty::DISPLAY);
    }

    /// Requests a repaint of `rect` in layer space. Ignored for layers that
    /// do not draw content and for empty rects.
    pub fn set_needs_display_in_rect(&mut self, id: GraphicsLayerId, rect: Rect) {
        self.validate(id);
        if !self.flags[id.idx as usize].draws_content || rect.is_zero_area() {
            return;
        }
        self.needs_display[id.idx as usize].add_rect(rect);
        self.dirty.mark(id.idx, dirty::DISPLAY);
    }

    // -- Raw-index accessors for presenters --
    //
    // These accept raw slot indices (as found in `LayerChanges`) rather than
    // handles, skipping generation validation.

    /// Returns the live handle for raw slot `idx`, if any.
    #[must_use]
    pub fn handle_at(&self, idx: u32) -> Option<GraphicsLayerId> {
        if idx == INVALID || idx >= self.len || self.free_list.contains(&idx) {
            return None;
        }
        Some(GraphicsLayerId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Transform3d {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_transform[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: GraphicsLayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale GraphicsLayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn update_flags(&mut self, id: GraphicsLayerId, f: impl FnOnce(&mut LayerFlags)) {
        self.validate(id);
        let old = self.flags[id.idx as usize];
        let mut flags = old;
        f(&mut flags);
        if flags != old {
            self.flags[id.idx as usize] = flags;
            self.dirty.mark(id.idx, dirty::PROPERTIES);
            // A layer that becomes drawable has no valid backing yet.
            if flags.is_drawable() && !old.is_drawable() {
                self.needs_display[id.idx as usize] = NeedsDisplay::Full;
                self.dirty.mark(id.idx, dirty::DISPLAY);
            }
        }
    }

    /// Unlinks `idx` from its parent and updates dirty state.
    fn detach(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;

        self.dirty.remove_dependency(idx, p, dirty::GEOMETRY);
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }
}
