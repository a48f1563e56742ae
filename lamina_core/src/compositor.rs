// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositing engine.
//!
//! [`Compositor`] owns the graphics layer arena and one
//! [`CompositedLayerMapping`] per composited element. An
//! [`update`](Compositor::update) runs the whole tree through three phases:
//!
//! 1. **Configuration**: walk the layout tree in paint order, decide which
//!    elements get a mapping and which are squashed into another element's
//!    squashing layer, create and destroy mappings, then bring every
//!    mapping's roles in line with its element.
//! 2. **Hierarchy**: rebuild the internal hierarchies that changed, then
//!    attach composited children under their parents.
//! 3. **Geometry**: position and size every layer, each mapping after the
//!    mapping of its compositing container.
//!
//! [`commit`](Compositor::commit) publishes the result as one generation:
//! the arena's drained changes plus the elements whose painted content must
//! be invalidated. Painting reads the state of the last update and never
//! runs during one.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::config::CompositingConfig;
use crate::element::{ElementSnapshot, LayoutProvider};
use crate::layer::{ElementId, GraphicsLayerId, GraphicsLayerStore, LayerChanges};
use crate::mapping::{
    ChildLayer, CompositedLayerMapping, ConfigInputs, GeometryInputs, PassContext, PassNotes,
};
use crate::paint::{ElementPainter, GraphicsContext, PaintEnv};
use crate::role::LayerRole;
use crate::scrolling::ScrollingCoordinator;
use crate::trace::{
    PaintDispatchEvent, PaintTarget, PassSummary, PassSummaryBuilder, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, Tracer,
};

/// What changed about an element's content outside of layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentChange {
    /// The image resource changed or finished loading.
    Image,
    /// The mask image changed.
    MaskImage,
    /// The canvas context changed, for example it became accelerated.
    Canvas,
    /// An accelerated canvas drew new pixels.
    CanvasPixels,
}

/// The result of [`Compositor::commit`].
#[derive(Clone, Debug)]
pub struct CompositingUpdate {
    /// The published generation.
    pub generation: u64,
    /// Layer changes since the previous commit.
    pub changes: LayerChanges,
    /// Elements whose painted content must be invalidated, in id order.
    pub invalidated: Vec<ElementId>,
    /// How many times the root fixed background layer was created or
    /// released.
    pub root_fixed_background_changes: u32,
    /// Counters for the pass.
    pub summary: PassSummary,
}

/// Owns the graphics layers of a document and keeps them in sync with its
/// layout.
#[derive(Debug)]
pub struct Compositor {
    store: GraphicsLayerStore,
    mappings: BTreeMap<ElementId, CompositedLayerMapping>,
    config: CompositingConfig,
    generation: u64,
    root: Option<ElementId>,
    notes: PassNotes,
    summary: PassSummaryBuilder,
    needs_update: bool,
}

impl Compositor {
    /// Creates an engine with no layers.
    #[must_use]
    pub fn new(config: CompositingConfig) -> Self {
        Self {
            store: GraphicsLayerStore::new(),
            mappings: BTreeMap::new(),
            config,
            generation: 0,
            root: None,
            notes: PassNotes::default(),
            summary: PassSummaryBuilder::new(0),
            needs_update: true,
        }
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> CompositingConfig {
        self.config
    }

    /// Replaces the configuration. Takes effect at the next update.
    pub fn set_config(&mut self, config: CompositingConfig) {
        if self.config != config {
            self.config = config;
            self.needs_update = true;
        }
    }

    /// Whether something other than layout asked for an update.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// The generation the next commit publishes.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The graphics layer arena.
    #[must_use]
    pub fn store(&self) -> &GraphicsLayerStore {
        &self.store
    }

    /// The mapping of `element`, if it is composited.
    #[must_use]
    pub fn mapping(&self, element: ElementId) -> Option<&CompositedLayerMapping> {
        self.mappings.get(&element)
    }

    /// Every mapping, in element id order.
    pub fn mappings(&self) -> impl Iterator<Item = &CompositedLayerMapping> + '_ {
        self.mappings.values()
    }

    /// The topmost layer of the document.
    #[must_use]
    pub fn root_layer(&self) -> Option<GraphicsLayerId> {
        self.root
            .and_then(|root| self.mappings.get(&root))
            .and_then(CompositedLayerMapping::child_for_superlayers)
    }

    /// The layer painting the fixed root background, if split out.
    ///
    /// It is not attached anywhere; the embedder places it behind the
    /// scrolled document.
    #[must_use]
    pub fn fixed_root_background_layer(&self) -> Option<GraphicsLayerId> {
        self.root
            .and_then(|root| self.mappings.get(&root))
            .filter(|mapping| mapping.background_paints_fixed_root())
            .and_then(|mapping| mapping.layer(LayerRole::Background))
    }

    /// Runs one compositing pass over `layout`.
    pub fn update(
        &mut self,
        layout: &dyn LayoutProvider,
        coordinator: &mut dyn ScrollingCoordinator,
        tracer: &mut Tracer<'_>,
    ) {
        let Self {
            store,
            mappings,
            config,
            generation,
            root,
            notes,
            summary,
            needs_update,
        } = self;
        let assignment = Assignment::compute(layout, *config);
        *root = layout.root();
        let mut cx = PassContext {
            store,
            layout,
            coordinator,
            config: *config,
            generation: *generation,
            tracer,
            summary,
            notes,
        };

        begin_phase(&mut cx, PhaseKind::Configuration);
        update_mappings(&mut cx, mappings, &assignment);
        end_phase(&mut cx, PhaseKind::Configuration);

        begin_phase(&mut cx, PhaseKind::Hierarchy);
        update_hierarchy(&mut cx, mappings, &assignment);
        end_phase(&mut cx, PhaseKind::Hierarchy);

        begin_phase(&mut cx, PhaseKind::Geometry);
        update_geometry(&mut cx, mappings, &assignment);
        end_phase(&mut cx, PhaseKind::Geometry);

        *needs_update = false;
        log::debug!(
            "pass {}: {} composited, {} squashed",
            generation,
            assignment.composited.len(),
            assignment.squashed.len()
        );
    }

    /// Publishes the current generation.
    pub fn commit(&mut self, tracer: &mut Tracer<'_>) -> CompositingUpdate {
        let generation = self.generation;
        tracer.phase_begin(&PhaseBeginEvent {
            generation,
            phase: PhaseKind::Commit,
        });

        let changes = self.store.commit();
        let invalidated: Vec<ElementId> = self.notes.invalidated.iter().copied().collect();
        let root_fixed_background_changes = self.notes.root_fixed_background_changes;
        let builder =
            core::mem::replace(&mut self.summary, PassSummaryBuilder::new(generation + 1));
        let summary = builder.finish(
            self.mappings.len(),
            u32::try_from(invalidated.len()).unwrap_or(u32::MAX),
            root_fixed_background_changes,
        );
        tracer.pass_summary(&summary);
        #[cfg(feature = "trace-rich")]
        emit_rich_changes(tracer, generation, &changes);

        log::debug!(
            "committed generation {generation}: {} added, {} removed, {} repaints, {} invalidated",
            changes.added.len(),
            changes.removed.len(),
            changes.repaint.len(),
            invalidated.len()
        );
        self.notes.clear();
        self.generation += 1;
        tracer.phase_end(&PhaseEndEvent {
            generation,
            phase: PhaseKind::Commit,
        });

        CompositingUpdate {
            generation,
            changes,
            invalidated,
            root_fixed_background_changes,
            summary,
        }
    }

    /// Paints `layer` for `dirty`, in layer space.
    ///
    /// Returns where the call was routed. Layers this engine does not own,
    /// and layers that show no painted content, are ignored.
    pub fn paint(
        &self,
        layout: &dyn LayoutProvider,
        layer: GraphicsLayerId,
        context: &mut dyn GraphicsContext,
        painter: &mut dyn ElementPainter,
        dirty: Rect,
        tracer: &mut Tracer<'_>,
    ) -> Option<PaintTarget> {
        if !self.store.is_alive(layer) {
            return None;
        }
        let element = self.store.owner(layer);
        let mapping = self.mappings.get(&element)?;
        let env = PaintEnv {
            store: &self.store,
            layout,
            has_fixed_root_background_layer: self.fixed_root_background_layer().is_some(),
        };
        let target = mapping.paint_contents(&env, layer, context, painter, dirty)?;
        tracer.paint_dispatch(&PaintDispatchEvent {
            element,
            layer_index: layer.index(),
            role: self.store.role(layer),
            target,
            dirty,
        });
        Some(target)
    }

    /// Requests a full repaint of `element`'s content layers.
    pub fn set_contents_need_display(&mut self, element: ElementId) {
        if let Some(mapping) = self.mappings.get(&element) {
            mapping.set_contents_need_display(&mut self.store);
        }
    }

    /// Requests a repaint of `rect`, in `element`'s paint space, on its
    /// content layers.
    pub fn set_contents_need_display_in_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(mapping) = self.mappings.get(&element) {
            mapping.set_contents_need_display_in_rect(&mut self.store, rect);
        }
    }

    /// Requests a full repaint of the squashing layer owned by `element`.
    pub fn set_squashing_contents_need_display(&mut self, element: ElementId) {
        if let Some(mapping) = self.mappings.get(&element) {
            mapping.set_squashing_contents_need_display(&mut self.store);
        }
    }

    /// Reacts to a content change of `element` that layout did not see.
    pub fn content_changed(
        &mut self,
        layout: &dyn LayoutProvider,
        element: ElementId,
        change: ContentChange,
    ) {
        let (Some(mapping), Some(snapshot)) = (self.mappings.get(&element), layout.element(element))
        else {
            return;
        };
        match change {
            ContentChange::Image => mapping.update_contents(&mut self.store, snapshot),
            ContentChange::MaskImage => {
                if mapping.layer(LayerRole::Mask).is_some() {
                    self.needs_update = true;
                }
            }
            ContentChange::Canvas => {
                self.needs_update = true;
                mark_canvas_changed(&mut self.store, mapping, snapshot);
            }
            ContentChange::CanvasPixels => mark_canvas_changed(&mut self.store, mapping, snapshot),
        }
    }
}

fn mark_canvas_changed(
    store: &mut GraphicsLayerStore,
    mapping: &CompositedLayerMapping,
    element: &ElementSnapshot,
) {
    if !element.kind.is_accelerated_contents() {
        return;
    }
    if let Some(primary) = mapping.primary_layer() {
        store.set_contents_changed(primary);
    }
}

fn begin_phase(cx: &mut PassContext<'_, '_>, phase: PhaseKind) {
    cx.tracer.phase_begin(&PhaseBeginEvent {
        generation: cx.generation,
        phase,
    });
}

fn end_phase(cx: &mut PassContext<'_, '_>, phase: PhaseKind) {
    cx.tracer.phase_end(&PhaseEndEvent {
        generation: cx.generation,
        phase,
    });
}

#[cfg(feature = "trace-rich")]
fn emit_rich_changes(tracer: &mut Tracer<'_>, generation: u64, changes: &LayerChanges) {
    use crate::layer::NeedsDisplay;
    use crate::trace::{LayerChange, LayerField, RepaintRect};

    let change = |field| move |&layer_index: &u32| LayerChange { layer_index, field };
    let mut records: Vec<LayerChange> = Vec::new();
    records.extend(changes.geometry.iter().map(change(LayerField::Geometry)));
    records.extend(changes.properties.iter().map(change(LayerField::Properties)));
    records.extend(
        changes
            .repaint
            .iter()
            .map(|(idx, _)| idx)
            .map(change(LayerField::Display)),
    );
    records.extend(
        changes
            .added
            .iter()
            .chain(&changes.removed)
            .map(change(LayerField::Topology)),
    );
    tracer.layer_changes(generation, &records);

    let mut rects = Vec::new();
    for (layer_index, pending) in &changes.repaint {
        match pending {
            NeedsDisplay::None => {}
            NeedsDisplay::Full => rects.push(RepaintRect {
                layer_index: *layer_index,
                rect: None,
            }),
            NeedsDisplay::Rects(list) => rects.extend(list.iter().map(|&rect| RepaintRect {
                layer_index: *layer_index,
                rect: Some(rect),
            })),
        }
    }
    tracer.repaint_rects(generation, &rects);
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Which elements are composited and which are squashed, in paint order.
#[derive(Debug, Default)]
struct Assignment {
    /// Every reachable element in paint order. A reflection follows its
    /// owner.
    order: Vec<ElementId>,
    composited: BTreeSet<ElementId>,
    /// Squashed member to owner.
    squashed: BTreeMap<ElementId, ElementId>,
    /// Owner to squashed members, in paint order.
    groups: BTreeMap<ElementId, Vec<ElementId>>,
    /// Reflection to the element it reflects.
    reflection_owner: BTreeMap<ElementId, ElementId>,
}

impl Assignment {
    fn compute(layout: &dyn LayoutProvider, config: CompositingConfig) -> Self {
        let mut assignment = Self::default();
        let Some(root) = layout.root() else {
            return assignment;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(element) = layout.element(id) else {
                continue;
            };
            assignment.visit(element, config);
            if let Some(reflection) = element.reflection.and_then(|r| layout.element(r)) {
                assignment.reflection_owner.insert(reflection.id, id);
                assignment.visit(reflection, config);
            }
            for &child in element.children.iter().rev() {
                if !assignment.is_reflection(layout, child) {
                    stack.push(child);
                }
            }
        }
        assignment
    }

    fn visit(&mut self, element: &ElementSnapshot, config: CompositingConfig) {
        let id = element.id;
        self.order.push(id);
        let reasons = element.reasons;
        if element.is_root || reasons.requires_compositing() {
            self.composited.insert(id);
            return;
        }
        if !reasons.requires_squashing() {
            return;
        }
        // The owner must already be composited, so it precedes the member in
        // paint order.
        let owner = element
            .squash_into
            .filter(|owner| config.layer_squashing_enabled && *owner != id)
            .filter(|owner| self.composited.contains(owner));
        if let Some(owner) = owner {
            self.squashed.insert(id, owner);
            self.groups.entry(owner).or_default().push(id);
        } else {
            self.composited.insert(id);
        }
    }

    fn is_reflection(&self, layout: &dyn LayoutProvider, id: ElementId) -> bool {
        self.reflection_owner.contains_key(&id)
            || layout.element(id).is_some_and(|e| e.is_reflection)
    }

    fn is_composited(&self, id: ElementId) -> bool {
        self.composited.contains(&id)
    }

    /// Nearest composited ancestor; a reflection's container is its owner.
    fn container_of(&self, layout: &dyn LayoutProvider, id: ElementId) -> Option<ElementId> {
        if let Some(&owner) = self.reflection_owner.get(&id) {
            return Some(owner);
        }
        let mut current = layout.element(id)?.parent;
        while let Some(ancestor) = current {
            if self.is_composited(ancestor) {
                return Some(ancestor);
            }
            current = layout.element(ancestor)?.parent;
        }
        None
    }

    fn composited_self_or_ancestor(
        &self,
        layout: &dyn LayoutProvider,
        id: ElementId,
    ) -> Option<ElementId> {
        if self.is_composited(id) {
            Some(id)
        } else {
            self.container_of(layout, id)
        }
    }

    /// Nearest stacking context ancestor; a reflection's is its owner.
    fn stacking_context_of(&self, layout: &dyn LayoutProvider, id: ElementId) -> Option<ElementId> {
        if let Some(&owner) = self.reflection_owner.get(&id) {
            return Some(owner);
        }
        let mut current = layout.element(id)?.parent;
        while let Some(ancestor) = current {
            let element = layout.element(ancestor)?;
            if element.is_stacking_context {
                return Some(ancestor);
            }
            current = element.parent;
        }
        None
    }

    /// The element's opacity times that of every non-composited stacking
    /// context between it and its container.
    fn composited_opacity(&self, layout: &dyn LayoutProvider, element: &ElementSnapshot) -> f32 {
        let mut opacity = element.style.opacity;
        if self.reflection_owner.contains_key(&element.id) {
            return opacity;
        }
        let mut current = element.parent;
        while let Some(ancestor) = current {
            if self.is_composited(ancestor) {
                break;
            }
            let Some(a) = layout.element(ancestor) else {
                break;
            };
            if a.is_stacking_context {
                opacity *= a.style.opacity;
            }
            current = a.parent;
        }
        opacity
    }

    /// Whether a visible descendant paints into `element`'s own layers.
    fn has_visible_non_composited_descendant(
        &self,
        layout: &dyn LayoutProvider,
        element: &ElementSnapshot,
    ) -> bool {
        let mut stack: Vec<ElementId> = element.children.clone();
        while let Some(id) = stack.pop() {
            if self.is_composited(id)
                || self.squashed.contains_key(&id)
                || self.is_reflection(layout, id)
            {
                continue;
            }
            let Some(child) = layout.element(id) else {
                continue;
            };
            if child.content.has_visible_content {
                return true;
            }
            stack.extend(child.children.iter().copied());
        }
        false
    }

    /// Composited elements whose container is `element`, in paint order.
    fn composited_children(
        &self,
        layout: &dyn LayoutProvider,
        element: &ElementSnapshot,
    ) -> Vec<ElementId> {
        let mut found = Vec::new();
        let mut stack: Vec<ElementId> = element.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.is_reflection(layout, id) {
                continue;
            }
            if self.is_composited(id) {
                found.push(id);
                continue;
            }
            if let Some(child) = layout.element(id) {
                stack.extend(child.children.iter().rev().copied());
            }
        }
        found
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

fn update_mappings(
    cx: &mut PassContext<'_, '_>,
    mappings: &mut BTreeMap<ElementId, CompositedLayerMapping>,
    assignment: &Assignment,
) {
    let layout = cx.layout;

    let stale: Vec<ElementId> = mappings
        .keys()
        .filter(|id| !assignment.is_composited(**id))
        .copied()
        .collect();
    for id in stale {
        if let Some(mut mapping) = mappings.remove(&id) {
            mapping.destroy(cx);
            cx.invalidate(id);
            log::debug!("{id:?}: no longer composited");
        }
    }
    for &id in &assignment.order {
        if assignment.is_composited(id) && !mappings.contains_key(&id) {
            let mapping = CompositedLayerMapping::new(id, cx);
            mappings.insert(id, mapping);
            cx.invalidate(id);
            log::debug!("{id:?}: composited");
        }
    }

    // An element is never a member of two groups.
    let moved: Vec<(ElementId, ElementId)> = mappings
        .iter()
        .flat_map(|(&owner, mapping)| {
            mapping
                .squashed_members()
                .iter()
                .map(move |member| (owner, member.element))
        })
        .filter(|(owner, member)| {
            assignment
                .squashed
                .get(member)
                .is_some_and(|new_owner| new_owner != owner)
        })
        .collect();
    for (owner, member) in moved {
        if let Some(mapping) = mappings.get_mut(&owner) {
            mapping.remove_squashed(cx, member);
        }
    }
    for (owner, mapping) in mappings.iter_mut() {
        let members = assignment.groups.get(owner).map_or(&[][..], Vec::as_slice);
        for (index, &member) in members.iter().enumerate() {
            mapping.assign_squashed(cx, member, index);
        }
        mapping.finalize_squashed(cx, members.len());
    }

    for &id in &assignment.order {
        if !assignment.is_composited(id) {
            continue;
        }
        let Some(element) = layout.element(id) else {
            continue;
        };
        let inputs = ConfigInputs {
            container: assignment.container_of(layout, id),
            reflection_primary: element
                .reflection
                .and_then(|r| mappings.get(&r))
                .and_then(CompositedLayerMapping::primary_layer),
            clip_parent: element
                .clip_parent
                .and_then(|c| assignment.composited_self_or_ancestor(layout, c)),
        };
        if let Some(mapping) = mappings.get_mut(&id) {
            mapping.update_configuration(cx, element, &inputs);
        }
    }
}

fn update_hierarchy(
    cx: &mut PassContext<'_, '_>,
    mappings: &mut BTreeMap<ElementId, CompositedLayerMapping>,
    assignment: &Assignment,
) {
    let layout = cx.layout;

    for mapping in mappings.values_mut() {
        if mapping.needs_hierarchy_rebuild() {
            mapping.rebuild_hierarchy(cx);
        }
    }

    // Overlay scrollbars that must paint above a scrolled descendant are
    // lifted out of the scroller and placed right after the last composited
    // element it scrolls.
    let mut carriers: BTreeMap<ElementId, GraphicsLayerId> = BTreeMap::new();
    let mut reparented: BTreeSet<ElementId> = BTreeSet::new();
    for (&scroller, mapping) in mappings.iter() {
        let needs_reparent = layout
            .element(scroller)
            .and_then(|e| e.scroll.as_ref())
            .is_some_and(|s| s.needs_to_reparent_overflow_controls());
        let Some(branch) = mapping.overflow_controls_branch().filter(|_| needs_reparent) else {
            continue;
        };
        let carrier = assignment.order.iter().rev().copied().find(|&id| {
            assignment.is_composited(id)
                && layout
                    .element(id)
                    .is_some_and(|e| e.scroll_parent == Some(scroller))
        });
        if let Some(carrier) = carrier {
            carriers.insert(carrier, branch);
            reparented.insert(scroller);
        }
    }

    for &id in &assignment.order {
        let (Some(mapping), Some(element)) = (mappings.get(&id), layout.element(id)) else {
            continue;
        };
        let children: Vec<ChildLayer> = assignment
            .composited_children(layout, element)
            .into_iter()
            .filter_map(|child| {
                let layer = mappings.get(&child)?.child_for_superlayers()?;
                Some(ChildLayer {
                    layer,
                    negative_z: layout.element(child).is_some_and(|c| c.z_index < 0),
                    reparented_overflow_controls: carriers.get(&child).copied(),
                })
            })
            .collect();
        mapping.attach_children(cx, &children, reparented.contains(&id));
    }
}

fn update_geometry(
    cx: &mut PassContext<'_, '_>,
    mappings: &mut BTreeMap<ElementId, CompositedLayerMapping>,
    assignment: &Assignment,
) {
    let layout = cx.layout;
    for &id in &assignment.order {
        if !assignment.is_composited(id) {
            continue;
        }
        let Some(element) = layout.element(id) else {
            continue;
        };
        let container = assignment.container_of(layout, id).and_then(|c| {
            let mapping = mappings.get(&c)?;
            Some(mapping.as_container(layout.element(c)?))
        });
        let inputs = GeometryInputs {
            container,
            stacking_context: assignment.stacking_context_of(layout, id),
            opacity: assignment.composited_opacity(layout, element),
            has_visible_non_composited_descendant: assignment
                .has_visible_non_composited_descendant(layout, element),
        };
        if let Some(mapping) = mappings.get_mut(&id) {
            mapping.update_geometry(cx, element, &inputs);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::{Rect, Size};

    use super::*;
    use crate::element::{ElementKind, LayoutTree, ScrollState};
    use crate::layer::{LayerContents, SurfaceId};
    use crate::reasons::CompositingReasons;
    use crate::testing::{LayoutBuilder, RecordingContext, RecordingCoordinator, RecordingPainter};

    fn run(compositor: &mut Compositor, layout: &LayoutTree) -> CompositingUpdate {
        let mut coordinator = RecordingCoordinator::default();
        let mut tracer = Tracer::none();
        compositor.update(layout, &mut coordinator, &mut tracer);
        compositor.commit(&mut tracer)
    }

    fn primary(compositor: &Compositor, id: u64) -> GraphicsLayerId {
        compositor
            .mapping(ElementId(id))
            .and_then(CompositedLayerMapping::primary_layer)
            .unwrap()
    }

    fn children(compositor: &Compositor, layer: GraphicsLayerId) -> Vec<GraphicsLayerId> {
        compositor.store().children(layer).collect()
    }

    fn composite(reasons: CompositingReasons) -> impl FnOnce(&mut ElementSnapshot) {
        move |e: &mut ElementSnapshot| e.reasons = reasons
    }

    fn squash_into(owner: u64) -> impl FnOnce(&mut ElementSnapshot) {
        move |e: &mut ElementSnapshot| {
            e.reasons = CompositingReasons::OVERLAP;
            e.squash_into = Some(ElementId(owner));
        }
    }

    #[test]
    fn root_is_always_composited() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        assert!(compositor.needs_update());

        let update = run(&mut compositor, &layout);
        assert_eq!(update.generation, 0);
        assert_eq!(compositor.root_layer(), Some(primary(&compositor, 1)));
        assert_eq!(update.invalidated, vec![ElementId(1)]);
        assert!(!update.changes.added.is_empty());
        assert_eq!(update.summary.mappings, 1);
        assert!(!compositor.needs_update());
        assert_eq!(compositor.generation(), 1);
    }

    fn nested_layout() -> LayoutTree {
        LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(10.0, 10.0, 210.0, 210.0))
            .child(3, 2, Rect::new(5.0, 5.0, 105.0, 105.0))
            .with(3, composite(CompositingReasons::TRANSFORM_3D))
            .child(4, 1, Rect::new(300.0, 0.0, 400.0, 100.0))
            .with(4, |e| {
                e.reasons = CompositingReasons::TRANSFORM_3D;
                e.z_index = -1;
                e.content.has_visible_box_decorations = true;
            })
            .build()
    }

    #[test]
    fn composited_children_attach_through_plain_elements() {
        let layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);

        let root = primary(&compositor, 1);
        assert_eq!(
            children(&compositor, root),
            vec![primary(&compositor, 4), primary(&compositor, 3)],
            "negative z-order first, then paint order"
        );
        assert_eq!(
            compositor.store().position(primary(&compositor, 3)),
            kurbo::Point::new(15.0, 15.0)
        );
        // The plain element between root and 3 paints into the root.
        assert!(compositor.store().draws_content(root));
    }

    #[test]
    fn unchanged_tree_commits_nothing() {
        let layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);

        let second = run(&mut compositor, &layout);
        assert!(second.changes.is_empty(), "{:?}", second.changes);
        assert!(second.invalidated.is_empty());
        assert_eq!(second.summary.layers_created, 0);
        assert_eq!(second.summary.hierarchy_rebuilds, 0);
        assert_eq!(second.summary.geometry_updates, 3);
        assert_eq!(second.generation, 1);
    }

    #[test]
    fn decompositing_releases_layers_and_invalidates() {
        let mut layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);
        let old = primary(&compositor, 3);

        layout.get_mut(ElementId(3)).unwrap().reasons = CompositingReasons::empty();
        let update = run(&mut compositor, &layout);

        assert!(compositor.mapping(ElementId(3)).is_none());
        assert!(!compositor.store().is_alive(old));
        assert_eq!(update.changes.removed, vec![old.index()]);
        assert!(update.invalidated.contains(&ElementId(3)));
        assert_eq!(
            children(&compositor, primary(&compositor, 1)),
            vec![primary(&compositor, 4)]
        );
    }

    fn members(compositor: &Compositor, owner: u64) -> Vec<ElementId> {
        compositor
            .mapping(ElementId(owner))
            .unwrap()
            .squashed_members()
            .iter()
            .map(|m| m.element)
            .collect()
    }

    #[test]
    fn squash_reassignment_invalidates_only_changed_slots() {
        let mut layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(2, composite(CompositingReasons::TRANSFORM_3D))
            .child(5, 1, Rect::new(0.0, 0.0, 10.0, 10.0))
            .with(5, squash_into(2))
            .child(6, 1, Rect::new(20.0, 0.0, 30.0, 10.0))
            .with(6, squash_into(2))
            .child(8, 1, Rect::new(20.0, 0.0, 30.0, 10.0))
            .child(7, 1, Rect::new(40.0, 0.0, 50.0, 10.0))
            .with(7, squash_into(2))
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);
        assert_eq!(
            members(&compositor, 2),
            vec![ElementId(5), ElementId(6), ElementId(7)]
        );

        let six = layout.get_mut(ElementId(6)).unwrap();
        six.reasons = CompositingReasons::empty();
        six.squash_into = None;
        squash_into(2)(layout.get_mut(ElementId(8)).unwrap());
        let update = run(&mut compositor, &layout);

        assert_eq!(
            members(&compositor, 2),
            vec![ElementId(5), ElementId(8), ElementId(7)]
        );
        assert_eq!(update.invalidated, vec![ElementId(6), ElementId(8)]);
        assert_eq!(update.summary.squash_changes, 2, "one eviction, one assignment");
    }

    #[test]
    fn member_moves_between_owners() {
        let mut layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(2, composite(CompositingReasons::TRANSFORM_3D))
            .child(3, 1, Rect::new(200.0, 0.0, 300.0, 100.0))
            .with(3, composite(CompositingReasons::TRANSFORM_3D))
            .child(5, 1, Rect::new(0.0, 200.0, 10.0, 210.0))
            .with(5, squash_into(2))
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);
        assert_eq!(members(&compositor, 2), vec![ElementId(5)]);
        let two = compositor.mapping(ElementId(2)).unwrap();
        assert!(two.layer(LayerRole::Squashing).is_some());

        layout.get_mut(ElementId(5)).unwrap().squash_into = Some(ElementId(3));
        let update = run(&mut compositor, &layout);

        assert!(members(&compositor, 2).is_empty());
        assert_eq!(members(&compositor, 3), vec![ElementId(5)]);
        assert!(update.invalidated.contains(&ElementId(5)));
        let two = compositor.mapping(ElementId(2)).unwrap();
        assert!(two.layer(LayerRole::Squashing).is_none());
        assert!(two.layer(LayerRole::SquashingContainer).is_none());
        let three = compositor.mapping(ElementId(3)).unwrap();
        assert!(three.layer(LayerRole::Squashing).is_some());
    }

    #[test]
    fn squashing_disabled_gives_members_their_own_backing() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(2, composite(CompositingReasons::TRANSFORM_3D))
            .child(5, 1, Rect::new(0.0, 0.0, 10.0, 10.0))
            .with(5, squash_into(2))
            .build();
        let mut compositor = Compositor::new(CompositingConfig::NO_SQUASHING);
        run(&mut compositor, &layout);

        assert!(compositor.mapping(ElementId(5)).is_some());
        assert!(members(&compositor, 2).is_empty());
    }

    #[test]
    fn unassigned_squashable_element_is_composited() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(5, 1, Rect::new(0.0, 0.0, 10.0, 10.0))
            .with(5, composite(CompositingReasons::OVERLAP))
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);
        assert!(compositor.mapping(ElementId(5)).is_some());
    }

    #[test]
    fn root_fixed_background_toggles_notify_once() {
        let mut layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 2000.0))
            .with(1, |e| e.paints_fixed_root_background = true)
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);

        let update = run(&mut compositor, &layout);
        assert_eq!(update.root_fixed_background_changes, 1);
        let background = compositor.fixed_root_background_layer().unwrap();
        assert_eq!(compositor.store().parent(background), None);
        assert_eq!(compositor.store().size(background), Size::new(800.0, 600.0));

        let update = run(&mut compositor, &layout);
        assert_eq!(update.root_fixed_background_changes, 0);

        layout.get_mut(ElementId(1)).unwrap().paints_fixed_root_background = false;
        let update = run(&mut compositor, &layout);
        assert_eq!(update.root_fixed_background_changes, 1);
        assert_eq!(update.summary.root_fixed_background_changes, 1);
        assert!(compositor.fixed_root_background_layer().is_none());
    }

    #[test]
    fn paint_routes_owned_layers_and_ignores_others() {
        let mut layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);
        let (mut context, log) = RecordingContext::new();
        let mut painter = RecordingPainter::new(log);
        let mut tracer = Tracer::none();

        let four = primary(&compositor, 4);
        let dirty = Rect::new(0.0, 0.0, 50.0, 50.0);
        let target = compositor.paint(&layout, four, &mut context, &mut painter, dirty, &mut tracer);
        assert_eq!(target, Some(PaintTarget::Owner));
        assert_eq!(painter.requests.len(), 1);
        assert_eq!(painter.requests[0].element, ElementId(4));
        assert_eq!(context.depth(), 0);

        layout.get_mut(ElementId(4)).unwrap().reasons = CompositingReasons::empty();
        run(&mut compositor, &layout);
        let target = compositor.paint(&layout, four, &mut context, &mut painter, dirty, &mut tracer);
        assert_eq!(target, None, "released layer");
        assert_eq!(painter.requests.len(), 1);
    }

    #[test]
    fn reflection_is_a_replica_not_a_child() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(10.0, 10.0, 110.0, 110.0))
            .with(2, |e| {
                e.reasons = CompositingReasons::TRANSFORM_3D;
                e.reflection = Some(ElementId(3));
            })
            .child(3, 2, Rect::new(0.0, 100.0, 100.0, 200.0))
            .with(3, |e| {
                e.reasons = CompositingReasons::REFLECTION_OF_COMPOSITED_PARENT;
                e.is_reflection = true;
            })
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);

        let (two, three) = (primary(&compositor, 2), primary(&compositor, 3));
        assert_eq!(compositor.store().replica_layer(two), Some(three));
        assert_eq!(compositor.store().parent(three), None);
        assert!(!children(&compositor, two).contains(&three));
        // Placed relative to the reflected element.
        assert_eq!(compositor.store().position(three), kurbo::Point::new(0.0, 100.0));
        assert!(!compositor.store().draws_content(three));
    }

    #[test]
    fn reparented_scrollbars_follow_the_last_scrolled_child() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 200.0, 200.0))
            .with(2, |e| {
                e.reasons = CompositingReasons::OVERFLOW_SCROLLING_TOUCH;
                e.scroll = Some(ScrollState {
                    client_box: Rect::new(0.0, 0.0, 190.0, 200.0),
                    scroll_size: Size::new(190.0, 800.0),
                    composited_scrollbars: true,
                    vertical_scrollbar: Some(Rect::new(190.0, 0.0, 200.0, 200.0)),
                    has_overlay_scrollbars: true,
                    has_topmost_scroll_child: true,
                    ..ScrollState::default()
                });
            })
            .child(3, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(3, |e| {
                e.reasons = CompositingReasons::TRANSFORM_3D;
                e.scroll_parent = Some(ElementId(2));
            })
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);

        let host = compositor
            .mapping(ElementId(2))
            .and_then(|m| m.layer(LayerRole::OverflowControlsHost))
            .unwrap();
        assert_eq!(
            children(&compositor, primary(&compositor, 1)),
            vec![primary(&compositor, 2), primary(&compositor, 3), host]
        );
        assert!(children(&compositor, primary(&compositor, 2)).is_empty());

        let second = run(&mut compositor, &layout);
        assert!(!second.changes.topology_changed);
    }

    #[test]
    fn canvas_pixels_repaint_contents_without_a_pass() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 300.0, 150.0))
            .with(2, |e| {
                e.reasons = CompositingReasons::CANVAS;
                e.kind = ElementKind::Canvas {
                    surface: Some(SurfaceId(7)),
                };
            })
            .build();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);
        let canvas = primary(&compositor, 2);
        assert_eq!(
            compositor.store().contents(canvas),
            Some(LayerContents::Platform(SurfaceId(7)))
        );

        compositor.content_changed(&layout, ElementId(2), ContentChange::CanvasPixels);
        assert!(!compositor.needs_update());
        let update = compositor.commit(&mut Tracer::none());
        assert!(update.changes.repaint.iter().any(|(idx, _)| *idx == canvas.index()));

        compositor.content_changed(&layout, ElementId(2), ContentChange::Canvas);
        assert!(compositor.needs_update());
    }

    fn scroller(scroll_size: Size, scroll_offset: kurbo::Vec2, has_children: bool) -> LayoutTree {
        LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 200.0, 100.0))
            .with(2, |e| {
                e.reasons = CompositingReasons::OVERFLOW_SCROLLING_TOUCH;
                e.scroll = Some(ScrollState {
                    client_box: Rect::new(0.0, 0.0, 200.0, 100.0),
                    scroll_size,
                    scroll_offset,
                    needs_composited_scrolling: true,
                    ..ScrollState::default()
                });
                e.content.has_visible_content = true;
                e.content.has_non_empty_child_renderers = has_children;
            })
            .build()
    }

    #[test]
    fn growing_scroll_contents_repaint_when_they_start_drawing() {
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(
            &mut compositor,
            &scroller(Size::new(200.0, 100.0), kurbo::Vec2::ZERO, false),
        );
        let contents = compositor
            .mapping(ElementId(2))
            .and_then(|m| m.layer(LayerRole::ScrollingContents))
            .unwrap();
        assert!(!compositor.store().draws_content(contents));

        let update = run(
            &mut compositor,
            &scroller(Size::new(200.0, 400.0), kurbo::Vec2::ZERO, true),
        );
        assert!(compositor.store().draws_content(contents));
        assert!(
            update
                .changes
                .repaint
                .iter()
                .any(|(idx, _)| *idx == contents.index())
        );
    }

    #[test]
    fn scrolling_repaints_the_foreground() {
        let layout_at = |y: f64| {
            let mut layout = scroller(Size::new(200.0, 400.0), kurbo::Vec2::new(0.0, y), true);
            if let Some(e) = layout.get_mut(ElementId(2)) {
                e.needs_foreground_layer = true;
            }
            layout
        };
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout_at(30.0));
        let foreground = compositor
            .mapping(ElementId(2))
            .and_then(|m| m.layer(LayerRole::Foreground))
            .unwrap();

        let update = run(&mut compositor, &layout_at(60.0));
        assert!(
            update
                .changes
                .repaint
                .iter()
                .any(|(idx, _)| *idx == foreground.index())
        );
    }

    #[test]
    fn invalidation_of_unknown_elements_is_ignored() {
        let layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);

        compositor.set_contents_need_display(ElementId(99));
        compositor.set_contents_need_display_in_rect(ElementId(99), Rect::new(0.0, 0.0, 5.0, 5.0));
        compositor.set_squashing_contents_need_display(ElementId(99));
        compositor.content_changed(&layout, ElementId(99), ContentChange::Image);
        assert!(compositor.commit(&mut Tracer::none()).changes.is_empty());

        compositor.set_contents_need_display(ElementId(4));
        let update = compositor.commit(&mut Tracer::none());
        assert_eq!(update.changes.repaint.len(), 1);
    }

    #[test]
    fn set_config_requests_an_update_only_on_change() {
        let layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        run(&mut compositor, &layout);

        compositor.set_config(CompositingConfig::DEFAULT);
        assert!(!compositor.needs_update());
        compositor.set_config(CompositingConfig::NO_SQUASHING);
        assert!(compositor.needs_update());
        assert_eq!(compositor.config(), CompositingConfig::NO_SQUASHING);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_sees_every_phase_in_order() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Phases(Vec<(PhaseKind, bool)>);
        impl TraceSink for Phases {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.0.push((e.phase, true));
            }
            fn on_phase_end(&mut self, e: &PhaseEndEvent) {
                self.0.push((e.phase, false));
            }
        }

        let layout = nested_layout();
        let mut compositor = Compositor::new(CompositingConfig::DEFAULT);
        let mut sink = Phases::default();
        let mut tracer = Tracer::new(&mut sink);
        compositor.update(&layout, &mut RecordingCoordinator::default(), &mut tracer);
        compositor.commit(&mut tracer);
        drop(tracer);

        let expected: Vec<(PhaseKind, bool)> = [
            PhaseKind::Configuration,
            PhaseKind::Hierarchy,
            PhaseKind::Geometry,
            PhaseKind::Commit,
        ]
        .into_iter()
        .flat_map(|phase| [(phase, true), (phase, false)])
        .collect();
        assert_eq!(sink.0, expected);
    }
}
