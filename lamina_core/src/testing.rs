// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the unit tests.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Rect, Size, Vec2};

use crate::config::CompositingConfig;
use crate::element::{ElementSnapshot, LayoutProvider, LayoutTree};
use crate::layer::{ElementId, GraphicsLayerId, GraphicsLayerStore};
use crate::mapping::{PassContext, PassNotes};
use crate::paint::{ElementPainter, GraphicsContext, PaintRequest};
use crate::scrolling::{ScrollbarOrientation, ScrollingCoordinator};
use crate::trace::{PassSummaryBuilder, Tracer};

/// Builds [`LayoutTree`] fixtures.
///
/// Children are placed by a rect in their parent's local space; every box of
/// a new element covers `(0, 0)` to its size.
#[derive(Debug)]
pub(crate) struct LayoutBuilder {
    viewport: Size,
    elements: BTreeMap<u64, ElementSnapshot>,
    order: Vec<u64>,
}

impl LayoutBuilder {
    pub(crate) fn new() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            elements: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn root(mut self, id: u64, size: Size) -> Self {
        let mut element = ElementSnapshot::new(ElementId(id));
        element.is_root = true;
        element.is_stacking_context = true;
        set_boxes(&mut element, size);
        self.push(element)
    }

    pub(crate) fn child(mut self, id: u64, parent: u64, rect: Rect) -> Self {
        let parent_offset = self
            .elements
            .get(&parent)
            .map_or(Vec2::ZERO, |p| p.offset_from_root);
        let mut element = ElementSnapshot::new(ElementId(id));
        element.parent = Some(ElementId(parent));
        element.offset_from_root = parent_offset + rect.origin().to_vec2();
        element.offset_from_transformed_ancestor = element.offset_from_root;
        set_boxes(&mut element, rect.size());
        self.push(element)
    }

    pub(crate) fn with(mut self, id: u64, f: impl FnOnce(&mut ElementSnapshot)) -> Self {
        if let Some(element) = self.elements.get_mut(&id) {
            f(element);
        }
        self
    }

    pub(crate) fn build(self) -> LayoutTree {
        let mut tree = LayoutTree::new(self.viewport);
        let mut elements = self.elements;
        for id in self.order {
            if let Some(element) = elements.remove(&id) {
                tree.insert(element);
            }
        }
        tree
    }

    fn push(mut self, element: ElementSnapshot) -> Self {
        self.order.push(element.id.0);
        self.elements.insert(element.id.0, element);
        self
    }
}

fn set_boxes(element: &mut ElementSnapshot, size: Size) {
    let bounds = Rect::from_origin_size((0.0, 0.0), size);
    element.border_box = bounds;
    element.compositing_bounds = bounds;
    element.content_box = bounds;
}

/// Records every notification.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingCoordinator {
    pub scroll_layer_changes: Vec<ElementId>,
    pub scrollbar_changes: Vec<(ElementId, ScrollbarOrientation)>,
    pub scroll_parents: Vec<(GraphicsLayerId, Option<ElementId>)>,
    pub clip_parents: Vec<(GraphicsLayerId, Option<ElementId>)>,
    pub fixed_containers: Vec<(GraphicsLayerId, bool)>,
    pub position_constraints: Vec<ElementId>,
    /// Answer to [`ScrollingCoordinator::scroll_layer_did_change`].
    pub handles_scroll_offset: bool,
}

impl ScrollingCoordinator for RecordingCoordinator {
    fn scroll_layer_did_change(&mut self, element: ElementId) -> bool {
        self.scroll_layer_changes.push(element);
        self.handles_scroll_offset
    }

    fn scrollbar_layer_did_change(&mut self, element: ElementId, orientation: ScrollbarOrientation) {
        self.scrollbar_changes.push((element, orientation));
    }

    fn update_scroll_parent(&mut self, layer: GraphicsLayerId, scroll_parent: Option<ElementId>) {
        self.scroll_parents.push((layer, scroll_parent));
    }

    fn update_clip_parent(&mut self, layer: GraphicsLayerId, clip_parent: Option<ElementId>) {
        self.clip_parents.push((layer, clip_parent));
    }

    fn set_layer_is_container_for_fixed_position(&mut self, layer: GraphicsLayerId, is_container: bool) {
        self.fixed_containers.push((layer, is_container));
    }

    fn update_layer_position_constraint(&mut self, element: ElementId) {
        self.position_constraints.push(element);
    }
}

/// Everything a mapping step needs, owned in one place.
#[derive(Debug)]
pub(crate) struct Harness {
    pub store: GraphicsLayerStore,
    pub layout: LayoutTree,
    pub coordinator: RecordingCoordinator,
    pub config: CompositingConfig,
    pub notes: PassNotes,
    pub summary: PassSummaryBuilder,
    pub tracer: Tracer<'static>,
}

impl Harness {
    pub(crate) fn new(layout: LayoutTree) -> Self {
        Self {
            store: GraphicsLayerStore::new(),
            layout,
            coordinator: RecordingCoordinator::default(),
            config: CompositingConfig::DEFAULT,
            notes: PassNotes::default(),
            summary: PassSummaryBuilder::new(0),
            tracer: Tracer::none(),
        }
    }

    pub(crate) fn cx(&mut self) -> PassContext<'_, 'static> {
        PassContext {
            store: &mut self.store,
            layout: &self.layout,
            coordinator: &mut self.coordinator,
            config: self.config,
            generation: 0,
            tracer: &mut self.tracer,
            summary: &mut self.summary,
            notes: &mut self.notes,
        }
    }

    /// A copy of the element's current snapshot.
    pub(crate) fn element(&self, id: u64) -> ElementSnapshot {
        self.layout
            .element(ElementId(id))
            .cloned()
            .unwrap_or_else(|| panic!("no element {id} in fixture"))
    }
}

/// A [`GraphicsContext`] operation, or a paint call recorded alongside them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ContextOp {
    Save,
    Restore,
    Translate(Vec2),
    ClipRect(Rect),
    Paint(ElementId),
}

pub(crate) type OpLog = Rc<RefCell<Vec<ContextOp>>>;

/// Logs state operations; paint calls from a [`RecordingPainter`] sharing
/// the log are interleaved in order.
#[derive(Debug)]
pub(crate) struct RecordingContext {
    log: OpLog,
    depth: usize,
}

impl RecordingContext {
    pub(crate) fn new() -> (Self, OpLog) {
        let log = OpLog::default();
        (
            Self {
                log: log.clone(),
                depth: 0,
            },
            log,
        )
    }

    pub(crate) fn ops(&self) -> Vec<ContextOp> {
        self.log.borrow().clone()
    }

    /// Saves not yet restored.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl GraphicsContext for RecordingContext {
    fn save(&mut self) {
        self.depth += 1;
        self.log.borrow_mut().push(ContextOp::Save);
    }

    fn restore(&mut self) {
        assert!(self.depth > 0, "restore without save");
        self.depth -= 1;
        self.log.borrow_mut().push(ContextOp::Restore);
    }

    fn translate(&mut self, offset: Vec2) {
        self.log.borrow_mut().push(ContextOp::Translate(offset));
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.log.borrow_mut().push(ContextOp::ClipRect(rect));
    }
}

/// Records paint calls.
#[derive(Debug)]
pub(crate) struct RecordingPainter {
    log: OpLog,
    pub requests: Vec<PaintRequest>,
    pub scrollbars: Vec<(ElementId, ScrollbarOrientation, Rect)>,
    pub corners: Vec<(ElementId, Rect)>,
}

impl RecordingPainter {
    pub(crate) fn new(log: OpLog) -> Self {
        Self {
            log,
            requests: Vec::new(),
            scrollbars: Vec::new(),
            corners: Vec::new(),
        }
    }
}

impl ElementPainter for RecordingPainter {
    fn paint_element(&mut self, _context: &mut dyn GraphicsContext, request: &PaintRequest) {
        self.log.borrow_mut().push(ContextOp::Paint(request.element));
        self.requests.push(*request);
    }

    fn paint_scrollbar(
        &mut self,
        _context: &mut dyn GraphicsContext,
        element: ElementId,
        orientation: ScrollbarOrientation,
        dirty: Rect,
    ) {
        self.scrollbars.push((element, orientation, dirty));
    }

    fn paint_scroll_corner(
        &mut self,
        _context: &mut dyn GraphicsContext,
        element: ElementId,
        dirty: Rect,
    ) {
        self.corners.push((element, dirty));
    }
}
