// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics layer arena.
//!
//! A *graphics layer* is a node in the compositor's layer tree. Each layer
//! has:
//!
//! - An identity ([`GraphicsLayerId`]), a generational handle that becomes
//!   stale when the layer is released. Using a stale handle panics.
//! - The [`LayerRole`](crate::role::LayerRole) it was created for and the
//!   [`ElementId`] of its owner.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Sublayer order is paint order.
//! - **Local properties** written by the mapping passes: position, size,
//!   transform, flags, painting phase, mask references, and the rest.
//! - **Computed properties** produced by [`commit`](GraphicsLayerStore::commit):
//!   the `world_transform` of every layer.
//!
//! Mask, contents-clipping-mask, and replica references are weak: they stop
//! resolving once the referenced layer is released.

mod display;
mod evaluate;
mod id;
mod store;
mod traverse;

pub use display::{MAX_DIRTY_RECTS, NeedsDisplay};
pub use evaluate::LayerChanges;
pub use id::{ElementId, GraphicsLayerId, INVALID, SurfaceId};
pub use store::{GraphicsLayerStore, LayerContents, LayerFlags};
pub use traverse::{Children, Descendants};
