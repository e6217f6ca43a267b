// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature-click binding and payload extraction.
//!
//! The dispatcher tracks which layers are hit-test targets, keeps the
//! surface's subscriptions symmetric with that set, and turns raw click
//! events into `(coordinate, properties)` payloads for the single
//! caller-supplied callback. It renders nothing itself; popup content is the
//! caller's problem.

use core::fmt;

use serde_json::Map;
use serde_json::Value;

use crate::config::OverlayKind;
use crate::geojson::{Feature, LngLat};
use crate::surface::MapSurface;

/// A raw click forwarded by the host when a watched layer is hit.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickEvent {
    /// Id of the layer that was hit.
    pub layer_id: String,
    /// The pointer's map coordinate, when the surface provides one.
    pub point: Option<LngLat>,
    /// The feature under the pointer.
    pub feature: Feature,
}

/// The property payload handed to the click callback.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickProperties {
    /// Kind of the overlay the hit layer belongs to.
    pub kind: OverlayKind,
    /// The feature's property bag.
    pub properties: Map<String, Value>,
}

/// The caller's click sink.
pub type ClickCallback = Box<dyn FnMut(LngLat, ClickProperties)>;

/// Tracks click-watched layers and forwards extracted payloads.
#[derive(Default)]
pub struct ClickDispatcher {
    bound: Vec<String>,
    callback: Option<ClickCallback>,
}

impl fmt::Debug for ClickDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickDispatcher")
            .field("bound", &self.bound)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl ClickDispatcher {
    /// Creates a dispatcher with no bindings and no callback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the callback receiving every extracted click payload.
    pub fn set_callback(&mut self, callback: ClickCallback) {
        self.callback = Some(callback);
    }

    /// Layer ids currently watched, in binding order.
    #[must_use]
    pub fn bound_layers(&self) -> &[String] {
        &self.bound
    }

    /// Subscribes the given layers to hit testing.
    pub(crate) fn bind(&mut self, surface: &mut dyn MapSurface, layer_ids: &[String]) {
        for layer in layer_ids {
            if self.bound.iter().any(|b| b == layer) {
                continue;
            }
            if let Err(err) = surface.watch_clicks(layer) {
                tracing::warn!(layer = %layer, error = %err, "click subscription failed");
                continue;
            }
            self.bound.push(layer.clone());
        }
    }

    /// Removes subscriptions for the given layers; exact inverse of
    /// [`bind`](Self::bind).
    pub(crate) fn unbind(&mut self, surface: &mut dyn MapSurface, layer_ids: &[String]) {
        for layer in layer_ids {
            let Some(pos) = self.bound.iter().position(|b| b == layer) else {
                continue;
            };
            self.bound.remove(pos);
            if let Err(err) = surface.unwatch_clicks(layer) {
                tracing::debug!(layer = %layer, error = %err, "click unsubscribe failed");
            }
        }
    }

    /// Removes every subscription.
    pub(crate) fn unbind_all(&mut self, surface: &mut dyn MapSurface) {
        for layer in core::mem::take(&mut self.bound) {
            if let Err(err) = surface.unwatch_clicks(&layer) {
                tracing::debug!(layer = %layer, error = %err, "click unsubscribe failed");
            }
        }
    }

    /// Extracts a payload from a click on a watched layer and forwards it.
    ///
    /// The representative coordinate prefers the event's native pointer
    /// position and falls back to the first numeric coordinate pair found in
    /// the feature geometry. Clicks without any resolvable coordinate, on
    /// unwatched layers, or without an installed callback are dropped.
    pub(crate) fn dispatch(&mut self, event: ClickEvent, kind: OverlayKind) {
        if !self.bound.iter().any(|b| *b == event.layer_id) {
            tracing::trace!(layer = %event.layer_id, "click on unwatched layer dropped");
            return;
        }
        let Some(coordinate) = event.point.or_else(|| event.feature.first_position()) else {
            tracing::debug!(layer = %event.layer_id, "click without resolvable coordinate");
            return;
        };
        if let Some(callback) = &mut self.callback {
            callback(
                coordinate,
                ClickProperties {
                    kind,
                    properties: event.feature.properties,
                },
            );
        }
    }
}
