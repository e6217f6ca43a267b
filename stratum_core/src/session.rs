// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The session: one owner per rendering surface.
//!
//! [`MapLayerSession`] owns every piece of reconciliation state — the
//! registry, the visibility/threshold side table, the reload-handler
//! registry, the click dispatcher, the ordering snapshot, and the pin cache.
//! Construct it when a map mounts and call [`cleanup`](MapLayerSession::cleanup)
//! on unmount; there is no global state anywhere.
//!
//! All mutations flow through `&mut self` methods against one
//! `&mut dyn MapSurface`, making the session the single writer for its
//! surface. Sharing one surface between two sessions is unsupported.
//!
//! Per-overlay lifecycle: not created → created → updated in place
//! (visibility/filter/ramp, self-loop) → recreated on content change →
//! removed when the id leaves the desired set.

use serde_json::json;

use crate::builders::{PIN_IMAGE, PinCache};
use crate::click::{ClickCallback, ClickDispatcher, ClickEvent};
use crate::config::{LayerConfig, ThresholdRange};
use crate::order::{ANCHOR_LAYER, ANCHOR_SOURCE, LayerOrdering};
use crate::registry::{LayerRegistry, ReconcileOutcome};
use crate::reload::ReloadRegistry;
use crate::state::{OverlayState, apply_threshold, apply_visibility};
use crate::surface::{LayerSpec, LayerType, MapSurface, SourceSpec};

/// Session-scoped owner of all overlay reconciliation state for one surface.
#[derive(Debug, Default)]
pub struct MapLayerSession {
    registry: LayerRegistry,
    state: OverlayState,
    reload: ReloadRegistry,
    clicks: ClickDispatcher,
    ordering: LayerOrdering,
    pin: PinCache,
}

impl MapLayerSession {
    /// Creates a session with nothing tracked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the desired overlay configs against the surface.
    ///
    /// Creates, updates, recreates, and removes per-overlay resources as
    /// needed, then replays z-ordering (skipped when neither the order nor
    /// the structure changed). Builder failures are logged and skipped; this
    /// method never fails.
    pub fn reconcile(
        &mut self,
        surface: &mut dyn MapSurface,
        desired: &[LayerConfig],
    ) -> ReconcileOutcome {
        ensure_anchor(surface);
        let outcome = self.registry.reconcile(
            surface,
            desired,
            &self.state,
            &mut self.reload,
            &mut self.clicks,
            &mut self.pin,
        );
        let moves = self.ordering.apply(
            surface,
            &self.registry.layer_groups(),
            outcome.structural_change(),
        );
        tracing::debug!(
            created = outcome.created,
            updated = outcome.updated,
            recreated = outcome.recreated,
            removed = outcome.removed,
            skipped = outcome.skipped,
            moves,
            "reconcile pass finished"
        );
        outcome
    }

    /// Records and applies the desired visibility for an overlay.
    ///
    /// A no-op on the surface when the overlay has no layers right now; the
    /// recorded state is applied when they (re)appear.
    pub fn set_visibility(&mut self, surface: &mut dyn MapSurface, id: &str, visible: bool) {
        self.state.set_visibility(id, visible);
        if let Some(entry) = self.registry.get(id) {
            apply_visibility(surface, entry.set.layer_ids(), visible);
        }
    }

    /// Records and applies the confidence threshold for an overlay.
    ///
    /// Only fill/line/point sub-layers receive the rebuilt filter; symbol
    /// and heatmap layers are left untouched.
    pub fn set_threshold(&mut self, surface: &mut dyn MapSurface, id: &str, range: ThresholdRange) {
        self.state.set_threshold(id, range);
        if let Some(entry) = self.registry.get(id) {
            apply_threshold(surface, id, entry.set.layer_ids(), range);
        }
    }

    /// Installs the single callback receiving `(coordinate, properties)` for
    /// every feature click on an interactive layer.
    pub fn set_click_callback(&mut self, callback: ClickCallback) {
        self.clicks.set_callback(callback);
    }

    /// Forwards a raw click from the host.
    ///
    /// Resolves the owning overlay's kind for the payload tag; clicks on
    /// layers this session does not track are dropped.
    pub fn dispatch_click(&mut self, event: ClickEvent) {
        let Some(kind) = self.registry.kind_of_layer(&event.layer_id) else {
            tracing::trace!(layer = %event.layer_id, "click on untracked layer dropped");
            return;
        };
        self.clicks.dispatch(event, kind);
    }

    /// Rebuilds session-owned state after the surface reloaded its style.
    ///
    /// Replays every registered restore handler (bitmaps first, then sources
    /// and layers), re-applies the recorded visibility and threshold for
    /// every tracked overlay, and forces an ordering replay. Safe to call
    /// when the wipe was partial: handlers re-check existence throughout.
    pub fn handle_style_reload(&mut self, surface: &mut dyn MapSurface) {
        tracing::debug!(handlers = self.reload.len(), "style reload, restoring overlays");
        ensure_anchor(surface);
        self.reload.replay(surface, &self.state);
        for entry in self.registry.entries() {
            let id = entry.config.id();
            apply_visibility(surface, entry.set.layer_ids(), self.state.visibility_for(id));
            apply_threshold(
                surface,
                id,
                entry.set.layer_ids(),
                self.state.threshold_for(id),
            );
        }
        self.ordering
            .apply(surface, &self.registry.layer_groups(), true);
    }

    /// Tears down everything this session created, including the anchor and
    /// the shared pin bitmap, and forgets all recorded state.
    pub fn cleanup(&mut self, surface: &mut dyn MapSurface) {
        let removed = self
            .registry
            .clear(surface, &mut self.reload, &mut self.clicks);
        self.clicks.unbind_all(surface);
        self.reload.clear();
        self.state.clear();
        self.ordering.reset();

        if surface.has_layer(ANCHOR_LAYER) {
            if let Err(err) = surface.remove_layer(ANCHOR_LAYER) {
                tracing::debug!(error = %err, "anchor layer removal failed");
            }
        }
        if surface.has_source(ANCHOR_SOURCE) {
            if let Err(err) = surface.remove_source(ANCHOR_SOURCE) {
                tracing::debug!(error = %err, "anchor source removal failed");
            }
        }
        if surface.has_image(PIN_IMAGE) {
            if let Err(err) = surface.remove_image(PIN_IMAGE) {
                tracing::debug!(error = %err, "pin bitmap removal failed");
            }
        }
        tracing::debug!(removed, "session cleaned up");
    }

    /// Tracked overlay ids in stacking order.
    #[must_use]
    pub fn tracked_ids(&self) -> Vec<&str> {
        self.registry.tracked_ids()
    }

    /// Whether the session tracks no overlays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Creates the fixed anchor layer (and its empty source) if absent.
///
/// Every managed layer is inserted immediately below this anchor, so the
/// top-most slot on the surface stays reserved for overlays owned outside
/// this system.
fn ensure_anchor(surface: &mut dyn MapSurface) {
    if !surface.has_source(ANCHOR_SOURCE) {
        let spec = SourceSpec::GeoJson {
            data: json!({"type": "FeatureCollection", "features": []}),
        };
        match surface.add_source(ANCHOR_SOURCE, spec) {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {}
            Err(err) => tracing::warn!(error = %err, "anchor source creation failed"),
        }
    }
    if !surface.has_layer(ANCHOR_LAYER) {
        let spec = LayerSpec::new(ANCHOR_LAYER, ANCHOR_SOURCE, LayerType::Line);
        match surface.add_layer(spec, None) {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {}
            Err(err) => tracing::warn!(error = %err, "anchor layer creation failed"),
        }
    }
}
