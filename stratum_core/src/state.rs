// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Desired visibility and threshold state, independent of created resources.
//!
//! The side table outlives the layers it describes: entries are written when
//! the caller asks for a visibility or threshold change and read back
//! whenever layers are (re)built — after a hash-triggered recreate or a style
//! wipe — so the surface always converges on the last-requested state even
//! when the request arrived while the layer was absent.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::config::ThresholdRange;
use crate::error::SurfaceError;
use crate::expression::confidence_filter;
use crate::surface::MapSurface;

/// Layer-id suffixes that carry the confidence filter.
///
/// Threshold changes touch only fill/line/point sub-layers; symbol, icon,
/// raster, and heatmap layers are left alone.
pub const FILTERED_SUFFIXES: [&str; 3] = ["fill", "line", "point"];

/// Returns the `visibility` layout value for a flag.
#[must_use]
pub fn visibility_value(visible: bool) -> Value {
    if visible { json!("visible") } else { json!("none") }
}

/// Desired per-overlay visibility and threshold state.
#[derive(Debug, Default)]
pub struct OverlayState {
    visibility: BTreeMap<String, bool>,
    thresholds: BTreeMap<String, ThresholdRange>,
}

impl OverlayState {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the desired visibility for an overlay (default visible).
    #[must_use]
    pub fn visibility_for(&self, id: &str) -> bool {
        self.visibility.get(id).copied().unwrap_or(true)
    }

    /// Returns the desired threshold for an overlay (default full range).
    #[must_use]
    pub fn threshold_for(&self, id: &str) -> ThresholdRange {
        self.thresholds.get(id).copied().unwrap_or_default()
    }

    /// Records the desired visibility for an overlay.
    pub fn set_visibility(&mut self, id: &str, visible: bool) {
        self.visibility.insert(id.to_owned(), visible);
    }

    /// Records the desired threshold for an overlay.
    pub fn set_threshold(&mut self, id: &str, range: ThresholdRange) {
        self.thresholds.insert(id.to_owned(), range);
    }

    /// Drops all recorded state.
    pub fn clear(&mut self) {
        self.visibility.clear();
        self.thresholds.clear();
    }
}

/// Applies a visibility flag to every listed layer.
///
/// Absent layers are skipped without error: a later reload-handler pass will
/// restore them with the recorded state.
pub(crate) fn apply_visibility(surface: &mut dyn MapSurface, layer_ids: &[String], visible: bool) {
    for layer in layer_ids {
        if !surface.has_layer(layer) {
            continue;
        }
        if let Err(err) = surface.set_layout_property(layer, "visibility", visibility_value(visible))
        {
            tracing::debug!(layer = %layer, error = %err, "visibility flip failed");
        }
    }
}

/// Applies the confidence filter to the overlay's filtered sub-layers.
///
/// Only layers named `{overlay_id}-{suffix}` for a [`FILTERED_SUFFIXES`]
/// suffix are touched, so overlay ids containing `-fill` themselves cannot
/// be confused with a sub-layer of another overlay.
pub(crate) fn apply_threshold(
    surface: &mut dyn MapSurface,
    overlay_id: &str,
    layer_ids: &[String],
    range: ThresholdRange,
) {
    for layer in layer_ids {
        if !is_filtered_layer(overlay_id, layer) || !surface.has_layer(layer) {
            continue;
        }
        match surface.set_filter(layer, Some(confidence_filter(range))) {
            Ok(()) => {}
            Err(SurfaceError::LayerMissing(_)) => {}
            Err(err) => tracing::warn!(layer = %layer, error = %err, "filter update rejected"),
        }
    }
}

/// Returns whether `layer_id` is a filtered sub-layer of `overlay_id`.
pub(crate) fn is_filtered_layer(overlay_id: &str, layer_id: &str) -> bool {
    layer_id
        .strip_prefix(overlay_id)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|suffix| FILTERED_SUFFIXES.contains(&suffix))
}
