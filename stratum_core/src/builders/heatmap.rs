// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Density heatmap overlays.
//!
//! Keyed by the `{id}-heat` layer and `{id}-src` source pair. A ramp-only
//! config change updates the paint in place; a template change forces the
//! registry down the cleanup-and-recreate path, because the surface does not
//! allow mutating an existing tile source's template.

use serde_json::json;

use crate::builders::{CreatedLayerSet, add_layer_idempotent, add_source_idempotent};
use crate::config::HeatmapConfig;
use crate::error::BuildError;
use crate::expression::heat_ramp;
use crate::order::ANCHOR_LAYER;
use crate::state::visibility_value;
use crate::surface::{LayerSpec, LayerType, MapSurface, SourceSpec};

/// Ensures the heatmap source and layer exist; idempotent.
pub(crate) fn ensure(
    surface: &mut dyn MapSurface,
    cfg: &HeatmapConfig,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    if cfg.template.is_empty() {
        return Ok(None);
    }

    let source_id = format!("{}-src", cfg.id);
    let layer_id = format!("{}-heat", cfg.id);

    add_source_idempotent(
        surface,
        &source_id,
        SourceSpec::VectorTiles {
            tiles: vec![cfg.template.clone()],
        },
    )?;

    let layer = LayerSpec::new(&layer_id, &source_id, LayerType::Heatmap)
        .source_layer(&cfg.source_layer)
        .paint("heatmap-color", heat_ramp(&cfg.ramp))
        .paint("heatmap-radius", json!(cfg.radius))
        .layout("visibility", visibility_value(visible));
    add_layer_idempotent(surface, layer, Some(ANCHOR_LAYER))?;

    let mut set = CreatedLayerSet::new();
    set.sources.push(source_id);
    set.layers.push(layer_id);
    Ok(Some(set))
}

/// Attempts an in-place update from `old` to `new`.
///
/// Returns `Ok(false)` when the tile template (or its source layer) changed,
/// signalling the registry to recreate instead. Ramp and radius changes are
/// applied as paint updates without touching the source.
pub(crate) fn try_update(
    surface: &mut dyn MapSurface,
    old: &HeatmapConfig,
    new: &HeatmapConfig,
) -> Result<bool, BuildError> {
    if old.template != new.template || old.source_layer != new.source_layer {
        return Ok(false);
    }

    let layer_id = format!("{}-heat", new.id);
    if !surface.has_layer(&layer_id) {
        return Ok(false);
    }
    if old.ramp != new.ramp {
        surface.set_paint_property(&layer_id, "heatmap-color", heat_ramp(&new.ramp))?;
    }
    if old.radius != new.radius {
        surface.set_paint_property(&layer_id, "heatmap-radius", json!(new.radius))?;
    }
    Ok(true)
}
