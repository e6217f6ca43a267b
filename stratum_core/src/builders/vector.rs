// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector tile overlays.
//!
//! The sub-layer shape depends on the asset classification:
//!
//! - [`AssetClass::General`] — fill + line with flat colors.
//! - [`AssetClass::PointChange`] — a single circle layer.
//! - [`AssetClass::DamagePolygon`] — fill + line where the fill color is the
//!   discrete damage-severity ramp with the flat color as fallback.
//!
//! Every sub-layer carries the confidence window filter from the current
//! threshold, and all of them are hit-test targets.

use serde_json::json;

use crate::builders::{CreatedLayerSet, add_layer_idempotent, add_source_idempotent};
use crate::config::{AssetClass, ThresholdRange, VectorTileConfig};
use crate::error::BuildError;
use crate::expression::{confidence_filter, damage_color};
use crate::order::ANCHOR_LAYER;
use crate::state::visibility_value;
use crate::surface::{LayerSpec, LayerType, MapSurface, SourceSpec};

/// Ensures the vector source and classification-shaped layers exist.
pub(crate) fn ensure(
    surface: &mut dyn MapSurface,
    cfg: &VectorTileConfig,
    threshold: ThresholdRange,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    if cfg.templates.is_empty() {
        return Ok(None);
    }

    let source_id = format!("{}-source", cfg.id);
    add_source_idempotent(
        surface,
        &source_id,
        SourceSpec::VectorTiles {
            tiles: cfg.templates.clone(),
        },
    )?;

    let mut set = CreatedLayerSet::new();
    set.sources.push(source_id.clone());

    let base = |id: String, ty: LayerType| {
        LayerSpec::new(id, &source_id, ty)
            .source_layer(&cfg.source_layer)
            .layout("visibility", visibility_value(visible))
            .filter(confidence_filter(threshold))
    };

    match cfg.asset_class {
        AssetClass::PointChange => {
            // Change-detection points carry the severity ramp too; features
            // without the property fall back to the flat color at runtime.
            let point = base(format!("{}-point", cfg.id), LayerType::Circle)
                .paint("circle-color", damage_color(&cfg.fill_color))
                .paint("circle-radius", json!(5.0))
                .paint("circle-stroke-width", json!(1.0))
                .paint("circle-stroke-color", json!(cfg.line_color));
            add_layer_idempotent(surface, point, Some(ANCHOR_LAYER))?;
            set.layers.push(format!("{}-point", cfg.id));
        }
        AssetClass::General | AssetClass::DamagePolygon => {
            let fill_color = match cfg.asset_class {
                AssetClass::DamagePolygon => damage_color(&cfg.fill_color),
                _ => json!(cfg.fill_color),
            };
            let fill = base(format!("{}-fill", cfg.id), LayerType::Fill)
                .paint("fill-color", fill_color)
                .paint("fill-opacity", json!(0.4));
            add_layer_idempotent(surface, fill, Some(ANCHOR_LAYER))?;
            set.layers.push(format!("{}-fill", cfg.id));

            let line = base(format!("{}-line", cfg.id), LayerType::Line)
                .paint("line-color", json!(cfg.line_color))
                .paint("line-width", json!(2.0));
            add_layer_idempotent(surface, line, Some(ANCHOR_LAYER))?;
            set.layers.push(format!("{}-line", cfg.id));
        }
    }

    set.interactive = set.layers.clone();
    Ok(Some(set))
}
