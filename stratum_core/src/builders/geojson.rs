// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Embedded GeoJSON overlays.
//!
//! Point features split off into a dedicated icon source and symbol layer
//! referencing the shared pin bitmap; polygon and line features become a
//! fill/line pair. The drawing variant uses the simplified paint profile:
//! translucent fill and no outline tint (no line layer at all).
//!
//! The pin bitmap is rasterized lazily once per session and cached; adding
//! it to the surface tolerates the duplicate-registration race, since other
//! overlays (or another pass) may have registered it first.

use serde_json::json;

use crate::builders::{CreatedLayerSet, add_layer_idempotent, add_source_idempotent};
use crate::error::BuildError;
use crate::geojson::{FeatureCollection, GeoJsonData};
use crate::order::ANCHOR_LAYER;
use crate::state::visibility_value;
use crate::surface::{LayerSpec, LayerType, MapSurface, SourceSpec};

/// Name of the shared pin bitmap used by GeoJSON point icons.
pub const PIN_IMAGE: &str = "stratum-pin";

/// Paint profile for a GeoJSON overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PaintProfile {
    /// Fill at moderate opacity plus a tinted outline.
    Standard,
    /// Translucent fill only; no outline tint.
    Simplified,
}

/// Ensures sources and layers for a parsed feature collection.
///
/// Returns `None` when the collection has no features. The pin bitmap is not
/// registered here; [`build`](crate::builders::build) does that once before
/// delegating, and reload handlers restore it before re-running this.
pub(crate) fn ensure_collection(
    surface: &mut dyn MapSurface,
    id: &str,
    collection: &FeatureCollection,
    color: &str,
    profile: PaintProfile,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    if collection.features.is_empty() {
        return Ok(None);
    }

    let (points, shapes) = collection.split_points();
    let mut set = CreatedLayerSet::new();

    if !shapes.features.is_empty() {
        let source_id = format!("{id}-source");
        add_source_idempotent(
            surface,
            &source_id,
            SourceSpec::GeoJson {
                data: shapes.to_source_value(),
            },
        )?;
        set.sources.push(source_id.clone());

        let fill_opacity = match profile {
            PaintProfile::Standard => 0.4,
            PaintProfile::Simplified => 0.25,
        };
        let fill = LayerSpec::new(format!("{id}-fill"), &source_id, LayerType::Fill)
            .paint("fill-color", json!(color))
            .paint("fill-opacity", json!(fill_opacity))
            .layout("visibility", visibility_value(visible));
        add_layer_idempotent(surface, fill, Some(ANCHOR_LAYER))?;
        set.layers.push(format!("{id}-fill"));

        if profile == PaintProfile::Standard {
            let line = LayerSpec::new(format!("{id}-line"), &source_id, LayerType::Line)
                .paint("line-color", json!(color))
                .paint("line-width", json!(2.0))
                .layout("visibility", visibility_value(visible));
            add_layer_idempotent(surface, line, Some(ANCHOR_LAYER))?;
            set.layers.push(format!("{id}-line"));
        }
    }

    if !points.features.is_empty() {
        let icon_source = format!("{id}-icon-source");
        add_source_idempotent(
            surface,
            &icon_source,
            SourceSpec::GeoJson {
                data: points.to_source_value(),
            },
        )?;
        set.sources.push(icon_source.clone());

        let icon = LayerSpec::new(format!("{id}-icon"), &icon_source, LayerType::Symbol)
            .layout("icon-image", json!(PIN_IMAGE))
            .layout("icon-size", json!(1.0))
            .layout("icon-allow-overlap", json!(true))
            .layout("icon-anchor", json!("bottom"))
            .layout("visibility", visibility_value(visible));
        add_layer_idempotent(surface, icon, Some(ANCHOR_LAYER))?;
        set.layers.push(format!("{id}-icon"));
    }

    set.interactive = set.layers.clone();
    Ok(Some(set))
}

/// Parses the payload and ensures its resources.
pub(crate) fn ensure(
    surface: &mut dyn MapSurface,
    id: &str,
    data: &GeoJsonData,
    color: &str,
    profile: PaintProfile,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    let collection = data.collection()?;
    ensure_collection(surface, id, &collection, color, profile, visible)
}
