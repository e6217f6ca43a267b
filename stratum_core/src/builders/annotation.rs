// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Symbol annotation overlays.
//!
//! The symbol definition is rasterized into a badge bitmap registered under a
//! name derived from the sanitized symbol code; the symbol layer can only
//! reference the image after registration, so the bitmap always goes in
//! first. Labels render as the layer's text field next to the badge.
//!
//! Any label or size change alters the config hash, so the registry tears the
//! overlay down (removing the old bitmap with it) and rebuilds, regenerating
//! the bitmap. [`build_image`] also defensively replaces a stale image under
//! the same name, which covers a symbol code reused across overlays with
//! different parameters.

use serde_json::json;

use crate::builders::{CreatedLayerSet, add_layer_idempotent, add_source_idempotent, bitmap};
use crate::config::{AnnotationConfig, SymbolSpec};
use crate::error::BuildError;
use crate::expression::parse_hex_color;
use crate::order::ANCHOR_LAYER;
use crate::state::visibility_value;
use crate::surface::{ImageData, LayerSpec, LayerType, MapSurface, SourceSpec};

/// Returns the registered image name for a symbol code, or `None` when the
/// code sanitizes to nothing.
#[must_use]
pub fn symbol_image_name(code: &str) -> Option<String> {
    let sanitized = sanitize_code(code);
    if sanitized.is_empty() {
        None
    } else {
        Some(format!("stratum-symbol-{sanitized}"))
    }
}

/// Lowercases the code and collapses every non-alphanumeric run to a single
/// dash, trimming dashes at both ends.
fn sanitize_code(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for ch in code.chars() {
        if ch.is_ascii_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_owned()
}

/// Rasterizes the symbol badge and registers it, replacing a stale image
/// under the same name.
pub(crate) fn build_image(
    surface: &mut dyn MapSurface,
    symbol: &SymbolSpec,
) -> Result<Option<(String, ImageData)>, BuildError> {
    let Some(name) = symbol_image_name(&symbol.code) else {
        return Ok(None);
    };
    let color = parse_hex_color(&symbol.color)
        .ok_or_else(|| BuildError::Bitmap(format!("bad symbol color '{}'", symbol.color)))?;
    let image = bitmap::rasterize_badge(symbol.size, color);

    if surface.has_image(&name) {
        match surface.remove_image(&name) {
            Ok(()) => {}
            Err(err) if err.is_missing() => {}
            Err(err) => return Err(err.into()),
        }
    }
    match surface.add_image(&name, image.clone()) {
        Ok(()) => {}
        Err(err) if err.is_duplicate() => {}
        Err(err) => return Err(err.into()),
    }
    Ok(Some((name, image)))
}

/// Ensures the annotation source and symbol layer exist.
///
/// Assumes the badge bitmap is already registered (by
/// [`build`](crate::builders::build) initially, by the reload handler's image
/// restore afterwards).
pub(crate) fn ensure(
    surface: &mut dyn MapSurface,
    cfg: &AnnotationConfig,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    let collection = cfg.data.collection()?;
    if collection.features.is_empty() {
        return Ok(None);
    }
    let Some(image_name) = symbol_image_name(&cfg.symbol.code) else {
        return Ok(None);
    };

    let source_id = format!("{}-source", cfg.id);
    add_source_idempotent(
        surface,
        &source_id,
        SourceSpec::GeoJson {
            data: collection.to_source_value(),
        },
    )?;

    let layer_id = format!("{}-symbol", cfg.id);
    let layer = LayerSpec::new(&layer_id, &source_id, LayerType::Symbol)
        .layout("icon-image", json!(image_name.clone()))
        .layout("icon-allow-overlap", json!(true))
        .layout("text-field", json!(cfg.symbol.label))
        .layout("text-size", json!(12.0))
        .layout("text-offset", json!([0.0, 1.4]))
        .layout("visibility", visibility_value(visible))
        .paint("text-color", json!(cfg.symbol.color));
    add_layer_idempotent(surface, layer, Some(ANCHOR_LAYER))?;

    let mut set = CreatedLayerSet::new();
    set.sources.push(source_id);
    set.layers.push(layer_id.clone());
    set.images.push(image_name);
    set.interactive.push(layer_id);
    Ok(Some(set))
}
