// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster tile overlays.
//!
//! One raster source from one or more URL templates plus a single raster
//! layer carrying the bare config id. Band and colormap selectors are
//! rewritten into each template's query string, preserving whatever
//! parameters the template already carries.

use crate::builders::{CreatedLayerSet, add_layer_idempotent, add_source_idempotent};
use crate::config::RasterTileConfig;
use crate::error::BuildError;
use crate::order::ANCHOR_LAYER;
use crate::state::visibility_value;
use crate::surface::{LayerSpec, LayerType, MapSurface, SourceSpec};

/// Ensures the raster source and layer exist; idempotent.
///
/// When both already exist only the visibility flag is re-applied, so
/// re-running the builder for an unchanged config is cheap and safe.
pub(crate) fn ensure(
    surface: &mut dyn MapSurface,
    cfg: &RasterTileConfig,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    if cfg.templates.is_empty() {
        return Ok(None);
    }

    let source_id = format!("{}-source", cfg.id);
    let mut set = CreatedLayerSet::new();
    set.sources.push(source_id.clone());
    set.layers.push(cfg.id.clone());

    if surface.has_source(&source_id) && surface.has_layer(&cfg.id) {
        surface.set_layout_property(&cfg.id, "visibility", visibility_value(visible))?;
        return Ok(Some(set));
    }

    let tiles: Vec<String> = cfg
        .templates
        .iter()
        .map(|t| rewrite_template(t, cfg.band.as_deref(), cfg.colormap.as_deref()))
        .collect();
    add_source_idempotent(
        surface,
        &source_id,
        SourceSpec::RasterTiles {
            tiles,
            tile_size: cfg.tile_size,
        },
    )?;

    let layer = LayerSpec::new(&cfg.id, &source_id, LayerType::Raster)
        .layout("visibility", visibility_value(visible));
    add_layer_idempotent(surface, layer, Some(ANCHOR_LAYER))?;

    Ok(Some(set))
}

/// Rewrites band/colormap selectors into a template's query string.
///
/// Existing occurrences of the keys are replaced in place; other parameters
/// and the `{z}/{x}/{y}` placeholders pass through untouched.
pub(crate) fn rewrite_template(
    template: &str,
    band: Option<&str>,
    colormap: Option<&str>,
) -> String {
    if band.is_none() && colormap.is_none() {
        return template.to_owned();
    }

    let (base, query) = match template.split_once('?') {
        Some((base, query)) => (base, query),
        None => (template, ""),
    };
    let mut pairs: Vec<(String, String)> = query
        .split('&')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_owned(), v.to_owned()),
            None => (kv.to_owned(), String::new()),
        })
        .collect();

    for (key, value) in [("band", band), ("colormap", colormap)] {
        let Some(value) = value else { continue };
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value.to_owned(),
            None => pairs.push((key.to_owned(), value.to_owned())),
        }
    }

    let query = pairs
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{k}={v}")
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}
