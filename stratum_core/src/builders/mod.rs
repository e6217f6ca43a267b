// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind overlay builders.
//!
//! Each kind module turns one config into surface resources and reports what
//! it created as a [`CreatedLayerSet`]. Builders are idempotent — existence
//! checks guard every add, and duplicate-registration races are suppressed —
//! so the same function serves initial creation and style-reload restore.
//!
//! [`build`] is the entry point for first-time creation: it produces any
//! prerequisite bitmaps (registering them before dependent symbol layers),
//! then ensures sources and layers. [`ensure`] is the image-free subset that
//! reload handlers re-run, after restoring their captured bitmaps.

mod annotation;
mod bitmap;
mod geojson;
mod heatmap;
mod raster;
mod vector;

pub use self::annotation::symbol_image_name;
pub use self::geojson::PIN_IMAGE;

use self::geojson::PaintProfile;

use crate::config::{LayerConfig, ThresholdRange};
use crate::error::{BuildError, SurfaceError};
use crate::reload::ReloadHandler;
use crate::state::OverlayState;
use crate::surface::{ImageData, LayerSpec, MapSurface, SourceSpec};

/// Pin head color for the shared GeoJSON point icon.
const PIN_COLOR: (u8, u8, u8) = (42, 109, 244);

/// The surface resources owned by one overlay config.
///
/// At most one set exists per config id at any time; every id in it is
/// namespaced by the config id. The set is mutated in place for visibility
/// and filter changes, and [`cleanup`](Self::cleanup) is called exactly once
/// before the overlay is recreated or removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreatedLayerSet {
    pub(crate) sources: Vec<String>,
    pub(crate) layers: Vec<String>,
    pub(crate) images: Vec<String>,
    pub(crate) interactive: Vec<String>,
    pub(crate) cleaned: bool,
}

impl CreatedLayerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Source ids owned by this overlay.
    #[must_use]
    pub fn source_ids(&self) -> &[String] {
        &self.sources
    }

    /// Layer ids owned by this overlay, in creation order.
    #[must_use]
    pub fn layer_ids(&self) -> &[String] {
        &self.layers
    }

    /// Image names owned exclusively by this overlay (shared bitmaps like
    /// the pin are session-owned and not listed).
    #[must_use]
    pub fn image_names(&self) -> &[String] {
        &self.images
    }

    /// Layer ids that are hit-test targets.
    #[must_use]
    pub fn interactive_layer_ids(&self) -> &[String] {
        &self.interactive
    }

    /// Whether [`cleanup`](Self::cleanup) already ran.
    #[must_use]
    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    /// Removes every owned resource from the surface. Idempotent.
    ///
    /// Layers go first (sources cannot be removed while referenced), then
    /// sources, then images. Absent resources are skipped quietly — a style
    /// wipe may already have taken them down.
    pub(crate) fn cleanup(&mut self, surface: &mut dyn MapSurface) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        for layer in &self.layers {
            match surface.remove_layer(layer) {
                Ok(()) => {}
                Err(err) if err.is_missing() => {}
                Err(err) => tracing::warn!(layer = %layer, error = %err, "layer removal failed"),
            }
        }
        for source in &self.sources {
            match surface.remove_source(source) {
                Ok(()) => {}
                Err(err) if err.is_missing() => {}
                Err(err) => tracing::warn!(source = %source, error = %err, "source removal failed"),
            }
        }
        for image in &self.images {
            match surface.remove_image(image) {
                Ok(()) => {}
                Err(err) if err.is_missing() => {}
                Err(err) => tracing::warn!(image = %image, error = %err, "image removal failed"),
            }
        }
    }
}

/// A freshly built overlay: its resource set plus the bitmaps a reload
/// handler must restore before re-ensuring layers.
#[derive(Debug)]
pub(crate) struct BuiltOverlay {
    pub(crate) set: CreatedLayerSet,
    pub(crate) images: Vec<(String, ImageData)>,
}

/// Session-scoped lazy cache of the shared pin bitmap.
#[derive(Debug, Default)]
pub(crate) struct PinCache {
    cached: Option<ImageData>,
}

impl PinCache {
    /// Returns the pin bitmap, rasterizing it on first use.
    pub(crate) fn get_or_build(&mut self) -> ImageData {
        self.cached
            .get_or_insert_with(|| bitmap::rasterize_pin(PIN_COLOR))
            .clone()
    }
}

/// Builds the resource set for a config, producing prerequisite bitmaps.
///
/// Returns `Ok(None)` when the config is missing required data (no
/// templates, empty feature list); that is not an error.
pub(crate) fn build(
    surface: &mut dyn MapSurface,
    cfg: &LayerConfig,
    threshold: ThresholdRange,
    visible: bool,
    pin: &mut PinCache,
) -> Result<Option<BuiltOverlay>, BuildError> {
    let mut images: Vec<(String, ImageData)> = Vec::new();

    match cfg {
        LayerConfig::GeoJson(c) => {
            build_pin_if_points(surface, &c.data, pin, &mut images)?;
        }
        LayerConfig::Drawing(c) => {
            build_pin_if_points(surface, &c.data, pin, &mut images)?;
        }
        LayerConfig::Annotation(c) => {
            if c.data.collection()?.features.is_empty() {
                return Ok(None);
            }
            if let Some(entry) = annotation::build_image(surface, &c.symbol)? {
                images.push(entry);
            }
        }
        LayerConfig::RasterTile(_)
        | LayerConfig::VectorTile(_)
        | LayerConfig::Heatmap(_)
        | LayerConfig::AnalysisRasterTile(_)
        | LayerConfig::AnalysisVectorTile(_) => {}
    }

    let set = ensure(surface, cfg, threshold, visible)?;
    Ok(set.map(|set| BuiltOverlay { set, images }))
}

/// Ensures sources and layers for a config exist; idempotent, image-free.
pub(crate) fn ensure(
    surface: &mut dyn MapSurface,
    cfg: &LayerConfig,
    threshold: ThresholdRange,
    visible: bool,
) -> Result<Option<CreatedLayerSet>, BuildError> {
    match cfg {
        LayerConfig::RasterTile(c) | LayerConfig::AnalysisRasterTile(c) => {
            raster::ensure(surface, c, visible)
        }
        LayerConfig::VectorTile(c) | LayerConfig::AnalysisVectorTile(c) => {
            vector::ensure(surface, c, threshold, visible)
        }
        LayerConfig::GeoJson(c) => geojson::ensure(
            surface,
            &c.id,
            &c.data,
            &c.color,
            PaintProfile::Standard,
            visible,
        ),
        LayerConfig::Drawing(c) => geojson::ensure(
            surface,
            &c.id,
            &c.data,
            &c.color,
            PaintProfile::Simplified,
            visible,
        ),
        LayerConfig::Heatmap(c) => heatmap::ensure(surface, c, visible),
        LayerConfig::Annotation(c) => annotation::ensure(surface, c, visible),
    }
}

/// Attempts to absorb a config change without recreating resources.
///
/// Only heatmaps support this today: ramp/radius changes become paint
/// updates. Everything else reports `false` and takes the
/// cleanup-and-recreate path.
pub(crate) fn try_update_in_place(
    surface: &mut dyn MapSurface,
    old: &LayerConfig,
    new: &LayerConfig,
) -> Result<bool, BuildError> {
    match (old, new) {
        (LayerConfig::Heatmap(o), LayerConfig::Heatmap(n)) => heatmap::try_update(surface, o, n),
        _ => Ok(false),
    }
}

/// Builds the style-reload restore handler for a built overlay.
///
/// The handler restores captured bitmaps first (symbol layers cannot
/// reference an image that is not registered), then re-ensures sources and
/// layers with the state table's current visibility and threshold. Existence
/// is re-checked throughout because a reload does not always remove
/// everything.
pub(crate) fn reload_handler(cfg: &LayerConfig, images: &[(String, ImageData)]) -> ReloadHandler {
    let cfg = cfg.clone();
    let images = images.to_vec();
    Box::new(move |surface: &mut dyn MapSurface, state: &OverlayState| {
        for (name, image) in &images {
            if surface.has_image(name) {
                continue;
            }
            match surface.add_image(name, image.clone()) {
                Ok(()) => {}
                Err(err) if err.is_duplicate() => {}
                Err(err) => tracing::warn!(image = %name, error = %err, "bitmap restore failed"),
            }
        }
        let threshold = state.threshold_for(cfg.id());
        let visible = state.visibility_for(cfg.id());
        if let Err(err) = ensure(surface, &cfg, threshold, visible) {
            tracing::warn!(overlay = cfg.id(), error = %err, "reload restore failed");
        }
    })
}

/// Registers the shared pin bitmap when the payload contains point features.
fn build_pin_if_points(
    surface: &mut dyn MapSurface,
    data: &crate::geojson::GeoJsonData,
    pin: &mut PinCache,
    images: &mut Vec<(String, ImageData)>,
) -> Result<(), BuildError> {
    let collection = data.collection()?;
    let (points, _) = collection.split_points();
    if points.features.is_empty() {
        return Ok(());
    }
    let image = pin.get_or_build();
    add_image_idempotent(surface, PIN_IMAGE, image.clone())?;
    images.push((PIN_IMAGE.to_owned(), image));
    Ok(())
}

/// Adds a source unless it already exists; duplicate races are benign.
pub(crate) fn add_source_idempotent(
    surface: &mut dyn MapSurface,
    id: &str,
    spec: SourceSpec,
) -> Result<(), SurfaceError> {
    if surface.has_source(id) {
        return Ok(());
    }
    match surface.add_source(id, spec) {
        Err(err) if err.is_duplicate() => Ok(()),
        other => other,
    }
}

/// Adds a layer unless it already exists; duplicate races are benign.
pub(crate) fn add_layer_idempotent(
    surface: &mut dyn MapSurface,
    spec: LayerSpec,
    before: Option<&str>,
) -> Result<(), SurfaceError> {
    if surface.has_layer(&spec.id) {
        return Ok(());
    }
    match surface.add_layer(spec, before) {
        Err(err) if err.is_duplicate() => Ok(()),
        other => other,
    }
}

/// Registers an image unless it already exists; duplicate races are benign.
pub(crate) fn add_image_idempotent(
    surface: &mut dyn MapSurface,
    name: &str,
    image: ImageData,
) -> Result<(), SurfaceError> {
    if surface.has_image(name) {
        return Ok(());
    }
    match surface.add_image(name, image) {
        Err(err) if err.is_duplicate() => Ok(()),
        other => other,
    }
}
