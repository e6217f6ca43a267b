// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for rendering surfaces.
//!
//! Stratum never talks to a concrete map engine directly. Everything it does
//! goes through [`MapSurface`], a thin mutation-and-query interface over the
//! surface's source/layer/image primitives. Production adapters wrap the real
//! rendering engine; tests drive the recording implementation from the
//! harness crate.
//!
//! The trait is deliberately dumb: no diffing, no tracking, no retries. All
//! policy (idempotence, failure isolation, ordering) lives above it in the
//! reconciler, so every implementation stays a mechanical translation layer.
//!
//! # Contract
//!
//! - Adding an existing id fails with the matching `*Exists` error rather
//!   than overwriting; callers decide whether the duplicate is benign.
//! - Removing an absent id fails with the matching `*Missing` error; after a
//!   style wipe this race is expected and suppressed by callers.
//! - `add_layer`/`move_layer` with `before: Some(id)` position the layer
//!   immediately below `id` in draw order; `None` means topmost.

use core::fmt;

use serde_json::{Map, Value};

use crate::error::SurfaceError;

/// How a source provides data to its layers.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceSpec {
    /// Raster tiles fetched from URL templates.
    RasterTiles {
        /// Slippy-map URL templates.
        tiles: Vec<String>,
        /// Tile edge length in pixels.
        tile_size: u32,
    },
    /// Vector tiles fetched from URL templates.
    VectorTiles {
        /// Slippy-map URL templates.
        tiles: Vec<String>,
    },
    /// An in-memory GeoJSON document.
    GeoJson {
        /// The feature collection as a JSON value.
        data: Value,
    },
}

/// Drawable layer categories understood by the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerType {
    /// Filled areas.
    Fill,
    /// Stroked outlines.
    Line,
    /// Fixed-radius circles at point features.
    Circle,
    /// Icon/text symbols at point features.
    Symbol,
    /// Raster imagery.
    Raster,
    /// Density heatmap.
    Heatmap,
}

/// A layer description handed to [`MapSurface::add_layer`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    /// Layer id, unique on the surface.
    pub id: String,
    /// Id of the source this layer draws from.
    pub source: String,
    /// Name of the layer inside a vector tile source, when applicable.
    pub source_layer: Option<String>,
    /// Drawable category.
    pub layer_type: LayerType,
    /// Paint properties (colors, opacities, ramps).
    pub paint: Map<String, Value>,
    /// Layout properties (visibility, icon bindings).
    pub layout: Map<String, Value>,
    /// Optional feature filter expression.
    pub filter: Option<Value>,
}

impl LayerSpec {
    /// Creates a layer spec with empty paint/layout and no filter.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_layer: None,
            layer_type,
            paint: Map::new(),
            layout: Map::new(),
            filter: None,
        }
    }

    /// Sets the vector-tile source layer.
    #[must_use]
    pub fn source_layer(mut self, name: impl Into<String>) -> Self {
        self.source_layer = Some(name.into());
        self
    }

    /// Adds a paint property.
    #[must_use]
    pub fn paint(mut self, name: impl Into<String>, value: Value) -> Self {
        self.paint.insert(name.into(), value);
        self
    }

    /// Adds a layout property.
    #[must_use]
    pub fn layout(mut self, name: impl Into<String>, value: Value) -> Self {
        self.layout.insert(name.into(), value);
        self
    }

    /// Sets the feature filter.
    #[must_use]
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// An RGBA bitmap registered with the surface under a name.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA bytes, row-major.
    pub pixels: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageData({}x{})", self.width, self.height)
    }
}

/// Mutation-and-query interface over a rendering surface.
///
/// All reconciler effects flow through one `&mut dyn MapSurface`, which makes
/// the session the single writer for its surface.
pub trait MapSurface {
    /// Registers a source.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::SourceExists`] when the id is taken, or
    /// [`SurfaceError::NotReady`] when no style is loaded.
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), SurfaceError>;

    /// Removes a source.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::SourceMissing`] when absent, or
    /// [`SurfaceError::SourceInUse`] while layers still reference it.
    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;

    /// Returns whether a source with this id is registered.
    fn has_source(&self, id: &str) -> bool;

    /// Adds a layer, optionally immediately below `before` in draw order.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::LayerExists`] when the id is taken or
    /// [`SurfaceError::SourceMissing`] when the spec references an absent
    /// source.
    fn add_layer(&mut self, spec: LayerSpec, before: Option<&str>) -> Result<(), SurfaceError>;

    /// Removes a layer.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::LayerMissing`] when absent.
    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;

    /// Returns whether a layer with this id is registered.
    fn has_layer(&self, id: &str) -> bool;

    /// Repositions an existing layer immediately below `before`, or topmost
    /// for `None`.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::LayerMissing`] when either layer is absent.
    fn move_layer(&mut self, id: &str, before: Option<&str>) -> Result<(), SurfaceError>;

    /// Registers a named bitmap for symbol layers to reference.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::ImageExists`] when the name is taken.
    fn add_image(&mut self, name: &str, image: ImageData) -> Result<(), SurfaceError>;

    /// Removes a named bitmap.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::ImageMissing`] when absent.
    fn remove_image(&mut self, name: &str) -> Result<(), SurfaceError>;

    /// Returns whether a bitmap with this name is registered.
    fn has_image(&self, name: &str) -> bool;

    /// Sets a layout property on an existing layer.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::LayerMissing`] when the layer is absent.
    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), SurfaceError>;

    /// Sets a paint property on an existing layer.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::LayerMissing`] when the layer is absent.
    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), SurfaceError>;

    /// Replaces the feature filter of an existing layer (`None` clears it).
    ///
    /// # Errors
    ///
    /// [`SurfaceError::LayerMissing`] when the layer is absent, or
    /// [`SurfaceError::InvalidFilter`] when the surface rejects the
    /// expression.
    fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<(), SurfaceError>;

    /// Subscribes the layer to pointer-click hit testing.
    ///
    /// Subscriptions are keyed by layer id and survive style reloads.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the in-memory harness never fails this.
    fn watch_clicks(&mut self, layer: &str) -> Result<(), SurfaceError>;

    /// Removes the layer's click subscription.
    ///
    /// # Errors
    ///
    /// Implementation-defined; absent subscriptions are not an error.
    fn unwatch_clicks(&mut self, layer: &str) -> Result<(), SurfaceError>;
}
