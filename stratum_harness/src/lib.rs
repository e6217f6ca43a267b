// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording in-memory rendering surface for reconciler tests and demos.
//!
//! [`RecordingSurface`] implements
//! [`MapSurface`](stratum_core::surface::MapSurface) over plain vectors and
//! maps, records every mutation as a [`Mutation`] value for later assertion,
//! and can simulate the two external events the reconciler must survive:
//! full or partial style wipes and pointer clicks.
//!
//! Divergence from strict engine behavior: `add_layer`/`move_layer` with an
//! absent `before` target fall back to topmost placement instead of failing,
//! because isolated builder tests run without the session's anchor layer.
//! Everything else (duplicate ids, missing targets, in-use sources) fails
//! with the typed errors real adapters produce.

mod eval;

pub use eval::{evaluate, evaluate_filter};

use std::collections::BTreeMap;

use stratum_core::error::SurfaceError;
use stratum_core::surface::{ImageData, LayerSpec, MapSurface, SourceSpec};

/// One recorded surface mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// A source was added.
    AddSource {
        /// Source id.
        id: String,
    },
    /// A source was removed.
    RemoveSource {
        /// Source id.
        id: String,
    },
    /// A layer was added.
    AddLayer {
        /// Layer id.
        id: String,
        /// Requested insertion target.
        before: Option<String>,
    },
    /// A layer was removed.
    RemoveLayer {
        /// Layer id.
        id: String,
    },
    /// A layer was repositioned.
    MoveLayer {
        /// Layer id.
        id: String,
        /// Requested insertion target.
        before: Option<String>,
    },
    /// An image was registered.
    AddImage {
        /// Image name.
        name: String,
    },
    /// An image was removed.
    RemoveImage {
        /// Image name.
        name: String,
    },
    /// A layout property was set.
    SetLayout {
        /// Layer id.
        layer: String,
        /// Property name.
        name: String,
    },
    /// A paint property was set.
    SetPaint {
        /// Layer id.
        layer: String,
        /// Property name.
        name: String,
    },
    /// A filter was replaced.
    SetFilter {
        /// Layer id.
        layer: String,
    },
    /// A click subscription was added.
    WatchClicks {
        /// Layer id.
        layer: String,
    },
    /// A click subscription was removed.
    UnwatchClicks {
        /// Layer id.
        layer: String,
    },
}

/// An in-memory [`MapSurface`] with a full mutation log.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    sources: Vec<(String, SourceSpec)>,
    layers: Vec<LayerSpec>,
    images: BTreeMap<String, ImageData>,
    watched: Vec<String>,
    log: Vec<Mutation>,
    poisoned: Vec<String>,
}

impl RecordingSurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `add_source`/`add_layer` whose id contains `fragment`
    /// fail with [`SurfaceError::NotReady`], for failure-isolation tests.
    pub fn fail_adds_containing(&mut self, fragment: &str) {
        self.poisoned.push(fragment.to_owned());
    }

    /// The recorded mutations in call order.
    #[must_use]
    pub fn log(&self) -> &[Mutation] {
        &self.log
    }

    /// Clears the mutation log, keeping the surface state.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Counts recorded mutations matching a predicate.
    #[must_use]
    pub fn count(&self, pred: impl Fn(&Mutation) -> bool) -> usize {
        self.log.iter().filter(|m| pred(m)).count()
    }

    /// Layer ids in draw order, bottom to top.
    #[must_use]
    pub fn layer_order(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    /// The current spec of a layer, including applied property mutations.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// The spec a source was registered with.
    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources
            .iter()
            .find(|(sid, _)| sid == id)
            .map(|(_, spec)| spec)
    }

    /// Registered image names in sorted order.
    #[must_use]
    pub fn image_names(&self) -> Vec<&str> {
        self.images.keys().map(String::as_str).collect()
    }

    /// Layer ids with live click subscriptions, in subscription order.
    #[must_use]
    pub fn watched(&self) -> &[String] {
        &self.watched
    }

    /// Total number of registered sources and layers.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.sources.len() + self.layers.len()
    }

    /// Simulates a style reload: every source, layer, and image is destroyed.
    ///
    /// Click subscriptions are keyed by layer id and survive, matching real
    /// engine behavior. The wipe itself is an external event and is not
    /// recorded in the mutation log.
    pub fn wipe_style(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.images.clear();
    }

    /// Simulates a partial wipe that leaves the named layers (and the
    /// sources they reference) standing, for reload-ordering edge cases.
    pub fn wipe_style_except(&mut self, surviving_layers: &[&str]) {
        self.layers.retain(|l| surviving_layers.contains(&l.id.as_str()));
        let referenced: Vec<String> = self.layers.iter().map(|l| l.source.clone()).collect();
        self.sources.retain(|(id, _)| referenced.contains(id));
        self.images.clear();
    }

    fn is_poisoned(&self, id: &str) -> bool {
        self.poisoned.iter().any(|p| id.contains(p.as_str()))
    }

    /// Index a layer would be inserted at for a `before` target.
    fn insertion_index(&self, before: Option<&str>) -> usize {
        before
            .and_then(|b| self.layers.iter().position(|l| l.id == b))
            .unwrap_or(self.layers.len())
    }
}

impl MapSurface for RecordingSurface {
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), SurfaceError> {
        if self.is_poisoned(id) {
            return Err(SurfaceError::NotReady);
        }
        if self.has_source(id) {
            return Err(SurfaceError::SourceExists(id.to_owned()));
        }
        self.sources.push((id.to_owned(), spec));
        self.log.push(Mutation::AddSource { id: id.to_owned() });
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        if self.layers.iter().any(|l| l.source == id) {
            return Err(SurfaceError::SourceInUse(id.to_owned()));
        }
        let before = self.sources.len();
        self.sources.retain(|(sid, _)| sid != id);
        if self.sources.len() == before {
            return Err(SurfaceError::SourceMissing(id.to_owned()));
        }
        self.log.push(Mutation::RemoveSource { id: id.to_owned() });
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|(sid, _)| sid == id)
    }

    fn add_layer(&mut self, spec: LayerSpec, before: Option<&str>) -> Result<(), SurfaceError> {
        if self.is_poisoned(&spec.id) {
            return Err(SurfaceError::NotReady);
        }
        if self.has_layer(&spec.id) {
            return Err(SurfaceError::LayerExists(spec.id));
        }
        if !self.has_source(&spec.source) {
            return Err(SurfaceError::SourceMissing(spec.source));
        }
        let idx = self.insertion_index(before);
        self.log.push(Mutation::AddLayer {
            id: spec.id.clone(),
            before: before.map(str::to_owned),
        });
        self.layers.insert(idx, spec);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        let Some(idx) = self.layers.iter().position(|l| l.id == id) else {
            return Err(SurfaceError::LayerMissing(id.to_owned()));
        };
        self.layers.remove(idx);
        self.log.push(Mutation::RemoveLayer { id: id.to_owned() });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn move_layer(&mut self, id: &str, before: Option<&str>) -> Result<(), SurfaceError> {
        let Some(idx) = self.layers.iter().position(|l| l.id == id) else {
            return Err(SurfaceError::LayerMissing(id.to_owned()));
        };
        let layer = self.layers.remove(idx);
        let target = self.insertion_index(before);
        self.layers.insert(target, layer);
        self.log.push(Mutation::MoveLayer {
            id: id.to_owned(),
            before: before.map(str::to_owned),
        });
        Ok(())
    }

    fn add_image(&mut self, name: &str, image: ImageData) -> Result<(), SurfaceError> {
        if self.images.contains_key(name) {
            return Err(SurfaceError::ImageExists(name.to_owned()));
        }
        self.images.insert(name.to_owned(), image);
        self.log.push(Mutation::AddImage {
            name: name.to_owned(),
        });
        Ok(())
    }

    fn remove_image(&mut self, name: &str) -> Result<(), SurfaceError> {
        if self.images.remove(name).is_none() {
            return Err(SurfaceError::ImageMissing(name.to_owned()));
        }
        self.log.push(Mutation::RemoveImage {
            name: name.to_owned(),
        });
        Ok(())
    }

    fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError> {
        let Some(spec) = self.layers.iter_mut().find(|l| l.id == layer) else {
            return Err(SurfaceError::LayerMissing(layer.to_owned()));
        };
        spec.layout.insert(name.to_owned(), value);
        self.log.push(Mutation::SetLayout {
            layer: layer.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError> {
        let Some(spec) = self.layers.iter_mut().find(|l| l.id == layer) else {
            return Err(SurfaceError::LayerMissing(layer.to_owned()));
        };
        spec.paint.insert(name.to_owned(), value);
        self.log.push(Mutation::SetPaint {
            layer: layer.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_filter(
        &mut self,
        layer: &str,
        filter: Option<serde_json::Value>,
    ) -> Result<(), SurfaceError> {
        let Some(spec) = self.layers.iter_mut().find(|l| l.id == layer) else {
            return Err(SurfaceError::LayerMissing(layer.to_owned()));
        };
        spec.filter = filter;
        self.log.push(Mutation::SetFilter {
            layer: layer.to_owned(),
        });
        Ok(())
    }

    fn watch_clicks(&mut self, layer: &str) -> Result<(), SurfaceError> {
        if !self.watched.iter().any(|w| w == layer) {
            self.watched.push(layer.to_owned());
        }
        self.log.push(Mutation::WatchClicks {
            layer: layer.to_owned(),
        });
        Ok(())
    }

    fn unwatch_clicks(&mut self, layer: &str) -> Result<(), SurfaceError> {
        self.watched.retain(|w| w != layer);
        self.log.push(Mutation::UnwatchClicks {
            layer: layer.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stratum_core::surface::LayerType;

    use super::*;

    fn raster_source() -> SourceSpec {
        SourceSpec::RasterTiles {
            tiles: vec!["https://t/{z}/{x}/{y}".into()],
            tile_size: 256,
        }
    }

    #[test]
    fn duplicate_adds_fail_typed() {
        let mut s = RecordingSurface::new();
        s.add_source("a", raster_source()).unwrap();
        assert_eq!(
            s.add_source("a", raster_source()),
            Err(SurfaceError::SourceExists("a".into()))
        );
    }

    #[test]
    fn layer_requires_its_source() {
        let mut s = RecordingSurface::new();
        let spec = LayerSpec::new("l", "missing", LayerType::Raster);
        assert_eq!(
            s.add_layer(spec, None),
            Err(SurfaceError::SourceMissing("missing".into()))
        );
    }

    #[test]
    fn source_removal_blocked_while_referenced() {
        let mut s = RecordingSurface::new();
        s.add_source("src", raster_source()).unwrap();
        s.add_layer(LayerSpec::new("l", "src", LayerType::Raster), None)
            .unwrap();
        assert_eq!(
            s.remove_source("src"),
            Err(SurfaceError::SourceInUse("src".into()))
        );
        s.remove_layer("l").unwrap();
        s.remove_source("src").unwrap();
    }

    #[test]
    fn before_target_positions_layer_below() {
        let mut s = RecordingSurface::new();
        s.add_source("src", raster_source()).unwrap();
        s.add_layer(LayerSpec::new("top", "src", LayerType::Raster), None)
            .unwrap();
        s.add_layer(LayerSpec::new("a", "src", LayerType::Raster), Some("top"))
            .unwrap();
        s.add_layer(LayerSpec::new("b", "src", LayerType::Raster), Some("top"))
            .unwrap();
        assert_eq!(s.layer_order(), ["a", "b", "top"]);

        s.move_layer("a", Some("top")).unwrap();
        assert_eq!(s.layer_order(), ["b", "a", "top"]);
    }

    #[test]
    fn missing_before_falls_back_to_topmost() {
        let mut s = RecordingSurface::new();
        s.add_source("src", raster_source()).unwrap();
        s.add_layer(LayerSpec::new("a", "src", LayerType::Raster), Some("gone"))
            .unwrap();
        assert_eq!(s.layer_order(), ["a"]);
    }

    #[test]
    fn wipe_clears_resources_but_keeps_watches() {
        let mut s = RecordingSurface::new();
        s.add_source("src", raster_source()).unwrap();
        s.add_layer(LayerSpec::new("l", "src", LayerType::Raster), None)
            .unwrap();
        s.watch_clicks("l").unwrap();
        s.wipe_style();
        assert_eq!(s.resource_count(), 0);
        assert_eq!(s.watched(), ["l".to_owned()]);
    }

    #[test]
    fn partial_wipe_keeps_survivors_and_their_sources() {
        let mut s = RecordingSurface::new();
        s.add_source("src-a", raster_source()).unwrap();
        s.add_source("src-b", raster_source()).unwrap();
        s.add_layer(LayerSpec::new("a", "src-a", LayerType::Raster), None)
            .unwrap();
        s.add_layer(LayerSpec::new("b", "src-b", LayerType::Raster), None)
            .unwrap();
        s.wipe_style_except(&["a"]);
        assert!(s.has_layer("a"));
        assert!(s.has_source("src-a"));
        assert!(!s.has_layer("b"));
        assert!(!s.has_source("src-b"));
    }

    #[test]
    fn property_mutations_update_specs_and_log() {
        let mut s = RecordingSurface::new();
        s.add_source("src", raster_source()).unwrap();
        s.add_layer(LayerSpec::new("l", "src", LayerType::Raster), None)
            .unwrap();
        s.set_layout_property("l", "visibility", json!("none")).unwrap();
        s.set_paint_property("l", "raster-opacity", json!(0.5)).unwrap();

        let spec = s.layer("l").unwrap();
        assert_eq!(spec.layout["visibility"], json!("none"));
        assert_eq!(spec.paint["raster-opacity"], json!(0.5));
        assert_eq!(
            s.count(|m| matches!(m, Mutation::SetLayout { .. } | Mutation::SetPaint { .. })),
            2
        );
    }

    #[test]
    fn poisoned_ids_fail_adds() {
        let mut s = RecordingSurface::new();
        s.fail_adds_containing("bad");
        assert_eq!(
            s.add_source("bad-source", raster_source()),
            Err(SurfaceError::NotReady)
        );
        s.add_source("good-source", raster_source()).unwrap();
    }
}
