// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative overlay configuration model.
//!
//! A [`LayerConfig`] describes one overlay as an immutable value: a stable,
//! globally unique id plus kind-specific payload. Upstream selection logic
//! produces `Vec<LayerConfig>`; the reconciler compares each value's
//! [`content_hash`](LayerConfig::content_hash) against the tracked state to
//! decide between create, in-place update, recreate, and remove — a new value
//! under an existing id with different contents means "update".
//!
//! Dispatch over kinds is an exhaustive `match` everywhere; adding a variant
//! fails to compile until every site handles it.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::geojson::GeoJsonData;

/// Content hash of a [`LayerConfig`], used to detect change without
/// deep-diffing on every reconciliation pass.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigHash([u8; 32]);

impl fmt::Debug for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigHash({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// A `[min, max]` confidence window in whole percent, clamped to `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThresholdRange {
    min: u8,
    max: u8,
}

impl ThresholdRange {
    /// The permissive full range `[0, 100]`.
    pub const FULL: Self = Self { min: 0, max: 100 };

    /// Creates a range, clamping both ends to `0..=100` and ordering them.
    #[must_use]
    pub fn new(min: u8, max: u8) -> Self {
        let min = min.min(100);
        let max = max.min(100);
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// The lower bound in percent.
    #[must_use]
    pub const fn min(&self) -> u8 {
        self.min
    }

    /// The upper bound in percent.
    #[must_use]
    pub const fn max(&self) -> u8 {
        self.max
    }

    /// The lower bound as a confidence fraction in `[0, 1]`.
    #[must_use]
    pub fn min_fraction(&self) -> f64 {
        f64::from(self.min) / 100.0
    }

    /// The upper bound as a confidence fraction in `[0, 1]`.
    #[must_use]
    pub fn max_fraction(&self) -> f64 {
        f64::from(self.max) / 100.0
    }
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Asset classification driving the shape of vector-tile sub-layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    /// Flat fill plus outline.
    #[default]
    General,
    /// Change-detection results delivered as points; renders as circles.
    PointChange,
    /// Damage assessments delivered as polygons; renders with a discrete
    /// severity color ramp.
    DamagePolygon,
}

/// Raster tile overlay: one or more URL templates, one raster layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterTileConfig {
    /// Stable, globally unique overlay id.
    pub id: String,
    /// Slippy-map URL templates (`{z}/{x}/{y}` placeholders).
    pub templates: Vec<String>,
    /// Optional band selector rewritten into the template query string.
    #[serde(default)]
    pub band: Option<String>,
    /// Optional colormap selector rewritten into the template query string.
    #[serde(default)]
    pub colormap: Option<String>,
    /// Tile edge length in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

fn default_tile_size() -> u32 {
    256
}

/// Vector tile overlay with classification-dependent sub-layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorTileConfig {
    /// Stable, globally unique overlay id.
    pub id: String,
    /// Vector tile URL templates.
    pub templates: Vec<String>,
    /// Name of the layer inside the tiles to draw from.
    pub source_layer: String,
    /// Classification selecting the sub-layer shape.
    #[serde(default)]
    pub asset_class: AssetClass,
    /// Flat fill color (`#rrggbb`), also the damage-ramp fallback.
    pub fill_color: String,
    /// Outline color (`#rrggbb`).
    pub line_color: String,
}

/// Embedded GeoJSON overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonConfig {
    /// Stable, globally unique overlay id.
    pub id: String,
    /// The embedded or string-encoded feature collection.
    pub data: GeoJsonData,
    /// Fill and outline color (`#rrggbb`).
    pub color: String,
}

/// How a heatmap maps density to color.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeatRamp {
    /// The standard blue-to-red density ramp.
    #[default]
    Default,
    /// A single caller hue at five opacity steps.
    SingleHue {
        /// The hue as `#rrggbb`.
        color: String,
    },
}

/// Density heatmap overlay fed from a vector tile template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Stable, globally unique overlay id.
    pub id: String,
    /// Vector tile URL template providing the density points.
    pub template: String,
    /// Name of the layer inside the tiles to draw from.
    pub source_layer: String,
    /// Density-to-color mapping.
    #[serde(default)]
    pub ramp: HeatRamp,
    /// Kernel radius in pixels.
    #[serde(default = "default_heat_radius")]
    pub radius: f64,
}

fn default_heat_radius() -> f64 {
    20.0
}

/// User-drawn overlay: embedded GeoJSON with the simplified paint profile
/// (translucent fill, no outline tint).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// Stable, globally unique overlay id.
    pub id: String,
    /// The embedded or string-encoded feature collection.
    pub data: GeoJsonData,
    /// Fill color (`#rrggbb`).
    pub color: String,
}

/// A symbol definition rasterized into a named bitmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Symbol code; sanitized into the registered image name.
    pub code: String,
    /// Label drawn next to the symbol.
    pub label: String,
    /// Symbol edge length in pixels.
    pub size: u32,
    /// Symbol color (`#rrggbb`).
    pub color: String,
}

/// Symbol annotation overlay: point features rendered with a rasterized
/// symbol bitmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Stable, globally unique overlay id.
    pub id: String,
    /// Point features to annotate.
    pub data: GeoJsonData,
    /// The symbol to rasterize and place at each feature.
    pub symbol: SymbolSpec,
}

/// One overlay description; a tagged union over every supported kind.
///
/// Two variants exist per tile family because base imagery and analysis
/// results arrive from different upstream sources with identical rendering
/// semantics; they share builders but keep distinct kind tags for click
/// payloads and caller-side grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayerConfig {
    /// Base raster tile imagery.
    RasterTile(RasterTileConfig),
    /// Base vector tile overlay.
    VectorTile(VectorTileConfig),
    /// Embedded GeoJSON overlay.
    GeoJson(GeoJsonConfig),
    /// Density heatmap.
    Heatmap(HeatmapConfig),
    /// Analysis-result raster tiles.
    AnalysisRasterTile(RasterTileConfig),
    /// Analysis-result vector tiles.
    AnalysisVectorTile(VectorTileConfig),
    /// User-drawn shapes.
    Drawing(DrawingConfig),
    /// Symbol annotations.
    Annotation(AnnotationConfig),
}

impl LayerConfig {
    /// Returns the overlay's stable id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::RasterTile(c) | Self::AnalysisRasterTile(c) => &c.id,
            Self::VectorTile(c) | Self::AnalysisVectorTile(c) => &c.id,
            Self::GeoJson(c) => &c.id,
            Self::Heatmap(c) => &c.id,
            Self::Drawing(c) => &c.id,
            Self::Annotation(c) => &c.id,
        }
    }

    /// Returns the overlay's kind tag.
    #[must_use]
    pub fn kind(&self) -> OverlayKind {
        match self {
            Self::RasterTile(_) => OverlayKind::RasterTile,
            Self::VectorTile(_) => OverlayKind::VectorTile,
            Self::GeoJson(_) => OverlayKind::GeoJson,
            Self::Heatmap(_) => OverlayKind::Heatmap,
            Self::AnalysisRasterTile(_) => OverlayKind::AnalysisRasterTile,
            Self::AnalysisVectorTile(_) => OverlayKind::AnalysisVectorTile,
            Self::Drawing(_) => OverlayKind::Drawing,
            Self::Annotation(_) => OverlayKind::Annotation,
        }
    }

    /// Computes the content hash over the canonical serialized form.
    ///
    /// Derived `Serialize` emits fields in declaration order, so equal values
    /// hash equally and any field change produces a different hash.
    #[must_use]
    pub fn content_hash(&self) -> ConfigHash {
        let mut hasher = blake3::Hasher::new();
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        ConfigHash(*hasher.finalize().as_bytes())
    }
}

/// Kind tag attached to click payloads and exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    /// Base raster tile imagery.
    RasterTile,
    /// Base vector tile overlay.
    VectorTile,
    /// Embedded GeoJSON overlay.
    GeoJson,
    /// Density heatmap.
    Heatmap,
    /// Analysis-result raster tiles.
    AnalysisRasterTile,
    /// Analysis-result vector tiles.
    AnalysisVectorTile,
    /// User-drawn shapes.
    Drawing,
    /// Symbol annotations.
    Annotation,
}

impl OverlayKind {
    /// Returns a short label for logging and click payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RasterTile => "raster-tile",
            Self::VectorTile => "vector-tile",
            Self::GeoJson => "geojson",
            Self::Heatmap => "heatmap",
            Self::AnalysisRasterTile => "analysis-raster-tile",
            Self::AnalysisVectorTile => "analysis-vector-tile",
            Self::Drawing => "drawing",
            Self::Annotation => "annotation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(id: &str, template: &str) -> LayerConfig {
        LayerConfig::RasterTile(RasterTileConfig {
            id: id.into(),
            templates: vec![template.into()],
            band: None,
            colormap: None,
            tile_size: 256,
        })
    }

    #[test]
    fn equal_values_hash_equally() {
        let a = raster("a", "https://x/{z}/{x}/{y}");
        let b = raster("a", "https://x/{z}/{x}/{y}");
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn any_field_change_changes_the_hash() {
        let base = raster("a", "https://x/{z}/{x}/{y}");
        let other_template = raster("a", "https://y/{z}/{x}/{y}");
        let other_id = raster("b", "https://x/{z}/{x}/{y}");
        assert_ne!(base.content_hash(), other_template.content_hash());
        assert_ne!(base.content_hash(), other_id.content_hash());

        let mut banded = base.clone();
        if let LayerConfig::RasterTile(c) = &mut banded {
            c.band = Some("B8".into());
        }
        assert_ne!(base.content_hash(), banded.content_hash());
    }

    #[test]
    fn kind_distinguishes_base_from_analysis() {
        let base = raster("a", "t");
        let analysis = match base.clone() {
            LayerConfig::RasterTile(c) => LayerConfig::AnalysisRasterTile(c),
            other => other,
        };
        assert_ne!(base.content_hash(), analysis.content_hash());
        assert_eq!(base.kind(), OverlayKind::RasterTile);
        assert_eq!(analysis.kind(), OverlayKind::AnalysisRasterTile);
    }

    #[test]
    fn threshold_range_clamps_and_orders() {
        let r = ThresholdRange::new(120, 30);
        assert_eq!(r.min(), 30);
        assert_eq!(r.max(), 100);

        let r = ThresholdRange::new(70, 30);
        assert_eq!((r.min(), r.max()), (30, 70));
        assert!((r.min_fraction() - 0.3).abs() < 1e-9);
        assert!((r.max_fraction() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn default_threshold_is_full_range() {
        assert_eq!(ThresholdRange::default(), ThresholdRange::FULL);
    }

    #[test]
    fn config_round_trips_through_serde() {
        let cfg = LayerConfig::VectorTile(VectorTileConfig {
            id: "v1".into(),
            templates: vec!["https://t/{z}/{x}/{y}.pbf".into()],
            source_layer: "assets".into(),
            asset_class: AssetClass::DamagePolygon,
            fill_color: "#ff8800".into(),
            line_color: "#442200".into(),
        });
        let text = serde_json::to_string(&cfg).unwrap();
        let back: LayerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(cfg, back);
        assert_eq!(cfg.content_hash(), back.content_hash());
    }
}
