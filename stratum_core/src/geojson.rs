// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal GeoJSON data model for embedded overlay payloads.
//!
//! Overlay configs carry feature collections either pre-parsed or as raw JSON
//! text; both forms deserialize into the same [`FeatureCollection`]. The model
//! is deliberately small: geometry coordinates stay untyped
//! ([`serde_json::Value`]) because nesting depth varies per geometry kind and
//! the only structural operation this crate performs on them is the recursive
//! search for a representative position in [`first_position`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LngLat {
    /// Creates a coordinate from longitude and latitude degrees.
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Geometry kinds this crate recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// A single position.
    Point,
    /// A list of positions.
    MultiPoint,
    /// A polyline.
    LineString,
    /// A list of polylines.
    MultiLineString,
    /// A ring-delimited area.
    Polygon,
    /// A list of ring-delimited areas.
    MultiPolygon,
}

impl GeometryKind {
    /// Returns whether features of this kind render as point symbols.
    #[must_use]
    pub const fn is_point(self) -> bool {
        matches!(self, Self::Point | Self::MultiPoint)
    }
}

/// A feature geometry: a kind tag plus untyped nested coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// The geometry kind.
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    /// Nested coordinate arrays; depth depends on `kind`.
    #[serde(default)]
    pub coordinates: Value,
}

/// A single feature: optional geometry plus a property bag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// The feature geometry, if any.
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Feature properties in source order.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Returns the first numeric coordinate pair found in the geometry.
    #[must_use]
    pub fn first_position(&self) -> Option<LngLat> {
        self.geometry
            .as_ref()
            .and_then(|g| first_position(&g.coordinates))
    }
}

/// An ordered collection of features.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Member features in source order.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Splits the collection into point features and everything else.
    ///
    /// Point features render through a dedicated icon source and symbol
    /// layer; polygon and line features share a fill/line pair. Features
    /// without geometry are dropped.
    #[must_use]
    pub fn split_points(&self) -> (Self, Self) {
        let mut points = Self::default();
        let mut shapes = Self::default();
        for feature in &self.features {
            match &feature.geometry {
                Some(g) if g.kind.is_point() => points.features.push(feature.clone()),
                Some(_) => shapes.features.push(feature.clone()),
                None => {}
            }
        }
        (points, shapes)
    }

    /// Serializes the collection as a GeoJSON `FeatureCollection` value.
    #[must_use]
    pub fn to_source_value(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features,
        })
    }
}

/// A feature collection embedded in a config, parsed or still encoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeoJsonData {
    /// An already-parsed collection.
    Embedded(FeatureCollection),
    /// A JSON-encoded collection, parsed at build time.
    Raw(String),
}

impl GeoJsonData {
    /// Returns the parsed feature collection.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error when a [`Raw`](Self::Raw) payload
    /// is not a valid feature collection.
    pub fn collection(&self) -> Result<FeatureCollection, serde_json::Error> {
        match self {
            Self::Embedded(fc) => Ok(fc.clone()),
            Self::Raw(text) => serde_json::from_str(text),
        }
    }
}

/// Recursively searches nested coordinate arrays for the first numeric pair.
///
/// Handles every nesting depth (`Point` through `MultiPolygon`) with one
/// descent: an array whose first two elements are numbers is a position;
/// anything else is searched element by element in order.
#[must_use]
pub fn first_position(coordinates: &Value) -> Option<LngLat> {
    let items = coordinates.as_array()?;
    if let (Some(lng), Some(lat)) = (
        items.first().and_then(Value::as_f64),
        items.get(1).and_then(Value::as_f64),
    ) {
        return Some(LngLat::new(lng, lat));
    }
    items.iter().find_map(first_position)
}
