// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Confidence filtering and data-driven color behavior, asserted by
//! evaluating the emitted expressions rather than matching their JSON shape.

use serde_json::{Map, Value, json};
use stratum_core::config::{AssetClass, LayerConfig, ThresholdRange, VectorTileConfig};
use stratum_core::{ClickEvent, LngLat, MapLayerSession, OverlayKind};
use stratum_harness::{RecordingSurface, evaluate, evaluate_filter};

fn vector(id: &str, class: AssetClass) -> LayerConfig {
    LayerConfig::VectorTile(VectorTileConfig {
        id: id.into(),
        templates: vec!["https://t/{z}/{x}/{y}.pbf".into()],
        source_layer: "assets".into(),
        asset_class: class,
        fill_color: "#336699".into(),
        line_color: "#112233".into(),
    })
}

fn props(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// The `[30, 70]` window accepts 0.30 and 0.70 inclusive and rejects just
/// outside either bound.
#[test]
fn threshold_window_is_inclusive() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(&mut surface, &[vector("v", AssetClass::General)]);
    session.set_threshold(&mut surface, "v", ThresholdRange::new(30, 70));

    let filter = surface.layer("v-fill").unwrap().filter.clone().unwrap();
    for (confidence, expected) in [(0.30, true), (0.70, true), (0.29, false), (0.71, false)] {
        assert_eq!(
            evaluate_filter(&filter, &props(&[("confidence", json!(confidence))])),
            expected,
            "confidence {confidence}"
        );
    }
}

/// Confidence is read through the documented property-name priority list,
/// and defaults to 1 when no property is present.
#[test]
fn confidence_property_priority() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(&mut surface, &[vector("v", AssetClass::General)]);
    session.set_threshold(&mut surface, "v", ThresholdRange::new(30, 70));
    let filter = surface.layer("v-fill").unwrap().filter.clone().unwrap();

    // The mean-suffixed alternate is honored.
    assert!(evaluate_filter(
        &filter,
        &props(&[("confidence_mean", json!(0.5))])
    ));
    // So is the legacy misspelling.
    assert!(evaluate_filter(&filter, &props(&[("confidense", json!(0.5))])));
    // The primary name wins over alternates.
    assert!(!evaluate_filter(
        &filter,
        &props(&[("confidence", json!(0.9)), ("confidence_mean", json!(0.5))])
    ));
    // No property at all defaults to 1, outside the [0.3, 0.7] window.
    assert!(!evaluate_filter(&filter, &props(&[])));
    // With the full range, the default of 1 passes.
    session.set_threshold(&mut surface, "v", ThresholdRange::FULL);
    let full = surface.layer("v-fill").unwrap().filter.clone().unwrap();
    assert!(evaluate_filter(&full, &props(&[])));
}

/// Threshold updates touch filtered sub-layers only.
#[test]
fn threshold_leaves_non_filtered_layers_alone() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(
        &mut surface,
        &[
            vector("v", AssetClass::PointChange),
            LayerConfig::Heatmap(stratum_core::config::HeatmapConfig {
                id: "h".into(),
                template: "https://t/{z}/{x}/{y}.pbf".into(),
                source_layer: "pts".into(),
                ramp: stratum_core::config::HeatRamp::Default,
                radius: 20.0,
            }),
        ],
    );
    surface.clear_log();

    session.set_threshold(&mut surface, "v", ThresholdRange::new(10, 90));
    session.set_threshold(&mut surface, "h", ThresholdRange::new(10, 90));

    assert!(surface.layer("v-point").unwrap().filter.is_some());
    assert!(
        surface.layer("h-heat").unwrap().filter.is_none(),
        "heatmap layer never receives a confidence filter"
    );
}

/// Change-detection points color by severity; damage polygons without the
/// severity property fall back to the flat color.
#[test]
fn severity_ramp_and_flat_fallback() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(
        &mut surface,
        &[
            vector("p1", AssetClass::PointChange),
            vector("p2", AssetClass::DamagePolygon),
        ],
    );

    // p1: one circle layer whose color matches on the severity property.
    assert!(surface.layer("p1-fill").is_none());
    let circle_color = surface.layer("p1-point").unwrap().paint["circle-color"].clone();
    assert_eq!(circle_color[0], json!("match"));
    let level_three = evaluate(&circle_color, &props(&[("damage_level", json!(3))]));
    assert_eq!(level_three, json!("#fb6a4a"));

    // p2: fill + line; without the property the fill evaluates to the flat
    // fallback color.
    let fill_color = surface.layer("p2-fill").unwrap().paint["fill-color"].clone();
    assert_eq!(evaluate(&fill_color, &props(&[])), json!("#336699"));
    assert_eq!(
        evaluate(&fill_color, &props(&[("damage_level", json!(5))])),
        json!("#a50f15")
    );
    assert_eq!(
        surface.layer("p2-line").unwrap().paint["line-color"],
        json!("#112233")
    );
}

/// Click payloads carry the pointer coordinate (or the feature's first
/// position) and the property bag tagged with the overlay kind.
#[test]
fn click_payload_round_trip() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(&mut surface, &[vector("v", AssetClass::PointChange)]);
    assert_eq!(surface.watched(), ["v-point".to_owned()]);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session.set_click_callback(Box::new(move |coord, payload| {
        sink.borrow_mut().push((coord, payload));
    }));

    let mut properties = Map::new();
    properties.insert("damage_level".into(), json!(2));
    session.dispatch_click(ClickEvent {
        layer_id: "v-point".into(),
        point: None,
        feature: stratum_core::geojson::Feature {
            geometry: Some(stratum_core::geojson::Geometry {
                kind: stratum_core::geojson::GeometryKind::Point,
                coordinates: json!([13.4, 52.5]),
            }),
            properties,
        },
    });

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, LngLat::new(13.4, 52.5));
    assert_eq!(seen[0].1.kind, OverlayKind::VectorTile);
    assert_eq!(seen[0].1.properties["damage_level"], json!(2));

    // After removal the binding is gone and clicks are dropped.
    drop(seen);
    session.reconcile(&mut surface, &[]);
    assert!(surface.watched().is_empty(), "unbind is symmetric");
}
