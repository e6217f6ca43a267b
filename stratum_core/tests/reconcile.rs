// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end reconciliation behavior against the recording surface.

use serde_json::json;
use stratum_core::MapLayerSession;
use stratum_core::config::{
    AssetClass, GeoJsonConfig, LayerConfig, RasterTileConfig, VectorTileConfig,
};
use stratum_core::geojson::GeoJsonData;
use stratum_core::order::ANCHOR_LAYER;
use stratum_core::surface::{LayerType, MapSurface, SourceSpec};
use stratum_harness::{Mutation, RecordingSurface};

fn raster(id: &str, template: &str) -> LayerConfig {
    LayerConfig::RasterTile(RasterTileConfig {
        id: id.into(),
        templates: vec![template.into()],
        band: None,
        colormap: None,
        tile_size: 256,
    })
}

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

fn geojson_points(id: &str) -> LayerConfig {
    LayerConfig::GeoJson(GeoJsonConfig {
        id: id.into(),
        data: GeoJsonData::Raw(
            r#"{"features":[{"geometry":{"type":"Point","coordinates":[1.0,2.0]},"properties":{}}]}"#
                .into(),
        ),
        color: "#00aa55".into(),
    })
}

/// A raster config produces exactly one source and one layer with the
/// documented ids, and removing it produces exactly one removal of each.
#[test]
fn raster_lifecycle_mutation_counts() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();

    session.reconcile(&mut surface, &[raster("a", "https://x/{z}/{x}/{y}")]);
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::AddSource { id } if id == "a-source")),
        1
    );
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::AddLayer { id, .. } if id == "a")),
        1
    );
    let layer = surface.layer("a").expect("raster layer exists");
    assert_eq!(layer.layer_type, LayerType::Raster);
    assert_eq!(layer.source, "a-source");
    match surface.source("a-source").expect("source exists") {
        SourceSpec::RasterTiles { tiles, .. } => {
            assert_eq!(tiles, &["https://x/{z}/{x}/{y}".to_owned()]);
        }
        other => panic!("expected raster tiles, got {other:?}"),
    }

    surface.clear_log();
    session.reconcile(&mut surface, &[]);
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::RemoveLayer { id } if id == "a")),
        1
    );
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::RemoveSource { id } if id == "a-source")),
        1
    );
}

/// Reconciling the identical desired set twice adds nothing the second time.
#[test]
fn identical_pass_is_mutation_free() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    let desired = vec![
        raster("r", "https://x/{z}/{x}/{y}"),
        vector("v", AssetClass::General),
        geojson_points("g"),
    ];

    session.reconcile(&mut surface, &desired);
    surface.clear_log();
    session.reconcile(&mut surface, &desired);
    assert_eq!(surface.log(), &[], "second identical pass does nothing");
}

/// Changing one config's content recreates exactly that overlay.
#[test]
fn content_change_recreates_only_the_changed_overlay() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(
        &mut surface,
        &[raster("a", "https://x/{z}/{x}/{y}"), geojson_points("g")],
    );
    surface.clear_log();

    session.reconcile(
        &mut surface,
        &[raster("a", "https://changed/{z}/{x}/{y}"), geojson_points("g")],
    );
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::RemoveLayer { id } if id == "a")),
        1
    );
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::AddLayer { id, .. } if id == "a")),
        1
    );
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::RemoveLayer { id } if id.starts_with('g'))),
        0,
        "unrelated overlay untouched"
    );
}

/// After emptying the desired set, no overlay-owned resource remains.
#[test]
fn empty_desired_set_cleans_everything() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(
        &mut surface,
        &[
            raster("r", "https://x/{z}/{x}/{y}"),
            vector("v", AssetClass::DamagePolygon),
            geojson_points("g"),
        ],
    );
    assert!(surface.resource_count() > 2);

    session.reconcile(&mut surface, &[]);
    // Only the session's own anchor remains.
    assert_eq!(surface.layer_order(), [ANCHOR_LAYER]);
    assert!(session.is_empty());

    session.cleanup(&mut surface);
    assert_eq!(surface.resource_count(), 0);
    assert!(surface.image_names().is_empty());
}

/// Presenting already-created configs in reverse order only issues moves.
#[test]
fn reordering_reuses_layers() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    let a = raster("a", "https://x/{z}/{x}/{y}");
    let b = raster("b", "https://y/{z}/{x}/{y}");
    let c = raster("c", "https://z/{z}/{x}/{y}");

    session.reconcile(&mut surface, &[a.clone(), b.clone(), c.clone()]);
    assert_eq!(surface.layer_order(), ["c", "b", "a", ANCHOR_LAYER]);
    surface.clear_log();

    session.reconcile(&mut surface, &[c, b, a]);
    assert!(
        surface.count(|m| matches!(m, Mutation::MoveLayer { .. })) > 0,
        "order change replays moves"
    );
    assert_eq!(
        surface.count(|m| {
            matches!(
                m,
                Mutation::AddLayer { .. }
                    | Mutation::RemoveLayer { .. }
                    | Mutation::AddSource { .. }
                    | Mutation::RemoveSource { .. }
            )
        }),
        0,
        "pure reorder never rebuilds"
    );
    assert_eq!(surface.layer_order(), ["a", "b", "c", ANCHOR_LAYER]);
}

/// First-declared configs render topmost, all below the anchor.
#[test]
fn declaration_order_maps_to_stacking() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(
        &mut surface,
        &[vector("top", AssetClass::General), raster("under", "https://x/{z}/{x}/{y}")],
    );
    assert_eq!(
        surface.layer_order(),
        ["under", "top-fill", "top-line", ANCHOR_LAYER],
        "later-declared renders below earlier-declared"
    );
}

/// One failing config is skipped; the rest of the pass proceeds, and a later
/// pass picks the config up once the surface accepts it.
#[test]
fn failure_is_isolated_and_retried() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    surface.fail_adds_containing("flaky");

    let desired = vec![
        raster("flaky", "https://x/{z}/{x}/{y}"),
        raster("solid", "https://y/{z}/{x}/{y}"),
    ];
    session.reconcile(&mut surface, &desired);
    assert!(surface.has_layer("solid"));
    assert!(!surface.has_layer("flaky"));

    // Surface recovers; the next pass creates the previously failed overlay.
    let mut recovered = RecordingSurface::new();
    session.cleanup(&mut surface);
    let outcome = session.reconcile(&mut recovered, &desired);
    assert_eq!(outcome.created, 2);
    assert!(recovered.has_layer("flaky"));
}

/// Visibility flips mutate layout only; no rebuild, and absent layers are
/// skipped without error.
#[test]
fn visibility_updates_in_place() {
    let mut surface = RecordingSurface::new();
    let mut session = MapLayerSession::new();
    session.reconcile(&mut surface, &[vector("v", AssetClass::General)]);
    surface.clear_log();

    session.set_visibility(&mut surface, "v", false);
    assert_eq!(
        surface.count(|m| matches!(m, Mutation::SetLayout { name, .. } if name == "visibility")),
        2,
        "both sub-layers flipped"
    );
    assert_eq!(
        surface.count(|m| !matches!(m, Mutation::SetLayout { .. })),
        0,
        "nothing rebuilt"
    );
    assert_eq!(
        surface.layer("v-fill").unwrap().layout["visibility"],
        json!("none")
    );

    // Unknown id: recorded for later, zero surface mutations.
    surface.clear_log();
    session.set_visibility(&mut surface, "ghost", false);
    assert_eq!(surface.log(), &[]);
}
