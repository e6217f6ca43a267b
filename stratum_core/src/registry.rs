// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The reconciler: desired configs versus tracked created state.
//!
//! One pass walks the desired configs in order and, per id, decides between
//! keep (hash unchanged), in-place update, recreate (cleanup then build), or
//! create; afterwards every tracked id absent from the desired set is retired.
//! Tracked entries end the pass stored in desired-array order, which the
//! ordering controller reads as the stacking order.
//!
//! Failure isolation: a builder error is logged and skips that config for
//! the pass. One bad config never blocks the rest of the map.

use crate::builders::{self, CreatedLayerSet, PinCache};
use crate::click::ClickDispatcher;
use crate::config::{ConfigHash, LayerConfig, OverlayKind};
use crate::reload::ReloadRegistry;
use crate::state::OverlayState;
use crate::surface::MapSurface;

/// One tracked overlay: the config value it was built from, its content
/// hash, and the resources it owns.
#[derive(Debug)]
pub(crate) struct TrackedEntry {
    pub(crate) config: LayerConfig,
    pub(crate) hash: ConfigHash,
    pub(crate) set: CreatedLayerSet,
}

/// Tally of one reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Overlays built for the first time.
    pub created: usize,
    /// Overlays whose change was absorbed in place.
    pub updated: usize,
    /// Overlays torn down and rebuilt after a hash change.
    pub recreated: usize,
    /// Overlays removed because their id left the desired set.
    pub removed: usize,
    /// Configs skipped this pass (missing data or failed build).
    pub skipped: usize,
}

impl ReconcileOutcome {
    /// Whether the pass created or destroyed any resources.
    ///
    /// Ordering is replayed unconditionally after a structural pass.
    #[must_use]
    pub fn structural_change(&self) -> bool {
        self.created + self.recreated + self.removed > 0
    }
}

/// Tracks the created state for every overlay id.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: Vec<TrackedEntry>,
}

impl LayerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracked overlay ids in stacking (desired-array) order.
    #[must_use]
    pub fn tracked_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.config.id()).collect()
    }

    /// Whether an overlay id is tracked.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.config.id() == id)
    }

    /// Number of tracked overlays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The kind of the overlay owning a layer id, for click tagging.
    #[must_use]
    pub fn kind_of_layer(&self, layer_id: &str) -> Option<OverlayKind> {
        self.entries
            .iter()
            .find(|e| e.set.layers.iter().any(|l| l == layer_id))
            .map(|e| e.config.kind())
    }

    /// Per-overlay layer ids in stacking order, for the ordering controller.
    #[must_use]
    pub fn layer_groups(&self) -> Vec<Vec<String>> {
        self.entries.iter().map(|e| e.set.layers.clone()).collect()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&TrackedEntry> {
        self.entries.iter().find(|e| e.config.id() == id)
    }

    pub(crate) fn entries(&self) -> &[TrackedEntry] {
        &self.entries
    }

    /// Reconciles the desired configs against tracked state.
    pub(crate) fn reconcile(
        &mut self,
        surface: &mut dyn MapSurface,
        desired: &[LayerConfig],
        state: &OverlayState,
        reload: &mut ReloadRegistry,
        clicks: &mut ClickDispatcher,
        pin: &mut PinCache,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let mut next: Vec<TrackedEntry> = Vec::with_capacity(desired.len());

        for cfg in desired {
            let id = cfg.id();
            if next.iter().any(|e| e.config.id() == id) {
                tracing::warn!(overlay = id, "duplicate config id in desired set, skipping");
                outcome.skipped += 1;
                continue;
            }
            let hash = cfg.content_hash();
            let existing = self.entries.iter().position(|e| e.config.id() == id);

            match existing {
                // Unchanged: carry the entry over untouched.
                Some(pos) if self.entries[pos].hash == hash => {
                    next.push(self.entries.remove(pos));
                }
                // Changed: in-place update when the kind supports it,
                // otherwise cleanup and fall through to creation.
                Some(pos) => {
                    let mut entry = self.entries.remove(pos);
                    match builders::try_update_in_place(surface, &entry.config, cfg) {
                        Ok(true) => {
                            entry.config = cfg.clone();
                            entry.hash = hash;
                            reload.register(id, builders::reload_handler(cfg, &[]));
                            outcome.updated += 1;
                            next.push(entry);
                        }
                        Ok(false) => {
                            retire(surface, &mut entry, reload, clicks);
                            outcome.recreated += 1;
                            match create(surface, cfg, hash, state, reload, clicks, pin) {
                                Some(entry) => next.push(entry),
                                None => outcome.skipped += 1,
                            }
                        }
                        Err(err) => {
                            tracing::warn!(overlay = id, error = %err, "in-place update failed");
                            outcome.skipped += 1;
                            next.push(entry);
                        }
                    }
                }
                // New id: build from scratch.
                None => match create(surface, cfg, hash, state, reload, clicks, pin) {
                    Some(entry) => {
                        outcome.created += 1;
                        next.push(entry);
                    }
                    None => outcome.skipped += 1,
                },
            }
        }

        // Sweep: everything still in `entries` fell out of the desired set.
        for mut entry in self.entries.drain(..) {
            retire(surface, &mut entry, reload, clicks);
            outcome.removed += 1;
        }

        self.entries = next;
        outcome
    }

    /// Tears down every tracked overlay.
    pub(crate) fn clear(
        &mut self,
        surface: &mut dyn MapSurface,
        reload: &mut ReloadRegistry,
        clicks: &mut ClickDispatcher,
    ) -> usize {
        let mut removed = 0;
        for mut entry in self.entries.drain(..) {
            retire(surface, &mut entry, reload, clicks);
            removed += 1;
        }
        removed
    }
}

/// Builds one overlay and wires its click and reload hooks.
fn create(
    surface: &mut dyn MapSurface,
    cfg: &LayerConfig,
    hash: ConfigHash,
    state: &OverlayState,
    reload: &mut ReloadRegistry,
    clicks: &mut ClickDispatcher,
    pin: &mut PinCache,
) -> Option<TrackedEntry> {
    let id = cfg.id();
    match builders::build(
        surface,
        cfg,
        state.threshold_for(id),
        state.visibility_for(id),
        pin,
    ) {
        Ok(Some(built)) => {
            clicks.bind(surface, built.set.interactive_layer_ids());
            reload.register(id, builders::reload_handler(cfg, &built.images));
            Some(TrackedEntry {
                config: cfg.clone(),
                hash,
                set: built.set,
            })
        }
        Ok(None) => {
            tracing::debug!(overlay = id, "config has no renderable data");
            None
        }
        Err(err) => {
            tracing::warn!(overlay = id, error = %err, "overlay build failed");
            None
        }
    }
}

/// Unwires and destroys one tracked overlay.
fn retire(
    surface: &mut dyn MapSurface,
    entry: &mut TrackedEntry,
    reload: &mut ReloadRegistry,
    clicks: &mut ClickDispatcher,
) {
    clicks.unbind(surface, &entry.set.interactive.clone());
    reload.unregister(entry.config.id());
    entry.set.cleanup(surface);
}

#[cfg(test)]
mod tests {
    use stratum_harness::{Mutation, RecordingSurface};

    use super::*;
    use crate::config::RasterTileConfig;

    struct Fixture {
        surface: RecordingSurface,
        state: OverlayState,
        reload: ReloadRegistry,
        clicks: ClickDispatcher,
        pin: PinCache,
        registry: LayerRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                surface: RecordingSurface::new(),
                state: OverlayState::new(),
                reload: ReloadRegistry::new(),
                clicks: ClickDispatcher::new(),
                pin: PinCache::default(),
                registry: LayerRegistry::new(),
            }
        }

        fn reconcile(&mut self, desired: &[LayerConfig]) -> ReconcileOutcome {
            self.registry.reconcile(
                &mut self.surface,
                desired,
                &self.state,
                &mut self.reload,
                &mut self.clicks,
                &mut self.pin,
            )
        }
    }

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
    fn create_then_unchanged_then_remove() {
        let mut fx = Fixture::new();
        let desired = vec![raster("a", "https://x/{z}/{x}/{y}")];

        let outcome = fx.reconcile(&desired);
        assert_eq!(outcome.created, 1);
        assert!(fx.registry.contains("a"));
        assert!(fx.reload.contains("a"));

        let outcome = fx.reconcile(&desired);
        assert_eq!(outcome, ReconcileOutcome::default(), "second pass is a no-op");

        let outcome = fx.reconcile(&[]);
        assert_eq!(outcome.removed, 1);
        assert!(fx.registry.is_empty());
        assert!(fx.reload.is_empty());
        assert_eq!(fx.surface.resource_count(), 0);
    }

    #[test]
    fn hash_change_recreates_only_that_overlay() {
        let mut fx = Fixture::new();
        fx.reconcile(&[
            raster("a", "https://x/{z}/{x}/{y}"),
            raster("b", "https://y/{z}/{x}/{y}"),
        ]);
        fx.surface.clear_log();

        let outcome = fx.reconcile(&[
            raster("a", "https://changed/{z}/{x}/{y}"),
            raster("b", "https://y/{z}/{x}/{y}"),
        ]);
        assert_eq!(outcome.recreated, 1);
        assert_eq!(
            fx.surface
                .count(|m| matches!(m, Mutation::RemoveLayer { id } if id == "a")),
            1
        );
        assert_eq!(
            fx.surface
                .count(|m| matches!(m, Mutation::AddLayer { id, .. } if id == "a")),
            1
        );
        assert_eq!(
            fx.surface
                .count(|m| matches!(m, Mutation::RemoveLayer { id } if id == "b")),
            0,
            "unrelated overlay untouched"
        );
    }

    #[test]
    fn failed_build_does_not_block_other_configs() {
        let mut fx = Fixture::new();
        fx.surface.fail_adds_containing("bad");

        let outcome = fx.reconcile(&[
            raster("bad", "https://x/{z}/{x}/{y}"),
            raster("good", "https://y/{z}/{x}/{y}"),
        ]);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(fx.registry.contains("good"));
        assert!(!fx.registry.contains("bad"));
    }

    #[test]
    fn missing_data_is_skipped_quietly() {
        let mut fx = Fixture::new();
        let empty = LayerConfig::RasterTile(RasterTileConfig {
            id: "e".into(),
            templates: vec![],
            band: None,
            colormap: None,
            tile_size: 256,
        });
        let outcome = fx.reconcile(&[empty]);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(fx.surface.resource_count(), 0);
    }

    #[test]
    fn duplicate_ids_in_one_pass_keep_first() {
        let mut fx = Fixture::new();
        let outcome = fx.reconcile(&[
            raster("a", "https://x/{z}/{x}/{y}"),
            raster("a", "https://y/{z}/{x}/{y}"),
        ]);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn entries_follow_desired_order() {
        let mut fx = Fixture::new();
        fx.reconcile(&[
            raster("a", "https://x/{z}/{x}/{y}"),
            raster("b", "https://y/{z}/{x}/{y}"),
        ]);
        assert_eq!(fx.registry.tracked_ids(), ["a", "b"]);

        fx.reconcile(&[
            raster("b", "https://y/{z}/{x}/{y}"),
            raster("a", "https://x/{z}/{x}/{y}"),
        ]);
        assert_eq!(fx.registry.tracked_ids(), ["b", "a"]);
    }

    #[test]
    fn kind_lookup_by_layer_id() {
        let mut fx = Fixture::new();
        fx.reconcile(&[raster("a", "https://x/{z}/{x}/{y}")]);
        assert_eq!(fx.registry.kind_of_layer("a"), Some(OverlayKind::RasterTile));
        assert_eq!(fx.registry.kind_of_layer("nope"), None);
    }
}
