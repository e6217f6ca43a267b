// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor-relative z-ordering.
//!
//! Every managed layer is kept immediately below a fixed anchor layer, so a
//! consistent top-most slot stays reserved for overlays owned outside this
//! system. Desired stacking is the reverse of the caller-declared group
//! order: later-declared groups render below earlier ones.
//!
//! Reordering replays relative moves only — never removals — and a snapshot
//! of the previously applied order suppresses redundant move storms when
//! nothing changed.

use crate::surface::MapSurface;

/// Id of the fixed anchor layer managed layers are inserted below.
pub const ANCHOR_LAYER: &str = "stratum-anchor";

/// Id of the empty source backing the anchor layer.
pub const ANCHOR_SOURCE: &str = "stratum-anchor-src";

/// Replays anchor-relative moves when the desired order changes.
#[derive(Debug, Default)]
pub struct LayerOrdering {
    previous: Vec<String>,
}

impl LayerOrdering {
    /// Creates an ordering controller with no applied snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the desired order, returning the number of moves issued.
    ///
    /// `groups` lists each overlay's layer ids in caller declaration order.
    /// Groups are replayed in reverse so the first-declared group ends up
    /// topmost (directly below the anchor), while creation order inside a
    /// group is preserved. With `force` unset the call is a no-op when the
    /// flattened order matches the previous snapshot.
    pub fn apply(
        &mut self,
        surface: &mut dyn MapSurface,
        groups: &[Vec<String>],
        force: bool,
    ) -> usize {
        let flattened: Vec<String> = groups.iter().flatten().cloned().collect();
        if !force && flattened == self.previous {
            return 0;
        }

        let mut moves = 0;
        for group in groups.iter().rev() {
            for layer in group {
                if !surface.has_layer(layer) {
                    continue;
                }
                match surface.move_layer(layer, Some(ANCHOR_LAYER)) {
                    Ok(()) => moves += 1,
                    Err(err) => tracing::debug!(layer = %layer, error = %err, "reorder move failed"),
                }
            }
        }
        self.previous = flattened;
        moves
    }

    /// Forgets the applied snapshot, forcing the next [`apply`](Self::apply).
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}
