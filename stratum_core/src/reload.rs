// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style-reload handler registry.
//!
//! A style reload (basemap switch) synchronously destroys every source,
//! layer, and image the session created. Each built overlay registers an
//! idempotent restore handler here, keyed by its config id; the session
//! replays the registry when the host forwards the reload event.
//!
//! Registration under an already-used key replaces the prior handler in
//! place, so repeated re-renders of the same overlay never accumulate
//! duplicate handlers. Handlers must re-check existence before re-adding —
//! event ordering against the wipe is not guaranteed, and a reload may leave
//! some resources standing.

use core::fmt;

use crate::state::OverlayState;
use crate::surface::MapSurface;

/// A restore handler: re-ensures one overlay's resources on the surface,
/// reading the last-requested visibility/threshold from the state table.
pub type ReloadHandler = Box<dyn FnMut(&mut dyn MapSurface, &OverlayState)>;

/// Keyed registry of style-reload restore handlers.
#[derive(Default)]
pub struct ReloadRegistry {
    entries: Vec<(String, ReloadHandler)>,
}

impl fmt::Debug for ReloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadRegistry")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ReloadRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `key`, replacing any prior handler in place.
    pub fn register(&mut self, key: &str, handler: ReloadHandler) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = handler,
            None => self.entries.push((key.to_owned(), handler)),
        }
    }

    /// Removes the handler under `key`; returns whether one existed.
    pub fn unregister(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// Returns whether a handler is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Runs every handler in registration order.
    pub(crate) fn replay(&mut self, surface: &mut dyn MapSurface, state: &OverlayState) {
        for (key, handler) in &mut self.entries {
            tracing::trace!(key = %key, "replaying reload handler");
            handler(surface, state);
        }
    }

    /// Drops every handler.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
