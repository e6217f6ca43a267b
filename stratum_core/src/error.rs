// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Failure taxonomy for surface mutations and overlay builders.
//!
//! Nothing in this crate propagates an error out of
//! [`MapLayerSession::reconcile`](crate::session::MapLayerSession::reconcile):
//! failures are absorbed at the builder/reconcile boundary and logged, so one
//! bad config never blocks the rest of the map. The types here exist so that
//! *expected* failures (duplicate-registration races) can be told apart from
//! real ones structurally rather than by matching error message text.

use thiserror::Error;

/// An error raised by a [`MapSurface`](crate::surface::MapSurface) mutation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// A source with this id is already registered.
    #[error("source '{0}' already exists")]
    SourceExists(String),
    /// A layer with this id is already registered.
    #[error("layer '{0}' already exists")]
    LayerExists(String),
    /// An image with this name is already registered.
    #[error("image '{0}' already exists")]
    ImageExists(String),
    /// No source with this id is registered.
    #[error("no such source '{0}'")]
    SourceMissing(String),
    /// No layer with this id is registered.
    #[error("no such layer '{0}'")]
    LayerMissing(String),
    /// No image with this name is registered.
    #[error("no such image '{0}'")]
    ImageMissing(String),
    /// A source is still referenced by one or more layers.
    #[error("source '{0}' is still in use")]
    SourceInUse(String),
    /// The surface has not finished loading a style document.
    #[error("surface is not ready")]
    NotReady,
    /// The surface rejected a filter expression.
    #[error("invalid filter for layer '{layer}': {reason}")]
    InvalidFilter {
        /// The layer the filter was applied to.
        layer: String,
        /// The surface's rejection reason.
        reason: String,
    },
}

impl SurfaceError {
    /// Returns whether this error is a duplicate-registration conflict.
    ///
    /// Concurrent idempotent adds of the same named source, layer, or image
    /// are an expected race on a shared surface; callers suppress these
    /// silently instead of logging them as warnings.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::SourceExists(_) | Self::LayerExists(_) | Self::ImageExists(_)
        )
    }

    /// Returns whether this error reports an absent target.
    ///
    /// Removals race benignly against style wipes: the wipe may already have
    /// taken the resource down.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::SourceMissing(_) | Self::LayerMissing(_) | Self::ImageMissing(_)
        )
    }
}

/// An error raised while building the resource set for one overlay config.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A surface mutation failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    /// An embedded feature collection could not be parsed.
    #[error("invalid geojson: {0}")]
    Geometry(#[from] serde_json::Error),
    /// An icon or symbol bitmap could not be produced.
    #[error("bitmap generation failed: {0}")]
    Bitmap(String),
}
