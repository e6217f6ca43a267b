// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Config model and reconciler for declarative map overlays.
//!
//! `stratum_core` keeps a declarative set of overlay descriptions
//! ([`LayerConfig`](config::LayerConfig)) in sync with the live, mutable
//! state of a map rendering surface — one that periodically destroys every
//! dynamically-added source, layer, and image when its style document is
//! replaced. Synchronization is incremental: an unchanged config costs
//! nothing, a changed one is updated in place or recreated, and nothing is
//! ever torn down wholesale just to re-render.
//!
//! # Architecture
//!
//! ```text
//!   upstream selection ──► Vec<LayerConfig>
//!                               │
//!                               ▼
//!   MapLayerSession::reconcile() ──► LayerRegistry diff ──► builders
//!                                                              │
//!                     ┌────────────────────────────────────────┘
//!                     ▼
//!            MapSurface mutations (sources / layers / images)
//!                     ▲
//!                     │
//!   UI events ── set_visibility / set_threshold / dispatch_click
//!   style reload ── handle_style_reload ──► ReloadRegistry replay
//! ```
//!
//! **[`config`]** — The overlay description model: a tagged union over every
//! overlay kind, with content hashing for change detection.
//!
//! **[`surface`]** — The [`MapSurface`](surface::MapSurface) backend
//! contract; production adapters and the test harness implement it.
//!
//! **[`builders`]** — Per-kind resource construction, idempotent against
//! re-entry and duplicate-registration races.
//!
//! **[`registry`]** — The reconciler: hash-diffs desired configs against
//! tracked created state.
//!
//! **[`state`]** — Desired visibility/threshold side table, kept independent
//! of created resources so it survives recreation and style wipes.
//!
//! **[`reload`]** — Keyed style-reload restore handlers.
//!
//! **[`click`]** — Hit-test binding and click payload extraction.
//!
//! **[`order`]** — Anchor-relative z-ordering with snapshot suppression.
//!
//! **[`session`]** — [`MapLayerSession`](session::MapLayerSession), the
//! session-scoped owner wiring all of the above together; the public entry
//! point.
//!
//! # Failure policy
//!
//! Nothing here throws back to the caller from a reconcile pass: builder and
//! surface errors are absorbed and logged, and the worst outcome is a layer
//! that is visually absent or unfiltered. See [`error`] for the taxonomy.

pub mod builders;
pub mod click;
pub mod config;
pub mod error;
pub mod expression;
pub mod geojson;
pub mod order;
pub mod registry;
pub mod reload;
pub mod session;
pub mod state;
pub mod surface;

pub use click::{ClickCallback, ClickEvent, ClickProperties};
pub use config::{LayerConfig, OverlayKind, ThresholdRange};
pub use geojson::LngLat;
pub use registry::ReconcileOutcome;
pub use session::MapLayerSession;
