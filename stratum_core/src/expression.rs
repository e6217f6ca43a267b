// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style-expression builders.
//!
//! The rendering surface consumes filters and data-driven paint values as
//! JSON expression arrays. This module centralizes the expressions Stratum
//! emits: the confidence window filter, the damage-severity color ramp, and
//! the heatmap density ramps.

use serde_json::{Value, json};

use crate::config::{HeatRamp, ThresholdRange};

/// Property names read for model confidence, in priority order: the primary
/// name, the mean-suffixed alternate, and a legacy misspelling that still
/// exists in older tile sets.
pub const CONFIDENCE_PROPS: [&str; 3] = ["confidence", "confidence_mean", "confidense"];

/// Property carrying the integer damage severity (1–5).
pub const DAMAGE_PROP: &str = "damage_level";

/// Discrete severity colors for damage levels 1 through 5.
pub const DAMAGE_COLORS: [&str; 5] = ["#fee5d9", "#fcae91", "#fb6a4a", "#de2d26", "#a50f15"];

/// Returns the expression reading a feature's confidence.
///
/// Coalesces the [`CONFIDENCE_PROPS`] priority list and defaults to `1` so
/// features without any confidence property always pass a permissive filter.
#[must_use]
pub fn confidence_value() -> Value {
    json!([
        "coalesce",
        ["get", CONFIDENCE_PROPS[0]],
        ["get", CONFIDENCE_PROPS[1]],
        ["get", CONFIDENCE_PROPS[2]],
        1.0,
    ])
}

/// Builds the confidence window filter for a threshold range.
///
/// Accepts confidences in `[min/100, max/100]` inclusive on both ends.
#[must_use]
pub fn confidence_filter(range: ThresholdRange) -> Value {
    json!([
        "all",
        [">=", confidence_value(), range.min_fraction()],
        ["<=", confidence_value(), range.max_fraction()],
    ])
}

/// Builds the discrete damage-severity color ramp.
///
/// Matches the integer [`DAMAGE_PROP`] against levels 1–5; features without
/// the property (or outside the ramp) fall back to the flat `fallback` color.
#[must_use]
pub fn damage_color(fallback: &str) -> Value {
    json!([
        "match",
        ["coalesce", ["get", DAMAGE_PROP], 0],
        1, DAMAGE_COLORS[0],
        2, DAMAGE_COLORS[1],
        3, DAMAGE_COLORS[2],
        4, DAMAGE_COLORS[3],
        5, DAMAGE_COLORS[4],
        fallback,
    ])
}

/// Builds the heatmap density-to-color ramp for a config.
///
/// [`HeatRamp::SingleHue`] derives five opacity steps from the caller color;
/// an unparseable color falls back to the default blue-to-red ramp with a
/// warning, matching the graceful-degradation policy everywhere else.
#[must_use]
pub fn heat_ramp(ramp: &HeatRamp) -> Value {
    match ramp {
        HeatRamp::Default => default_heat_ramp(),
        HeatRamp::SingleHue { color } => match parse_hex_color(color) {
            Some(rgb) => single_hue_ramp(rgb),
            None => {
                tracing::warn!(color = %color, "unparseable heatmap color, using default ramp");
                default_heat_ramp()
            }
        },
    }
}

/// The standard blue-to-red density ramp.
fn default_heat_ramp() -> Value {
    json!([
        "interpolate",
        ["linear"],
        ["heatmap-density"],
        0.0, "rgba(33, 102, 172, 0)",
        0.2, "rgb(103, 169, 207)",
        0.4, "rgb(209, 229, 240)",
        0.6, "rgb(253, 219, 199)",
        0.8, "rgb(239, 138, 98)",
        1.0, "rgb(178, 24, 43)",
    ])
}

/// A single hue at five opacity steps.
fn single_hue_ramp((r, g, b): (u8, u8, u8)) -> Value {
    json!([
        "interpolate",
        ["linear"],
        ["heatmap-density"],
        0.0, format!("rgba({r}, {g}, {b}, 0)"),
        0.25, format!("rgba({r}, {g}, {b}, 0.25)"),
        0.5, format!("rgba({r}, {g}, {b}, 0.5)"),
        0.75, format!("rgba({r}, {g}, {b}, 0.75)"),
        1.0, format!("rgba({r}, {g}, {b}, 1)"),
    ])
}

/// Parses a `#rrggbb` color into its channels.
#[must_use]
pub(crate) fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
