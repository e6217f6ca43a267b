// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable rendering of recorded surface mutations.
//!
//! Writes one line per [`Mutation`] to a [`Write`](std::io::Write)
//! destination, so a failing reconciliation test (or a bug report) can show
//! exactly what a pass did to the surface instead of a debug-printed vector.

use std::io::{self, Write};

use stratum_harness::{Mutation, RecordingSurface};

/// Writes one line per mutation to the destination.
///
/// # Errors
///
/// Propagates write failures from the destination.
pub fn write_mutations<W: Write>(writer: &mut W, log: &[Mutation]) -> io::Result<()> {
    for mutation in log {
        match mutation {
            Mutation::AddSource { id } => writeln!(writer, "[add-source] id={id}")?,
            Mutation::RemoveSource { id } => writeln!(writer, "[remove-source] id={id}")?,
            Mutation::AddLayer { id, before } => {
                writeln!(writer, "[add-layer] id={id} before={}", target(before))?;
            }
            Mutation::RemoveLayer { id } => writeln!(writer, "[remove-layer] id={id}")?,
            Mutation::MoveLayer { id, before } => {
                writeln!(writer, "[move-layer] id={id} before={}", target(before))?;
            }
            Mutation::AddImage { name } => writeln!(writer, "[add-image] name={name}")?,
            Mutation::RemoveImage { name } => writeln!(writer, "[remove-image] name={name}")?,
            Mutation::SetLayout { layer, name } => {
                writeln!(writer, "[set-layout] layer={layer} {name}")?;
            }
            Mutation::SetPaint { layer, name } => {
                writeln!(writer, "[set-paint] layer={layer} {name}")?;
            }
            Mutation::SetFilter { layer } => writeln!(writer, "[set-filter] layer={layer}")?,
            Mutation::WatchClicks { layer } => writeln!(writer, "[watch] layer={layer}")?,
            Mutation::UnwatchClicks { layer } => writeln!(writer, "[unwatch] layer={layer}")?,
        }
    }
    Ok(())
}

/// Renders the mutation log to a string.
#[must_use]
pub fn format_mutations(log: &[Mutation]) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_mutations(&mut buf, log);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Writes the surface's current layer stack and click subscriptions.
///
/// # Errors
///
/// Propagates write failures from the destination.
pub fn write_surface_summary<W: Write>(
    writer: &mut W,
    surface: &RecordingSurface,
) -> io::Result<()> {
    writeln!(writer, "layers (bottom to top):")?;
    for id in surface.layer_order() {
        writeln!(writer, "  {id}")?;
    }
    writeln!(writer, "images: {}", surface.image_names().join(", "))?;
    writeln!(writer, "watched: {}", surface.watched().join(", "))?;
    Ok(())
}

fn target(before: &Option<String>) -> &str {
    before.as_deref().unwrap_or("<top>")
}

#[cfg(test)]
mod tests {
    use stratum_core::surface::{LayerSpec, LayerType, MapSurface, SourceSpec};

    use super::*;

    #[test]
    fn one_line_per_mutation() {
        let log = vec![
            Mutation::AddSource { id: "a-source".into() },
            Mutation::AddLayer {
                id: "a".into(),
                before: Some("stratum-anchor".into()),
            },
            Mutation::MoveLayer {
                id: "a".into(),
                before: None,
            },
            Mutation::SetFilter { layer: "a".into() },
        ];
        let text = format_mutations(&log);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[add-source] id=a-source");
        assert_eq!(lines[1], "[add-layer] id=a before=stratum-anchor");
        assert_eq!(lines[2], "[move-layer] id=a before=<top>");
        assert_eq!(lines[3], "[set-filter] layer=a");
    }

    #[test]
    fn surface_summary_lists_stack_order() {
        let mut surface = RecordingSurface::new();
        surface
            .add_source(
                "src",
                SourceSpec::GeoJson {
                    data: serde_json::json!({"type": "FeatureCollection", "features": []}),
                },
            )
            .unwrap();
        surface
            .add_layer(LayerSpec::new("low", "src", LayerType::Fill), None)
            .unwrap();
        surface
            .add_layer(LayerSpec::new("high", "src", LayerType::Line), None)
            .unwrap();

        let mut buf = Vec::new();
        write_surface_summary(&mut buf, &surface).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("  low\n  high"), "got: {text}");
    }
}
