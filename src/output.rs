//! CLI output formatting for catalog builds and row layouts.
//!
//! Output is **information-centric**: every collection and artwork is shown by
//! its position and title first, with identifiers, prices, and image
//! references as indented context lines.
//!
//! # Output Format
//!
//! ## Build / Check
//!
//! ```text
//! Collections
//! 001 Nocturnes (2 artworks)
//!     Id: nocturnes
//!     001 Black Swan ★
//!         Id: black-swan · $1,200 · available
//!         Image: black-swan.jpg
//!     002 River Study
//!         Id: RS-3 · sold
//!         Image: RS-3.jpg
//!
//! Warnings
//!     artworks.csv: row on line 4 has no title or id; skipped
//!
//! 2 artworks in 1 collection, 1 featured
//! ```
//!
//! ## Layout
//!
//! ```text
//! 001 Nocturnes: row height 312.5, content width 718.8
//!     001 black-swan  468.8 × 312.5
//!     002 RS-3        250.0 × 312.5
//! 002 Studies: row height 200.0, content width 300.0
//!     001 tern        300.0 × 200.0 (fallback)
//!
//! 1 image could not be measured; fallback 3:2 used
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::catalog::BuildWarning;
use crate::layout::RowLayout;
use crate::types::{Artwork, CatalogSnapshot};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Artwork context line: id, price, and availability.
///
/// ```text
/// Id: black-swan · $1,200 · available
/// Id: RS-3 · sold
/// ```
fn artwork_details(artwork: &Artwork) -> String {
    let mut parts = vec![format!("Id: {}", artwork.id)];
    if !artwork.price.is_empty() && artwork.available {
        parts.push(artwork.price.clone());
    }
    parts.push(if artwork.available { "available" } else { "sold" }.to_string());
    parts.join(" · ")
}

// ============================================================================
// Build / check
// ============================================================================

/// Format the catalog tree.
pub fn format_catalog(snapshot: &CatalogSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if snapshot.is_empty() {
        lines.push("Catalog is empty".to_string());
        return lines;
    }

    lines.push("Collections".to_string());
    for (i, collection) in snapshot.collections.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            collection.name,
            plural(collection.artworks.len(), "artwork", "artworks")
        ));
        lines.push(format!("{}Id: {}", indent(1), collection.id));
        if !collection.description.is_empty() {
            lines.push(format!("{}Description: {}", indent(1), collection.description));
        }
        for (j, artwork) in collection.artworks.iter().enumerate() {
            let star = if artwork.featured { " ★" } else { "" };
            lines.push(format!(
                "{}{} {}{}",
                indent(1),
                format_index(j + 1),
                artwork.title,
                star
            ));
            lines.push(format!("{}{}", indent(2), artwork_details(artwork)));
            lines.push(format!("{}Image: {}", indent(2), artwork.image_ref));
        }
    }
    lines
}

/// Format build warnings under a `Warnings` heading. Empty when clean.
pub fn format_warnings(warnings: &[BuildWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Warnings".to_string()];
    lines.extend(warnings.iter().map(|w| format!("{}{}", indent(1), w)));
    lines
}

/// One-line summary of the catalog counters.
pub fn format_summary(snapshot: &CatalogSnapshot) -> String {
    let meta = &snapshot.meta;
    format!(
        "{} in {}, {} featured",
        plural(meta.total_artworks, "artwork", "artworks"),
        plural(meta.collections_count, "collection", "collections"),
        meta.featured_count
    )
}

/// Full build report: catalog tree, warnings, summary.
pub fn format_build_output(snapshot: &CatalogSnapshot, warnings: &[BuildWarning]) -> Vec<String> {
    let mut lines = format_catalog(snapshot);
    let warning_lines = format_warnings(warnings);
    if !warning_lines.is_empty() {
        lines.push(String::new());
        lines.extend(warning_lines);
    }
    lines.push(String::new());
    lines.push(format_summary(snapshot));
    lines
}

pub fn print_build_output(snapshot: &CatalogSnapshot, warnings: &[BuildWarning]) {
    for line in format_build_output(snapshot, warnings) {
        println!("{}", line);
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Format computed rows, one block per collection.
pub fn format_layout_output(snapshot: &CatalogSnapshot, rows: &[RowLayout]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let name = snapshot
            .collection(&row.collection_id)
            .map_or(row.collection_id.as_str(), |c| c.name.as_str());
        lines.push(format!(
            "{} {}: row height {:.1}, content width {:.1}",
            format_index(i + 1),
            name,
            row.row_height,
            row.content_width
        ));

        let id_width = row
            .items
            .iter()
            .map(|item| item.artwork_id.chars().count())
            .max()
            .unwrap_or(0);
        for (j, item) in row.items.iter().enumerate() {
            let fallback = if item.resolved { "" } else { " (fallback)" };
            lines.push(format!(
                "{}{} {:<id_width$}  {:.1} × {:.1}{}",
                indent(1),
                format_index(j + 1),
                item.artwork_id,
                item.width,
                item.height,
                fallback
            ));
        }
    }

    let fallbacks: usize = rows.iter().map(RowLayout::fallback_count).sum();
    if fallbacks > 0 {
        lines.push(String::new());
        lines.push(format!(
            "{} could not be measured; fallback 3:2 used",
            plural(fallbacks, "image", "images")
        ));
    }
    lines
}

pub fn print_layout_output(snapshot: &CatalogSnapshot, rows: &[RowLayout]) {
    for line in format_layout_output(snapshot, rows) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ARTWORKS_FILE;
    use crate::config::LayoutConfig;
    use crate::layout::compute_row_layout;
    use crate::probe::{Dimensions, ProbeOutcome};
    use crate::test_helpers::{artwork, collection};
    use chrono::{DateTime, Utc};

    fn snapshot() -> CatalogSnapshot {
        let mut nocturnes = collection("nocturnes", &[]);
        nocturnes.name = "Nocturnes".into();
        nocturnes.description = "Night pieces".into();

        let mut swan = artwork("black-swan", "nocturnes");
        swan.title = "Black Swan".into();
        swan.price = "$1,200".into();
        swan.available = true;
        swan.featured = true;
        let mut river = artwork("RS-3", "nocturnes");
        river.title = "River Study".into();
        river.price = "sold".into();
        nocturnes.artworks = vec![swan, river];

        CatalogSnapshot::new(vec![nocturnes], DateTime::<Utc>::UNIX_EPOCH)
    }

    // =========================================================================
    // Build output
    // =========================================================================

    #[test]
    fn catalog_tree_lists_collections_and_artworks() {
        let lines = format_catalog(&snapshot());
        assert_eq!(
            lines,
            vec![
                "Collections",
                "001 Nocturnes (2 artworks)",
                "    Id: nocturnes",
                "    Description: Night pieces",
                "    001 Black Swan ★",
                "        Id: black-swan · $1,200 · available",
                "        Image: black-swan.jpg",
                "    002 River Study",
                "        Id: RS-3 · sold",
                "        Image: RS-3.jpg",
            ]
        );
    }

    #[test]
    fn empty_catalog_says_so() {
        let lines = format_catalog(&CatalogSnapshot::empty());
        assert_eq!(lines, vec!["Catalog is empty"]);
    }

    #[test]
    fn summary_pluralizes() {
        assert_eq!(format_summary(&snapshot()), "2 artworks in 1 collection, 1 featured");
        assert_eq!(
            format_summary(&CatalogSnapshot::empty()),
            "0 artworks in 0 collections, 0 featured"
        );
    }

    #[test]
    fn warnings_section_only_when_present() {
        assert!(format_warnings(&[]).is_empty());

        let warnings = vec![BuildWarning::SkippedRow {
            table: ARTWORKS_FILE,
            line: 4,
        }];
        let lines = format_build_output(&snapshot(), &warnings);
        assert!(lines.contains(&"Warnings".to_string()));
        assert!(lines.contains(&"    artworks.csv: row on line 4 has no title or id; skipped".to_string()));
        assert_eq!(lines.last().unwrap(), "2 artworks in 1 collection, 1 featured");
    }

    // =========================================================================
    // Layout output
    // =========================================================================

    #[test]
    fn layout_rows_show_geometry() {
        let row = compute_row_layout(
            "nocturnes",
            &[
                (
                    "black-swan".to_string(),
                    ProbeOutcome::Resolved(Dimensions {
                        width: 300,
                        height: 200,
                    }),
                ),
                (
                    "RS-3".to_string(),
                    ProbeOutcome::Resolved(Dimensions {
                        width: 200,
                        height: 250,
                    }),
                ),
            ],
            &LayoutConfig::default(),
        );
        let lines = format_layout_output(&snapshot(), &[row]);
        assert_eq!(
            lines,
            vec![
                "001 Nocturnes: row height 312.5, content width 718.8",
                "    001 black-swan  468.8 × 312.5",
                "    002 RS-3        250.0 × 312.5",
            ]
        );
    }

    #[test]
    fn layout_reports_fallbacks() {
        let row = compute_row_layout(
            "nocturnes",
            &[("black-swan".to_string(), ProbeOutcome::Fallback)],
            &LayoutConfig::default(),
        );
        let lines = format_layout_output(&snapshot(), &[row]);
        assert_eq!(lines[1], "    001 black-swan  300.0 × 200.0 (fallback)");
        assert_eq!(lines.last().unwrap(), "1 image could not be measured; fallback 3:2 used");
    }
}
