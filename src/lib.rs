//! # Folio
//!
//! An artwork catalog builder for portfolio sites. An inventory spreadsheet,
//! exported as CSV, is the data source: rows become artworks, the
//! `Collection` column groups them, and image files named after the artwork
//! ids supply the dimensions that shape each collection row.
//!
//! # Architecture: Build Once, Present Many Times
//!
//! Folio separates the one-shot catalog build from the interactive
//! presentation state that consumes it:
//!
//! ```text
//! 1. Parse     artworks.csv, collections.csv  →  records      (tabular)
//! 2. Build     records + config.toml          →  snapshot     (catalog)
//! 3. Probe     snapshot + images/             →  dimensions   (probe)
//! 4. Lay out   dimensions                     →  row geometry (layout)
//! 5. View      one artwork                    →  zoom / pan   (viewer)
//! ```
//!
//! Steps 1 and 2 are pure functions of the table text, the configuration, and
//! the build timestamp. The resulting [`types::CatalogSnapshot`] is immutable
//! and can be written to `catalog.json` and read back unchanged. Steps 3 to 5
//! are driven by a presentation layer; the probes run on a cooperative
//! single-threaded runtime and the viewer is a plain state machine advanced
//! one frame at a time.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tabular`] | Quote-aware CSV parsing with lenient recovery and header checks |
//! | [`metadata`] | Per-field resolution: ids, prices, availability, featured flag, tags |
//! | [`naming`] | Slugs and title words shared by ids, collections, and tags |
//! | [`ordering`] | Source, alphabetical, and seeded random ordering policies |
//! | [`catalog`] | Records to snapshot, collection resolution, build warnings |
//! | [`types`] | Catalog entities and the serialized `catalog.json` document |
//! | [`probe`] | Async image dimension probes and progressive placeholder swaps |
//! | [`layout`] | Uniform-height collection rows, render passes, row scrolling, swipes |
//! | [`viewer`] | Detail-view zoom, pan, momentum, and eased reset |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting: tree-based display of builds and layouts |
//!
//! # Design Decisions
//!
//! ## Messy Input Is Reported, Not Fatal
//!
//! Inventory spreadsheets are maintained by hand. A stray quote, a missing
//! title, or a typo in a collection name should not stop a catalog from being
//! published. The parser recovers, the builder skips or synthesizes, and every
//! recovery becomes a [`catalog::BuildWarning`] the CLI prints after the tree.
//! The one exception is `on_duplicate_id = "reject"`, for catalogs where a
//! reused id must be fixed before publishing.
//!
//! ## Reproducible Shuffles
//!
//! Random ordering draws from SHA-256 in counter mode, keyed by the seed and
//! a label naming the shuffled slice. Each collection's artworks get a label
//! derived from the collection id.
//!
//! ## Probes Never Fail
//!
//! A missing or undecodable image settles to a 3:2 fallback instead of an
//! error. Layout always completes; the fallback count is reported so the
//! catalog owner can fix the files.
//!
//! ## Stale Results Are Discarded, Not Cancelled
//!
//! Render passes and progressive image swaps carry a generation token. Work
//! started for a view that has since moved on runs to completion and its
//! result is dropped when the token no longer matches.

pub mod catalog;
pub mod config;
pub mod layout;
pub mod metadata;
pub mod naming;
pub mod ordering;
pub mod output;
pub mod probe;
pub mod tabular;
pub mod types;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_helpers;
