//! Shared test utilities for the folio test suite.
//!
//! Provides entity builders and lookup helpers that work with catalog data
//! structures (`CatalogSnapshot`, `Collection`, `Artwork`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let build = build_from_dir(tmp.path(), &CatalogConfig::default(), now).unwrap();
//!
//! let nocturnes = find_collection(&build.snapshot, "nocturnes");
//! let swan = find_artwork(&build.snapshot, "black-swan");
//! assert_eq!(swan.collection_id, nocturnes.id);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::{Artwork, CatalogSnapshot, Collection};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/catalog/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/catalog");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Entity builders
// =========================================================================

/// Minimal artwork: title is the id, image is `{id}.jpg`, everything else empty.
pub fn artwork(id: &str, collection_id: &str) -> Artwork {
    Artwork {
        id: id.to_string(),
        title: id.to_string(),
        collection_id: collection_id.to_string(),
        pricing_raw: String::new(),
        price: String::new(),
        dimensions_raw: String::new(),
        size_category: String::new(),
        notes: String::new(),
        description: String::new(),
        featured: false,
        available: false,
        tags: Vec::new(),
        image_ref: format!("{id}.jpg"),
        placeholder_ref: String::new(),
        source_order: 0,
    }
}

/// Collection named after its id holding minimal artworks, in the given order.
pub fn collection(id: &str, artwork_ids: &[&str]) -> Collection {
    Collection {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        notes: String::new(),
        artworks: artwork_ids
            .iter()
            .enumerate()
            .map(|(i, artwork_id)| Artwork {
                source_order: i,
                ..artwork(artwork_id, id)
            })
            .collect(),
    }
}

// =========================================================================
// Snapshot lookups (panic with a clear message on miss)
// =========================================================================

/// Find a collection by id. Panics if not found.
pub fn find_collection<'a>(snapshot: &'a CatalogSnapshot, id: &str) -> &'a Collection {
    snapshot.collection(id).unwrap_or_else(|| {
        let ids: Vec<&str> = snapshot.collections.iter().map(|c| c.id.as_str()).collect();
        panic!("collection '{id}' not found. Available: {ids:?}")
    })
}

/// Find an artwork by id in any collection. Panics if not found.
pub fn find_artwork<'a>(snapshot: &'a CatalogSnapshot, id: &str) -> &'a Artwork {
    snapshot.artwork(id).unwrap_or_else(|| {
        let ids: Vec<&str> = snapshot.artworks().map(|a| a.id.as_str()).collect();
        panic!("artwork '{id}' not found. Available: {ids:?}")
    })
}
