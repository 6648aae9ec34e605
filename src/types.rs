//! Catalog entities and the serialized catalog document.
//!
//! A [`CatalogSnapshot`] is the unit handed to the rendering layer: an
//! immutable value built once per catalog build. On disk it is a JSON
//! document keyed by collection id:
//!
//! ```json
//! {
//!   "collections": {
//!     "nocturnes": { "id": "nocturnes", "name": "Nocturnes", "description": "",
//!                    "notes": "", "artworks": [ { "id": "black-swan", ... } ] }
//!   },
//!   "meta": { "generatedAt": "2026-01-01T00:00:00Z", "totalArtworks": 1,
//!             "collectionsCount": 1, "featuredCount": 0 }
//! }
//! ```
//!
//! Collection order is meaningful (it is the applied ordering policy), so the
//! `collections` object is written and read back in insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    /// Unique within a catalog build: explicit `ID` column or slug of the title.
    pub id: String,
    pub title: String,
    pub collection_id: String,
    /// Pricing column verbatim.
    pub pricing_raw: String,
    /// First currency amount found in the pricing column, else the raw text.
    pub price: String,
    pub dimensions_raw: String,
    pub size_category: String,
    pub notes: String,
    pub description: String,
    pub featured: bool,
    pub available: bool,
    /// Ordered, duplicate-free.
    pub tags: Vec<String>,
    pub image_ref: String,
    /// Low-resolution reference for progressive loading, if configured.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placeholder_ref: String,
    /// Index of the row in the inventory table.
    pub source_order: usize,
}

/// A named, ordered group of artworks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: String,
    pub notes: String,
    pub artworks: Vec<Artwork>,
}

/// Summary counters written alongside the collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeta {
    pub generated_at: DateTime<Utc>,
    pub total_artworks: usize,
    pub collections_count: usize,
    pub featured_count: usize,
}

/// Immutable result of a catalog build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(with = "collections_by_id")]
    pub collections: Vec<Collection>,
    pub meta: CatalogMeta,
}

impl CatalogSnapshot {
    /// Assemble a snapshot and compute its counters.
    pub fn new(collections: Vec<Collection>, generated_at: DateTime<Utc>) -> Self {
        let total_artworks = collections.iter().map(|c| c.artworks.len()).sum();
        let featured_count = collections
            .iter()
            .flat_map(|c| &c.artworks)
            .filter(|a| a.featured)
            .count();
        let collections_count = collections.len();
        Self {
            collections,
            meta: CatalogMeta {
                generated_at,
                total_artworks,
                collections_count,
                featured_count,
            },
        }
    }

    /// A catalog with no collections, used when loading fails.
    pub fn empty() -> Self {
        Self::new(Vec::new(), DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// All artworks, collection by collection, in display order.
    pub fn artworks(&self) -> impl Iterator<Item = &Artwork> {
        self.collections.iter().flat_map(|c| c.artworks.iter())
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn artwork(&self, id: &str) -> Option<&Artwork> {
        self.artworks().find(|a| a.id == id)
    }

    /// Load a snapshot written by [`save`](Self::save).
    ///
    /// Returns an empty catalog if the file is missing or cannot be parsed;
    /// presentation decides how to show an empty catalog.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "catalog not readable, using empty catalog");
                return Self::empty();
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "catalog not parseable, using empty catalog");
                Self::empty()
            }
        }
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

/// Collections as a JSON object keyed by id, preserving sequence order.
mod collections_by_id {
    use super::Collection;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(collections: &[Collection], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(collections.len()))?;
        for collection in collections {
            map.serialize_entry(&collection.id, collection)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Collection>, D::Error> {
        struct OrderedCollections;

        impl<'de> Visitor<'de> for OrderedCollections {
            type Value = Vec<Collection>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of collections keyed by id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut collections = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, mut collection)) =
                    access.next_entry::<String, Collection>()?
                {
                    if collection.id.is_empty() {
                        collection.id = key;
                    }
                    collections.push(collection);
                }
                Ok(collections)
            }
        }

        d.deserialize_map(OrderedCollections)
    }
}
