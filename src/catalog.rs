//! Catalog building: inventory records to an immutable [`CatalogSnapshot`].
//!
//! Building is a pure function of the parsed tables, the configuration, and
//! the build timestamp. Only [`SourceTables::read`] and [`build_source`]
//! touch the filesystem, loading the source tables and `config.toml` from a
//! catalog directory:
//!
//! ```text
//! catalog/
//! ├── artworks.csv       # Inventory: Title, ID, Collection, Pricing, ...
//! ├── collections.csv    # Optional: Title, ID, Description, Notes
//! ├── config.toml        # Optional, see config module
//! └── images/
//! ```
//!
//! ## Collection resolution
//!
//! Collections listed in `collections.csv` are seeded first, in table order.
//! Each artwork's `Collection` value is then resolved:
//!
//! 1. Empty → the synthetic `uncategorized` collection
//! 2. Exact match on a known collection id
//! 3. Case-insensitive match on a seeded collection's name
//! 4. Otherwise a synthetic collection is created, using the value verbatim
//!    as both id and name
//!
//! Collections that end up without artworks are dropped.
//!
//! ## Problems
//!
//! The build never fails on messy input. Skipped rows, synthetic collections,
//! parse recoveries, and header mismatches are collected as [`BuildWarning`]s
//! and logged. The only hard error is a duplicate id under
//! [`DuplicatePolicy::Reject`].

use crate::config::{CatalogConfig, ColumnsConfig, ConfigError, DuplicatePolicy, load_config};
use crate::metadata::{
    artwork_id, derive_tags, image_reference, parse_availability, parse_featured, parse_price,
    resolve,
};
use crate::naming::{UNCATEGORIZED, slug};
use crate::ordering::{apply_order, resolve_seed};
use crate::tabular::{Diagnostic, ParsedTable, Record, Schema, parse_table};
use crate::types::{Artwork, CatalogSnapshot, Collection};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const ARTWORKS_FILE: &str = "artworks.csv";
pub const COLLECTIONS_FILE: &str = "collections.csv";
/// Serialized catalog document written by `folio build`.
pub const CATALOG_FILE: &str = "catalog.json";

const TITLE: &str = "Title";
const ID: &str = "ID";
const COLLECTION: &str = "Collection";
const PRICING: &str = "Pricing";
const DIMENSIONS: &str = "Dimensions";
const SIZE: &str = "Size";
const NOTES: &str = "Notes";
const EXTENDED_DESCRIPTION: &str = "Extended description";
const DESCRIPTION: &str = "Description";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Duplicate id '{id}' in {table}: lines {first} and {duplicate}")]
    DuplicateId {
        table: &'static str,
        id: String,
        first: usize,
        duplicate: usize,
    },
}

/// A non-fatal problem found while building. Line numbers are the 1-based
/// physical lines where the affected rows start, as in [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// The parser recovered from malformed input.
    Parse {
        table: &'static str,
        diagnostic: Diagnostic,
    },
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },
    UnknownColumns {
        table: &'static str,
        columns: Vec<String>,
    },
    /// A row had neither a title nor an id.
    SkippedRow { table: &'static str, line: usize },
    /// A later row reused an id; it was dropped.
    DuplicateId {
        table: &'static str,
        id: String,
        first: usize,
        duplicate: usize,
    },
    /// An artwork referenced a collection that was not seeded.
    SyntheticCollection { id: String },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse {
                table,
                diagnostic: Diagnostic::UnterminatedQuote { line },
            } => write!(
                f,
                "{table}: quoted field starting on line {line} is never closed; read to end of file"
            ),
            Self::Parse {
                table,
                diagnostic:
                    Diagnostic::ExtraValues {
                        line,
                        expected,
                        found,
                    },
            } => write!(
                f,
                "{table}: line {line} has {found} values for {expected} columns; extras ignored"
            ),
            Self::MissingColumns { table, columns } => {
                write!(f, "{table}: missing required columns: {}", columns.join(", "))
            }
            Self::UnknownColumns { table, columns } => {
                write!(f, "{table}: unrecognised columns ignored: {}", columns.join(", "))
            }
            Self::SkippedRow { table, line } => {
                write!(f, "{table}: row on line {line} has no title or id; skipped")
            }
            Self::DuplicateId {
                table,
                id,
                first,
                duplicate,
            } => write!(
                f,
                "{table}: id '{id}' on line {duplicate} already used on line {first}; later row dropped"
            ),
            Self::SyntheticCollection { id } => {
                write!(f, "collection '{id}' is not listed; created from artwork reference")
            }
        }
    }
}

/// Result of a catalog build.
#[derive(Debug, Clone)]
pub struct CatalogBuild {
    pub snapshot: CatalogSnapshot,
    pub warnings: Vec<BuildWarning>,
}

/// Expected header of the inventory table.
pub fn artwork_schema(columns: &ColumnsConfig) -> Schema {
    Schema::new(
        &[TITLE],
        &[
            ID,
            COLLECTION,
            PRICING,
            DIMENSIONS,
            SIZE,
            columns.featured.as_str(),
            NOTES,
            EXTENDED_DESCRIPTION,
            columns.image.as_str(),
        ],
    )
}

/// Expected header of the collections table.
pub fn collection_schema() -> Schema {
    Schema::new(&[TITLE], &[ID, DESCRIPTION, NOTES])
}

/// The parsed source tables of one catalog directory.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub artworks: ParsedTable,
    pub collections: Option<ParsedTable>,
}

impl SourceTables {
    /// Parse table text already in memory.
    pub fn parse(artworks: &str, collections: Option<&str>, columns: &ColumnsConfig) -> Self {
        Self {
            artworks: parse_table(artworks, &artwork_schema(columns)),
            collections: collections.map(|text| parse_table(text, &collection_schema())),
        }
    }

    /// Read `artworks.csv` and, when present, `collections.csv` from `source`.
    pub fn read(source: &Path, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let artworks = std::fs::read_to_string(source.join(ARTWORKS_FILE))?;
        let collections_path = source.join(COLLECTIONS_FILE);
        let collections = if collections_path.exists() {
            Some(std::fs::read_to_string(collections_path)?)
        } else {
            None
        };
        Ok(Self::parse(&artworks, collections.as_deref(), &config.columns))
    }

    /// Parse recoveries and header mismatches, as warnings.
    pub fn diagnostics(&self) -> Vec<BuildWarning> {
        let mut warnings = table_warnings(ARTWORKS_FILE, &self.artworks);
        if let Some(collections) = &self.collections {
            warnings.extend(table_warnings(COLLECTIONS_FILE, collections));
        }
        warnings
    }

    /// Build the catalog, with table diagnostics ahead of build warnings.
    pub fn build(
        &self,
        config: &CatalogConfig,
        generated_at: DateTime<Utc>,
    ) -> Result<CatalogBuild, CatalogError> {
        let mut build = build_catalog(
            &self.artworks.records,
            self.collections.as_ref().map(|t| t.records.as_slice()),
            config,
            generated_at,
        )?;
        let mut warnings = self.diagnostics();
        warnings.append(&mut build.warnings);
        build.warnings = warnings;
        Ok(build)
    }
}

fn table_warnings(table: &'static str, parsed: &ParsedTable) -> Vec<BuildWarning> {
    let mut warnings: Vec<BuildWarning> = parsed
        .diagnostics
        .iter()
        .map(|d| BuildWarning::Parse {
            table,
            diagnostic: d.clone(),
        })
        .collect();
    if !parsed.schema.missing_required.is_empty() {
        warnings.push(BuildWarning::MissingColumns {
            table,
            columns: parsed.schema.missing_required.clone(),
        });
    }
    if !parsed.schema.unknown_columns.is_empty() {
        warnings.push(BuildWarning::UnknownColumns {
            table,
            columns: parsed.schema.unknown_columns.clone(),
        });
    }
    warnings
}

/// Read, build, and return the catalog for a source directory.
pub fn build_from_dir(
    source: &Path,
    config: &CatalogConfig,
    generated_at: DateTime<Utc>,
) -> Result<CatalogBuild, CatalogError> {
    SourceTables::read(source, config)?.build(config, generated_at)
}

/// Load the directory's `config.toml`, then build its catalog.
pub fn build_source(source: &Path, generated_at: DateTime<Utc>) -> Result<CatalogBuild, CatalogError> {
    let config = load_config(source)?;
    build_from_dir(source, &config, generated_at)
}

/// Build a catalog from inventory records and optional collection records.
#[tracing::instrument(skip_all, fields(rows = artworks.len()))]
pub fn build_catalog(
    artworks: &[Record],
    collections: Option<&[Record]>,
    config: &CatalogConfig,
    generated_at: DateTime<Utc>,
) -> Result<CatalogBuild, CatalogError> {
    let mut builder = Builder::new(config);
    for record in collections.unwrap_or_default() {
        builder.seed_collection(record)?;
    }
    for (index, record) in artworks.iter().enumerate() {
        builder.add_artwork(index, record)?;
    }
    Ok(builder.finish(generated_at))
}

struct Builder<'a> {
    config: &'a CatalogConfig,
    collections: Vec<Collection>,
    /// Collection id → position in `collections`.
    collection_index: HashMap<String, usize>,
    /// Number of collections seeded from the collections table.
    seeded: usize,
    /// Seeded collection id → source line of the row that claimed it.
    collection_lines: HashMap<String, usize>,
    /// Artwork id → source line of the row that claimed it.
    artwork_lines: HashMap<String, usize>,
    warnings: Vec<BuildWarning>,
}

impl<'a> Builder<'a> {
    fn new(config: &'a CatalogConfig) -> Self {
        Self {
            config,
            collections: Vec::new(),
            collection_index: HashMap::new(),
            seeded: 0,
            collection_lines: HashMap::new(),
            artwork_lines: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: BuildWarning) {
        tracing::warn!(%warning, "catalog build");
        self.warnings.push(warning);
    }

    /// Apply the duplicate policy. Returns `false` when the row must be dropped.
    fn claim_id(
        &mut self,
        table: &'static str,
        id: &str,
        line: usize,
        first: Option<usize>,
    ) -> Result<bool, CatalogError> {
        let Some(first) = first else {
            return Ok(true);
        };
        match self.config.on_duplicate_id {
            DuplicatePolicy::Reject => Err(CatalogError::DuplicateId {
                table,
                id: id.to_string(),
                first,
                duplicate: line,
            }),
            DuplicatePolicy::KeepFirst => {
                self.warn(BuildWarning::DuplicateId {
                    table,
                    id: id.to_string(),
                    first,
                    duplicate: line,
                });
                Ok(false)
            }
        }
    }

    fn seed_collection(&mut self, record: &Record) -> Result<(), CatalogError> {
        let line = record.line();
        let Some(name) = resolve(&[record.get(TITLE), record.get(ID)]) else {
            self.warn(BuildWarning::SkippedRow {
                table: COLLECTIONS_FILE,
                line,
            });
            return Ok(());
        };
        let id = resolve(&[record.get(ID)]).unwrap_or_else(|| slug(&name));

        let first = self.collection_lines.get(&id).copied();
        if !self.claim_id(COLLECTIONS_FILE, &id, line, first)? {
            return Ok(());
        }
        self.collection_lines.insert(id.clone(), line);

        self.collection_index.insert(id.clone(), self.collections.len());
        self.collections.push(Collection {
            id,
            name,
            description: record.value(DESCRIPTION).to_string(),
            notes: record.value(NOTES).to_string(),
            artworks: Vec::new(),
        });
        self.seeded = self.collections.len();
        Ok(())
    }

    fn add_artwork(&mut self, index: usize, record: &Record) -> Result<(), CatalogError> {
        let line = record.line();
        let explicit_id = record.non_empty(ID);
        let Some(title) = resolve(&[record.get(TITLE), explicit_id]) else {
            self.warn(BuildWarning::SkippedRow {
                table: ARTWORKS_FILE,
                line,
            });
            return Ok(());
        };
        let id = artwork_id(explicit_id, &title);

        let first = self.artwork_lines.get(&id).copied();
        if !self.claim_id(ARTWORKS_FILE, &id, line, first)? {
            return Ok(());
        }
        self.artwork_lines.insert(id.clone(), line);

        let slot = self.resolve_collection(record.value(COLLECTION));
        let artwork = self.artwork(record, id, title, index, &self.collections[slot].id);
        self.collections[slot].artworks.push(artwork);
        Ok(())
    }

    fn artwork(
        &self,
        record: &Record,
        id: String,
        title: String,
        source_order: usize,
        collection_id: &str,
    ) -> Artwork {
        let columns = &self.config.columns;
        let images = &self.config.images;
        let pricing = record.value(PRICING);
        let description = record.value(EXTENDED_DESCRIPTION);

        let image_ref = record
            .non_empty(&columns.image)
            .map(String::from)
            .unwrap_or_else(|| image_reference(&images.pattern, &id));
        let placeholder_ref = if images.placeholder_pattern.is_empty() {
            String::new()
        } else {
            image_reference(&images.placeholder_pattern, &id)
        };

        Artwork {
            collection_id: collection_id.to_string(),
            pricing_raw: pricing.to_string(),
            price: parse_price(pricing),
            dimensions_raw: record.value(DIMENSIONS).to_string(),
            size_category: record.value(SIZE).to_string(),
            notes: record.value(NOTES).to_string(),
            description: description.to_string(),
            featured: parse_featured(record.value(&columns.featured), &columns.featured_flag),
            available: parse_availability(pricing, &columns.sold_marker),
            tags: derive_tags(&title, description, &self.config.tags.keywords),
            image_ref,
            placeholder_ref,
            source_order,
            id,
            title,
        }
    }

    /// Position of the collection an artwork's `Collection` value refers to,
    /// synthesizing one when nothing matches.
    fn resolve_collection(&mut self, reference: &str) -> usize {
        let reference = reference.trim();
        let id = if reference.is_empty() {
            UNCATEGORIZED
        } else {
            reference
        };

        if let Some(&slot) = self.collection_index.get(id) {
            return slot;
        }
        let by_name = self.collections[..self.seeded]
            .iter()
            .position(|c| c.name.to_lowercase() == id.to_lowercase());
        if let Some(slot) = by_name {
            return slot;
        }

        self.warn(BuildWarning::SyntheticCollection { id: id.to_string() });
        let slot = self.collections.len();
        self.collection_index.insert(id.to_string(), slot);
        self.collections.push(Collection {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            notes: String::new(),
            artworks: Vec::new(),
        });
        slot
    }

    fn finish(self, generated_at: DateTime<Utc>) -> CatalogBuild {
        let config = self.config;
        let seed = resolve_seed(config.shuffle_seed, generated_at);

        let mut collections: Vec<Collection> = self
            .collections
            .into_iter()
            .filter(|c| {
                if c.artworks.is_empty() {
                    tracing::debug!(collection = %c.id, "dropping collection without artworks");
                }
                !c.artworks.is_empty()
            })
            .collect();

        for collection in &mut collections {
            let label = format!("artworks:{}", collection.id);
            apply_order(
                &mut collection.artworks,
                config.artwork_order,
                |a| a.title.as_str(),
                seed,
                &label,
            );
        }
        apply_order(
            &mut collections,
            config.collection_order,
            |c| c.name.as_str(),
            seed,
            "collections",
        );

        let snapshot = CatalogSnapshot::new(collections, generated_at);
        tracing::debug!(
            artworks = snapshot.meta.total_artworks,
            collections = snapshot.meta.collections_count,
            "catalog built"
        );
        CatalogBuild {
            snapshot,
            warnings: self.warnings,
        }
    }
}
