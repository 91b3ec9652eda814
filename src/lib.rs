//! Shared library for node library manifests.
//!
//! The crate exposes the manifest model (categories, node descriptors), a
//! validated index for lookups, and the load plan that checks node sources
//! against a library root. Public functions here form the contract the
//! `node-manifest` binary and embedding engines depend on.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub mod config;
pub mod loader;
pub mod manifest;
mod schema_loader;
pub mod source_scan;
pub mod validation;

pub use config::LoaderConfig;
pub use loader::{LibraryLoader, LoadReport, NodeFailure, PartialFailurePolicy, ResolvedNode};
pub use manifest::{
    Category, CategoryEntry, CategoryKey, ClassName, IndexOptions, LibraryMetadata,
    LibraryRepository, LibrarySchemaVersion, Manifest, ManifestIndex, NodeDescriptor,
    NodeMetadata, load_manifest_from_path, parse_manifest,
};
pub use schema_loader::SchemaSource;
pub use validation::{
    DanglingCategoryPolicy, ManifestIssue, Severity, check_relative_path, validate_manifest,
};

/// Schema-check and parse a manifest, then collect every cross-reference
/// finding instead of stopping at the first error.
///
/// Malformed documents (unreadable, invalid JSON, schema violations) are still
/// errors because no findings can be computed for them.
pub fn check_manifest(path: &Path, options: &IndexOptions) -> Result<Vec<ManifestIssue>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document: Value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    schema_loader::validate_document(&options.schema, &document, path)?;
    // Parse the text, not the `Value`: a map would merge repeated category keys.
    let manifest = parse_manifest(&data).with_context(|| format!("loading {}", path.display()))?;
    Ok(validate_manifest(&manifest, &options.dangling_category))
}

/// Load a manifest and resolve every node against the library root.
///
/// Manifest-level problems (unreadable file, schema violation, duplicate or
/// dangling references under the reject policy) are errors; per-node
/// resolution failures land in the report unless the config aborts on them.
pub fn load_library(path: &Path, config: &LoaderConfig) -> Result<(ManifestIndex, LoadReport)> {
    let index = ManifestIndex::load(path, &config.index_options())?;
    let report = LibraryLoader::new(config).resolve(&index)?;
    Ok((index, report))
}
