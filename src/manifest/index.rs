//! Indexed view of a node library manifest.
//!
//! The index enforces the manifest schema and the cross-reference rules in
//! `validation`, then provides lookup by category key and node class name. It
//! is strict about duplicates and unknown schema versions so the engine never
//! binds a library whose tables disagree with each other.

use crate::manifest::{
    Category, CategoryKey, ClassName, LibrarySchemaVersion, Manifest, NodeDescriptor,
    parse_manifest,
};
use crate::schema_loader::{SchemaSource, validate_document};
use crate::validation::{DanglingCategoryPolicy, ManifestIssue, validate_manifest};
use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Options applied while building an index.
#[derive(Clone, Debug, Default)]
pub struct IndexOptions {
    pub schema: SchemaSource,
    pub dangling_category: DanglingCategoryPolicy,
}

#[derive(Debug)]
/// Manifest plus derived indexes keyed by category key and class name.
pub struct ManifestIndex {
    manifest: Manifest,
    source: Option<PathBuf>,
    categories: BTreeMap<CategoryKey, Category>,
    nodes: BTreeMap<ClassName, NodeDescriptor>,
    warnings: Vec<ManifestIssue>,
}

impl ManifestIndex {
    /// Load, schema-check and index a manifest from disk.
    pub fn load(path: &Path, options: &IndexOptions) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let document: Value =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        validate_document(&options.schema, &document, path)?;

        let manifest = parse_manifest(&data).with_context(|| format!("loading {}", path.display()))?;
        let mut index = Self::from_manifest(manifest, &options.dangling_category)
            .with_context(|| format!("indexing {}", path.display()))?;
        index.source = Some(path.to_path_buf());
        log::info!(
            "loaded library '{}' from {} ({} categories, {} nodes)",
            index.name(),
            path.display(),
            index.categories.len(),
            index.nodes.len()
        );
        Ok(index)
    }

    /// Index an already parsed manifest. Skips JSON Schema validation; the
    /// cross-reference rules still apply.
    pub fn from_manifest(manifest: Manifest, policy: &DanglingCategoryPolicy) -> Result<Self> {
        let issues = validate_manifest(&manifest, policy);
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ManifestIssue::is_error);
        if !errors.is_empty() {
            let details = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            bail!("library '{}' is invalid:\n{}", manifest.name, details);
        }
        for warning in &warnings {
            log::warn!("library '{}': {warning}", manifest.name);
        }

        let categories: BTreeMap<CategoryKey, Category> = manifest
            .category_entries()
            .map(|(key, category)| (key.clone(), category.clone()))
            .collect();

        let mut nodes = BTreeMap::new();
        for node in &manifest.nodes {
            let mut node = node.clone();
            if !categories.contains_key(node.category()) {
                let DanglingCategoryPolicy::Fallback(fallback) = policy else {
                    bail!(
                        "node {} references unknown category {}",
                        node.class_name,
                        node.category()
                    );
                };
                if !categories.contains_key(fallback) {
                    bail!("fallback category '{fallback}' is not declared in the manifest");
                }
                log::warn!(
                    "node {} moved from unknown category '{}' to '{}'",
                    node.class_name,
                    node.category(),
                    fallback
                );
                node.metadata.category = fallback.clone();
            }
            nodes.insert(node.class_name.clone(), node);
        }

        Ok(Self {
            manifest,
            source: None,
            categories,
            nodes,
            warnings,
        })
    }

    /// Library name declared in the manifest.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn schema_version(&self) -> &LibrarySchemaVersion {
        &self.manifest.library_schema_version
    }

    /// Path the manifest was loaded from, when loaded from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Default library root: the directory holding the manifest.
    pub fn default_root(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    /// Resolve a category by key.
    ///
    /// Returns `None` instead of erroring; callers surface errors with the
    /// context that referenced the missing key.
    pub fn category(&self, key: &CategoryKey) -> Option<&Category> {
        self.categories.get(key)
    }

    pub fn require_category(&self, key: &CategoryKey) -> Result<&Category> {
        self.category(key)
            .ok_or_else(|| anyhow!("library '{}' has no category '{key}'", self.name()))
    }

    /// Resolve a node descriptor by class name. Dangling categories have
    /// already been rewritten according to the policy.
    pub fn node(&self, class_name: &ClassName) -> Option<&NodeDescriptor> {
        self.nodes.get(class_name)
    }

    pub fn require_node(&self, class_name: &ClassName) -> Result<&NodeDescriptor> {
        self.node(class_name)
            .ok_or_else(|| anyhow!("library '{}' has no node '{class_name}'", self.name()))
    }

    /// The category a node is presented under.
    pub fn category_of(&self, class_name: &ClassName) -> Option<(&CategoryKey, &Category)> {
        let node = self.node(class_name)?;
        self.categories.get_key_value(node.category())
    }

    /// Iterates categories in stable key order.
    pub fn categories(&self) -> impl Iterator<Item = (&CategoryKey, &Category)> {
        self.categories.iter()
    }

    /// Iterates node descriptors in stable class-name order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.values()
    }

    pub fn nodes_in_category<'a>(
        &'a self,
        key: &'a CategoryKey,
    ) -> impl Iterator<Item = &'a NodeDescriptor> + 'a {
        self.nodes.values().filter(move |node| node.category() == key)
    }

    /// Non-fatal findings recorded while indexing.
    pub fn warnings(&self) -> &[ManifestIssue] {
        &self.warnings
    }

    /// The manifest as parsed; node categories are not rewritten here.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}
