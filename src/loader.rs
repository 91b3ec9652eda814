//! Load plan: resolve every node entry against a library root.
//!
//! For each descriptor the loader checks that `file_path` stays inside the
//! root, names an existing file, and that the file defines `class_name`.
//! Nothing is imported or executed; the report tells the engine which nodes
//! it can bind and why the rest failed.

use crate::config::LoaderConfig;
use crate::manifest::{Category, CategoryKey, ClassName, ManifestIndex, NodeDescriptor};
use crate::source_scan::scan_class_definitions;
use crate::validation::check_relative_path;
use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when a single node cannot be resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartialFailurePolicy {
    /// Record the failure and keep loading the remaining nodes.
    #[default]
    SkipNode,
    /// Fail the whole library on the first unresolvable node.
    AbortLibrary,
}

#[derive(Clone, Debug, Serialize)]
/// A node whose source file and class were found.
pub struct ResolvedNode {
    pub class_name: ClassName,
    pub display_name: String,
    pub category: CategoryKey,
    pub category_title: String,
    pub source: PathBuf,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeFailure {
    pub class_name: ClassName,
    pub file_path: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize)]
/// Outcome of resolving a library: loaded nodes and per-node failures, both
/// in class-name order.
pub struct LoadReport {
    pub library: String,
    pub root: PathBuf,
    pub loaded: Vec<ResolvedNode>,
    pub failed: Vec<NodeFailure>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct LibraryLoader<'a> {
    config: &'a LoaderConfig,
}

impl<'a> LibraryLoader<'a> {
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// The root node paths resolve against: the configured override, else the
    /// directory containing the manifest.
    pub fn library_root(&self, index: &ManifestIndex) -> Result<PathBuf> {
        let root = match (&self.config.root, index.default_root()) {
            (Some(root), _) => root.clone(),
            (None, Some(parent)) if parent.as_os_str().is_empty() => PathBuf::from("."),
            (None, Some(parent)) => parent.to_path_buf(),
            (None, None) => bail!(
                "library '{}' was not loaded from disk; configure a library root",
                index.name()
            ),
        };
        fs::canonicalize(&root)
            .with_context(|| format!("Unable to canonicalize library root {}", root.display()))
    }

    pub fn resolve(&self, index: &ManifestIndex) -> Result<LoadReport> {
        let root = self.library_root(index)?;
        let mut report = LoadReport {
            library: index.name().to_string(),
            root: root.clone(),
            ..Default::default()
        };

        for node in index.nodes() {
            match resolve_node(&root, node) {
                Ok(source) => {
                    let category = index.require_category(node.category())?;
                    log::debug!("resolved {} -> {}", node.class_name, source.display());
                    report.loaded.push(resolved(node, category, source));
                }
                Err(err) => {
                    if self.config.partial_failure == PartialFailurePolicy::AbortLibrary {
                        return Err(err).with_context(|| {
                            format!("library '{}' aborted loading", index.name())
                        });
                    }
                    log::warn!("skipping node {}: {err:#}", node.class_name);
                    report.failed.push(NodeFailure {
                        class_name: node.class_name.clone(),
                        file_path: node.file_path.clone(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }

        log::info!(
            "library '{}': {} nodes resolved, {} failed",
            report.library,
            report.loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn resolved(node: &NodeDescriptor, category: &Category, source: PathBuf) -> ResolvedNode {
    ResolvedNode {
        class_name: node.class_name.clone(),
        display_name: node.display_name().to_string(),
        category: node.category().clone(),
        category_title: category.title.clone(),
        source,
    }
}

/// Resolve one node's source file under `root` (already canonical) and
/// confirm it defines the node's class.
///
/// Canonicalization rejects symlinks or relative segments that would escape
/// the library root.
pub fn resolve_node(root: &Path, node: &NodeDescriptor) -> Result<PathBuf> {
    check_relative_path(&node.file_path)
        .map_err(|reason| anyhow!("invalid file_path '{}': {reason}", node.file_path))?;

    let candidate = root.join(&node.file_path);
    if !candidate.is_file() {
        bail!("source file not found: {}", candidate.display());
    }
    let canonical = fs::canonicalize(&candidate)
        .with_context(|| format!("Unable to canonicalize {}", candidate.display()))?;
    if !canonical.starts_with(root) {
        bail!(
            "source file {} resolves outside the library root {}",
            canonical.display(),
            root.display()
        );
    }

    let classes = scan_class_definitions(&canonical)?;
    if !classes.contains(&node.class_name) {
        bail!(
            "class {} is not defined in {}",
            node.class_name,
            canonical.display()
        );
    }
    Ok(canonical)
}
