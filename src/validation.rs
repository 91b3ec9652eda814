//! Cross-reference checks over a parsed manifest.
//!
//! Used by `ManifestIndex::load` and the `validate` subcommand to make sure
//! node entries only reference known categories, class names are unique, and
//! file paths stay relative to the library root. Every finding is collected so
//! callers can surface all problems at once.

use crate::manifest::{CategoryKey, ClassName, Manifest};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path};
use thiserror::Error;

/// How a node whose category is missing from the category table is treated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DanglingCategoryPolicy {
    /// The manifest fails to load.
    #[default]
    Reject,
    /// Warn and present the node under the given (existing) category.
    Fallback(CategoryKey),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ManifestIssue {
    #[error("node class '{0}' is declared more than once")]
    DuplicateClassName(ClassName),
    #[error("category '{0}' is declared more than once")]
    DuplicateCategory(CategoryKey),
    #[error("node '{class_name}' references unknown category '{category}'")]
    UnknownCategory {
        class_name: ClassName,
        category: CategoryKey,
        severity: Severity,
    },
    #[error("node '{class_name}' has invalid file_path '{file_path}': {reason}")]
    InvalidFilePath {
        class_name: ClassName,
        file_path: String,
        reason: &'static str,
    },
    #[error("{location} must not be empty")]
    EmptyField { location: String },
    #[error("fallback category '{0}' is not declared in the manifest")]
    UnknownFallbackCategory(CategoryKey),
    #[error("category '{0}' is not used by any node")]
    UnusedCategory(CategoryKey),
    #[error("categories {} share the description '{description}'", join_keys(.keys))]
    SharedCategoryDescription {
        keys: Vec<CategoryKey>,
        description: String,
    },
}

impl ManifestIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ManifestIssue::UnknownCategory { severity, .. } => *severity,
            ManifestIssue::UnusedCategory(_) | ManifestIssue::SharedCategoryDescription { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

fn join_keys(keys: &[CategoryKey]) -> String {
    keys.iter()
        .map(|key| format!("'{key}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run every cross-reference check and return the findings in a stable order
/// (document order within each check).
pub fn validate_manifest(
    manifest: &Manifest,
    policy: &DanglingCategoryPolicy,
) -> Vec<ManifestIssue> {
    let mut issues = Vec::new();

    if manifest.name.trim().is_empty() {
        issues.push(ManifestIssue::EmptyField {
            location: "name".to_string(),
        });
    }

    let mut category_keys: BTreeSet<&CategoryKey> = BTreeSet::new();
    for (key, category) in manifest.category_entries() {
        if !category_keys.insert(key) {
            issues.push(ManifestIssue::DuplicateCategory(key.clone()));
        }
        if key.as_str().trim().is_empty() {
            issues.push(ManifestIssue::EmptyField {
                location: "category key".to_string(),
            });
        }
        if category.title.trim().is_empty() {
            issues.push(ManifestIssue::EmptyField {
                location: format!("categories.{key}.title"),
            });
        }
    }

    let unknown_severity = match policy {
        DanglingCategoryPolicy::Reject => Severity::Error,
        DanglingCategoryPolicy::Fallback(_) => Severity::Warning,
    };

    let mut class_names: BTreeSet<&ClassName> = BTreeSet::new();
    let mut used_categories: BTreeSet<&CategoryKey> = BTreeSet::new();
    let mut any_dangling = false;
    for node in &manifest.nodes {
        let class_name = &node.class_name;
        if class_name.as_str().trim().is_empty() {
            issues.push(ManifestIssue::EmptyField {
                location: "nodes[].class_name".to_string(),
            });
        } else if !class_names.insert(class_name) {
            issues.push(ManifestIssue::DuplicateClassName(class_name.clone()));
        }

        if node.display_name().trim().is_empty() {
            issues.push(ManifestIssue::EmptyField {
                location: format!("nodes.{class_name}.metadata.display_name"),
            });
        }

        if let Err(reason) = check_relative_path(&node.file_path) {
            issues.push(ManifestIssue::InvalidFilePath {
                class_name: class_name.clone(),
                file_path: node.file_path.clone(),
                reason,
            });
        }

        let category = node.category();
        used_categories.insert(category);
        if !category_keys.contains(category) {
            any_dangling = true;
            issues.push(ManifestIssue::UnknownCategory {
                class_name: class_name.clone(),
                category: category.clone(),
                severity: unknown_severity,
            });
        }
    }

    // Re-homed nodes are presented under the fallback, so it counts as used.
    if let DanglingCategoryPolicy::Fallback(fallback) = policy {
        if any_dangling {
            if category_keys.contains(fallback) {
                used_categories.insert(fallback);
            } else {
                issues.push(ManifestIssue::UnknownFallbackCategory(fallback.clone()));
            }
        }
    }

    for key in &category_keys {
        if !used_categories.contains(key) {
            issues.push(ManifestIssue::UnusedCategory((*key).clone()));
        }
    }

    issues.extend(shared_descriptions(manifest));
    issues
}

// Reported only; the category text is left as written.
fn shared_descriptions(manifest: &Manifest) -> Vec<ManifestIssue> {
    let mut by_description: BTreeMap<&str, Vec<CategoryKey>> = BTreeMap::new();
    for (key, category) in manifest.category_entries() {
        let description = category.description.trim();
        if description.is_empty() {
            continue;
        }
        let keys = by_description.entry(description).or_default();
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    by_description
        .into_iter()
        .filter(|(_, keys)| keys.len() > 1)
        .map(|(description, keys)| ManifestIssue::SharedCategoryDescription {
            keys,
            description: description.to_string(),
        })
        .collect()
}

/// Check that `raw` is a usable path relative to the library root.
///
/// Forward slashes only; the path must not be empty, absolute, contain NUL,
/// or climb above the root with `..`.
pub fn check_relative_path(raw: &str) -> Result<(), &'static str> {
    if raw.trim().is_empty() {
        return Err("path is empty");
    }
    if raw.contains('\0') {
        return Err("path contains NUL");
    }
    if raw.contains('\\') {
        return Err("path uses backslash separators");
    }
    if raw.starts_with('/') || has_drive_prefix(raw) {
        return Err("path is absolute");
    }

    let mut depth: usize = 0;
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err("path escapes the library root");
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return Err("path is absolute"),
        }
    }
    if depth == 0 {
        return Err("path does not name a file");
    }
    Ok(())
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
