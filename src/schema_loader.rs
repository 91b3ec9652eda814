//! JSON Schema loading for library manifests.
//!
//! The crate bundles `schema/library.schema.json`; callers may point at an
//! on-disk copy instead (for a newer engine release). Either way the schema's
//! `library_schema_version` const is extracted, checked against the allowed
//! set, optionally patched, and compiled into a validator.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub(crate) const BUNDLED_LIBRARY_SCHEMA: &str = include_str!("../schema/library.schema.json");

pub(crate) const LIBRARY_SCHEMA_VERSION_POINTER: &str = "/properties/library_schema_version/const";

/// Where the manifest schema comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SchemaSource {
    #[default]
    Bundled,
    Path(PathBuf),
}

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

/// Controls how schemas are normalized before compilation.
pub(crate) struct SchemaLoadOptions<'a> {
    /// Where to find the version const inside the schema payload.
    pub schema_version_pointer: &'a str,
    /// Override the version when provided (used to align consts).
    pub expected_version: Option<&'a str>,
    /// Allowed versions; enforced when present.
    pub allowed_versions: Option<&'a BTreeSet<String>>,
    /// Patch the version const in the schema payload to match
    /// `expected_version` (or the extracted version when no override is set).
    pub patch_schema_version_const: bool,
}

impl<'a> Default for SchemaLoadOptions<'a> {
    fn default() -> Self {
        Self {
            schema_version_pointer: LIBRARY_SCHEMA_VERSION_POINTER,
            expected_version: None,
            allowed_versions: None,
            patch_schema_version_const: false,
        }
    }
}

impl SchemaSource {
    fn read(&self) -> Result<Value> {
        match self {
            SchemaSource::Bundled => {
                serde_json::from_str(BUNDLED_LIBRARY_SCHEMA).context("parsing bundled schema")
            }
            SchemaSource::Path(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening schema {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("parsing schema {}", path.display()))
            }
        }
    }

    fn label(&self) -> String {
        match self {
            SchemaSource::Bundled => "bundled library schema".to_string(),
            SchemaSource::Path(path) => path.display().to_string(),
        }
    }
}

pub(crate) fn load_json_schema(
    source: &SchemaSource,
    options: SchemaLoadOptions<'_>,
) -> Result<SchemaLoadResult> {
    let mut schema_value = source.read()?;

    let schema_version = match options.expected_version {
        Some(version) => version.to_string(),
        None => extract_schema_version(&schema_value, options.schema_version_pointer)
            .ok_or_else(|| anyhow!("schema {} missing version const", source.label()))?,
    };

    if let Some(allowed) = options.allowed_versions {
        if !allowed.contains(&schema_version) {
            bail!(
                "library_schema_version '{}' not in allowed set {:?}",
                schema_version,
                allowed
            );
        }
    }

    if options.patch_schema_version_const {
        let target = schema_value
            .pointer_mut(options.schema_version_pointer)
            .ok_or_else(|| {
                anyhow!(
                    "schema missing pointer {} for version const",
                    options.schema_version_pointer
                )
            })?;
        *target = Value::String(schema_version.clone());
    }

    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("compiling schema {}: {err}", source.label()))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}

/// Versions accepted by the given schema source (its version const).
pub(crate) fn supported_versions(source: &SchemaSource) -> BTreeSet<String> {
    source
        .read()
        .ok()
        .and_then(|schema| extract_schema_version(&schema, LIBRARY_SCHEMA_VERSION_POINTER))
        .into_iter()
        .collect()
}

/// Validate a manifest document against the schema, joining every error.
pub(crate) fn validate_document(
    source: &SchemaSource,
    document: &Value,
    manifest_label: &Path,
) -> Result<()> {
    let Some(declared) = document
        .get("library_schema_version")
        .and_then(Value::as_str)
    else {
        bail!(
            "manifest {}: library_schema_version is missing or not a string",
            manifest_label.display()
        );
    };
    let allowed = supported_versions(source);
    let schema = load_json_schema(
        source,
        SchemaLoadOptions {
            allowed_versions: Some(&allowed),
            expected_version: Some(declared),
            patch_schema_version_const: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("loading schema for {}", manifest_label.display()))?;
    log::debug!(
        "validating {} against schema version {}",
        manifest_label.display(),
        schema.schema_version
    );

    if let Err(errors) = schema.compiled.validate(document) {
        let details = errors
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "manifest {} failed schema validation:\n{}",
            manifest_label.display(),
            details
        );
    }
    Ok(())
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_schema_declares_supported_version() {
        let versions = supported_versions(&SchemaSource::Bundled);
        assert!(versions.contains("0.1.0"));
    }

    #[test]
    fn unsupported_version_is_rejected_before_validation() {
        let doc = json!({"library_schema_version": "9.9.9"});
        let err = validate_document(&SchemaSource::Bundled, &doc, Path::new("lib.json"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("not in allowed set"));
    }

    #[test]
    fn missing_or_non_string_version_is_named() {
        for doc in [json!({"name": "x"}), json!({"library_schema_version": 1})] {
            let err = validate_document(&SchemaSource::Bundled, &doc, Path::new("lib.json"))
                .unwrap_err();
            let message = format!("{err:#}");
            assert!(
                message.contains("library_schema_version is missing or not a string"),
                "{message}"
            );
            assert!(!message.contains("not in allowed set"), "{message}");
        }
    }

    #[test]
    fn schema_errors_are_reported_with_location() {
        let doc = json!({
            "name": "x",
            "library_schema_version": "0.1.0",
            "metadata": {"author": "a", "description": "d",
                         "library_version": "1", "engine_version": "1"},
            "categories": [],
            "nodes": [{"class_name": 3, "file_path": "a.py",
                       "metadata": {"category": "c", "description": "d", "display_name": "n"}}]
        });
        let err = validate_document(&SchemaSource::Bundled, &doc, Path::new("lib.json"))
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed schema validation"));
        assert!(message.contains("/nodes/0/class_name"));
    }

    #[test]
    fn missing_schema_file_is_an_error() {
        let source = SchemaSource::Path(PathBuf::from("/nonexistent/library.schema.json"));
        assert!(load_json_schema(&source, SchemaLoadOptions::default()).is_err());
    }
}
