//! Serde representation of a node library manifest.
//!
//! The types mirror the manifest document field for field so helpers and tests
//! can reason about categories and node descriptors without ad-hoc JSON
//! handling. Use `ManifestIndex` for validation and keyed lookup; use these
//! structs when the full document is required (metadata, serialization).
//!
//! Fields the model does not name are kept in `extra` maps so a parse followed
//! by a serialize preserves them.

use crate::manifest::identity::{CategoryKey, ClassName, LibrarySchemaVersion};
use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Full manifest as stored on disk.
pub struct Manifest {
    pub name: String,
    pub library_schema_version: LibrarySchemaVersion,
    pub metadata: LibraryMetadata,
    /// Each entry is a single-key object `{ <key>: Category }`.
    pub categories: Vec<CategoryEntry>,
    pub nodes: Vec<NodeDescriptor>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Library-level authorship and version information.
pub struct LibraryMetadata {
    pub author: String,
    pub description: String,
    pub library_version: String,
    pub engine_version: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One object from the `categories` array.
///
/// Entries are kept as a list rather than a map so a key repeated inside one
/// object stays visible to validation instead of being merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryEntry(pub Vec<(CategoryKey, Category)>);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Presentation metadata for one category.
pub struct Category {
    pub title: String,
    pub description: String,
    /// Style class token, e.g. `border-sky-500`.
    pub color: String,
    /// Icon identifier, e.g. `SpeakerWave`.
    pub icon: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One node entry: which class to bind, where it lives, how to present it.
pub struct NodeDescriptor {
    pub class_name: ClassName,
    /// Location of the implementation, relative to the library root.
    pub file_path: String,
    pub metadata: NodeMetadata,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Display metadata attached to a node entry.
pub struct NodeMetadata {
    pub category: CategoryKey,
    pub description: String,
    pub display_name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Manifest {
    /// Iterate category entries in document order, flattening the
    /// single-key wrapper objects.
    pub fn category_entries(&self) -> impl Iterator<Item = (&CategoryKey, &Category)> {
        self.categories
            .iter()
            .flat_map(|entry| entry.0.iter().map(|(key, category)| (key, category)))
    }

    /// Serialize back to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing manifest")
    }
}

impl CategoryEntry {
    pub fn single(key: CategoryKey, category: Category) -> Self {
        Self(vec![(key, category)])
    }
}

impl Serialize for CategoryEntry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, category) in &self.0 {
            map.serialize_entry(key, category)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = CategoryEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping a category key to its metadata")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<CategoryEntry, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((key, category)) = access.next_entry::<CategoryKey, Category>()? {
                    entries.push((key, category));
                }
                Ok(CategoryEntry(entries))
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

impl NodeDescriptor {
    pub fn category(&self) -> &CategoryKey {
        &self.metadata.category
    }

    pub fn display_name(&self) -> &str {
        &self.metadata.display_name
    }
}

/// Parse a manifest from JSON text without additional validation.
pub fn parse_manifest(data: &str) -> Result<Manifest> {
    let manifest: Manifest = serde_json::from_str(data).context("parsing manifest JSON")?;
    Ok(manifest)
}

/// Read and parse a manifest from disk without additional validation.
pub fn load_manifest_from_path(path: &Path) -> Result<Manifest> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_manifest(&data).with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "name": "Minimal Library",
            "library_schema_version": "0.1.0",
            "metadata": {
                "author": "someone",
                "description": "test",
                "library_version": "0.1.0",
                "engine_version": "0.1.0"
            },
            "categories": [
                {"audio": {"title": "Audio", "description": "Audio related nodes",
                           "color": "border-sky-500", "icon": "SpeakerWave"}}
            ],
            "nodes": [
                {"class_name": "SaveAudio", "file_path": "nodes/save_audio_node.py",
                 "metadata": {"category": "audio", "description": "Save audio",
                              "display_name": "Save Audio"}}
            ]
        })
    }

    #[test]
    fn missing_tags_default_to_empty() {
        let manifest: Manifest = serde_json::from_value(minimal()).unwrap();
        assert!(manifest.metadata.tags.is_empty());
        assert_eq!(manifest.nodes[0].display_name(), "Save Audio");
        assert_eq!(manifest.nodes[0].category().as_str(), "audio");
    }

    #[test]
    fn category_entries_flatten_wrappers() {
        let manifest: Manifest = serde_json::from_value(minimal()).unwrap();
        let entries: Vec<_> = manifest.category_entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.as_str(), "audio");
        assert_eq!(entries[0].1.icon, "SpeakerWave");
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let mut value = minimal();
        value["settings"] = json!([{"category": "nodes.audio"}]);
        value["nodes"][0]["metadata"]["icon"] = json!("Speaker");
        let manifest: Manifest = serde_json::from_value(value.clone()).unwrap();
        assert!(manifest.extra.contains_key("settings"));

        let back = serde_json::to_value(&manifest).unwrap();
        assert_eq!(back["settings"], value["settings"]);
        assert_eq!(back["nodes"][0]["metadata"]["icon"], json!("Speaker"));
    }

    #[test]
    fn repeated_key_inside_one_entry_is_kept() {
        let raw = minimal().to_string().replace(
            r#"{"audio":{"#,
            r#"{"audio":{"color":"c","description":"d","icon":"i","title":"First"},"audio":{"#,
        );
        let manifest = parse_manifest(&raw).unwrap();
        let titles: Vec<&str> = manifest
            .category_entries()
            .map(|(_, category)| category.title.as_str())
            .collect();
        assert_eq!(titles, vec!["First", "Audio"]);
        assert_eq!(manifest.categories[0].0.len(), 2);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut value = minimal();
        value["nodes"][0]
            .as_object_mut()
            .unwrap()
            .remove("file_path");
        let err = parse_manifest(&value.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("file_path"));
    }
}
