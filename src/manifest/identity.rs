use serde::{Deserialize, Serialize};
use std::fmt;

/// Short identifier of a category in the manifest's category table
/// (e.g., `audio`, `YAML`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(pub String);

/// Name of the implementation type a node entry binds to.
///
/// Unique within one manifest; the external engine instantiates the class
/// with this name from the node's source file.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(pub String);

/// Declared `library_schema_version` of a manifest (e.g., `0.1.0`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibrarySchemaVersion(pub String);

impl CategoryKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ClassName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl LibrarySchemaVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LibrarySchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_serialize_as_bare_strings() {
        let key = CategoryKey::new("audio");
        let serialized = serde_json::to_string(&key).unwrap();
        assert_eq!(serialized, "\"audio\"");
        let parsed: CategoryKey = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, key);

        let class = ClassName::new("SaveAudio");
        let serialized_class = serde_json::to_string(&class).unwrap();
        assert_eq!(serialized_class, "\"SaveAudio\"");
        let parsed_class: ClassName = serde_json::from_str(&serialized_class).unwrap();
        assert_eq!(parsed_class, class);
    }

    #[test]
    fn category_keys_are_case_sensitive() {
        assert_ne!(CategoryKey::new("YAML"), CategoryKey::new("yaml"));
        assert!(CategoryKey::new("YAML") < CategoryKey::new("audio"));
    }

    #[test]
    fn display_matches_raw_value() {
        assert_eq!(ClassName::new("NEW_YAMLLoaderNode").to_string(), "NEW_YAMLLoaderNode");
        assert_eq!(
            LibrarySchemaVersion("0.1.0".to_string()).to_string(),
            "0.1.0"
        );
    }
}
