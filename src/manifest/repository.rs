//! Holds one or more indexed libraries for lookup by name.
//!
//! An engine session usually loads several libraries; the repository keeps
//! library selection explicit and can answer which library provides a class.

use crate::manifest::identity::ClassName;
use crate::manifest::index::ManifestIndex;
use crate::manifest::model::NodeDescriptor;
use std::collections::BTreeMap;

#[derive(Default)]
/// In-memory store of `ManifestIndex`es keyed by library name.
pub struct LibraryRepository {
    libraries: BTreeMap<String, ManifestIndex>,
}

impl LibraryRepository {
    /// Register a library for later lookup, replacing any library with the
    /// same name (a reload). Returns the replaced index.
    pub fn register(&mut self, index: ManifestIndex) -> Option<ManifestIndex> {
        let name = index.name().to_string();
        let previous = self.libraries.insert(name.clone(), index);
        if previous.is_some() {
            log::info!("reloaded library '{name}'");
        }
        previous
    }

    /// Fetch a library by name, if present.
    pub fn get(&self, name: &str) -> Option<&ManifestIndex> {
        self.libraries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Resolve a node across every registered library, in library-name order.
    pub fn find_node(&self, class_name: &ClassName) -> Option<(&ManifestIndex, &NodeDescriptor)> {
        self.libraries
            .values()
            .find_map(|index| index.node(class_name).map(|node| (index, node)))
    }

    /// Class names declared by more than one registered library, with the
    /// libraries that declare them.
    pub fn conflicting_classes(&self) -> BTreeMap<ClassName, Vec<String>> {
        let mut owners: BTreeMap<ClassName, Vec<String>> = BTreeMap::new();
        for (name, index) in &self.libraries {
            for node in index.nodes() {
                owners
                    .entry(node.class_name.clone())
                    .or_default()
                    .push(name.clone());
            }
        }
        owners.retain(|_, libraries| libraries.len() > 1);
        owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::DanglingCategoryPolicy;
    use serde_json::json;

    fn library(name: &str, classes: &[&str]) -> ManifestIndex {
        let nodes: Vec<_> = classes
            .iter()
            .map(|class| {
                json!({"class_name": class, "file_path": format!("nodes/{class}.py"),
                       "metadata": {"category": "misc", "description": "d", "display_name": class}})
            })
            .collect();
        let manifest = serde_json::from_value(json!({
            "name": name,
            "library_schema_version": "0.1.0",
            "metadata": {"author": "a", "description": "d",
                         "library_version": "0.1.0", "engine_version": "0.1.0"},
            "categories": [{"misc": {"title": "Misc", "description": "Misc nodes",
                                     "color": "border-gray-500", "icon": "Cube"}}],
            "nodes": nodes
        }))
        .unwrap();
        ManifestIndex::from_manifest(manifest, &DanglingCategoryPolicy::Reject).unwrap()
    }

    #[test]
    fn finds_nodes_across_libraries() {
        let mut repo = LibraryRepository::default();
        repo.register(library("Audio Library", &["SaveAudio"]));
        repo.register(library("YAML Library", &["YAMLLoaderNode"]));

        let (index, node) = repo.find_node(&ClassName::new("YAMLLoaderNode")).unwrap();
        assert_eq!(index.name(), "YAML Library");
        assert_eq!(node.file_path, "nodes/YAMLLoaderNode.py");
        assert!(repo.find_node(&ClassName::new("Missing")).is_none());
        assert_eq!(repo.names().collect::<Vec<_>>(), vec!["Audio Library", "YAML Library"]);
    }

    #[test]
    fn register_replaces_same_name() {
        let mut repo = LibraryRepository::default();
        assert!(repo.register(library("Lib", &["A"])).is_none());
        let previous = repo.register(library("Lib", &["B"])).unwrap();
        assert!(previous.node(&ClassName::new("A")).is_some());
        assert!(repo.get("Lib").unwrap().node(&ClassName::new("B")).is_some());
    }

    #[test]
    fn reports_conflicting_classes() {
        let mut repo = LibraryRepository::default();
        repo.register(library("One", &["Shared", "OnlyOne"]));
        repo.register(library("Two", &["Shared"]));
        let conflicts = repo.conflicting_classes();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts.get(&ClassName::new("Shared")).unwrap(),
            &vec!["One".to_string(), "Two".to_string()]
        );
    }
}
