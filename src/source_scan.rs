//! Lightweight scan of node source files for class definitions.
//!
//! The loader never imports node implementations; it only needs to know
//! whether the file a manifest entry points at defines the named class. The
//! scan looks for top-level `class Name(...)` / `class Name:` statements and
//! ignores comment lines rather than attempting a full parse, so a class
//! produced dynamically will be reported as missing.

use crate::manifest::ClassName;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Class names defined at the top level of a source file.
pub fn scan_class_definitions(path: &Path) -> Result<BTreeSet<ClassName>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_class_definitions(&contents))
}

pub fn parse_class_definitions(contents: &str) -> BTreeSet<ClassName> {
    let mut classes = BTreeSet::new();
    for line in contents.lines() {
        // Nested classes are indented; only module-level definitions bind.
        let Some(rest) = line.strip_prefix("class") else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_whitespace()) {
            continue;
        }
        let name: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let after = rest.trim_start()[name.len()..].trim_start();
        if after.starts_with('(') || after.starts_with(':') {
            classes.insert(ClassName(name));
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_top_level_classes() {
        let source = r#"
from typing import Any

DEFAULT_FILENAME = "griptape_nodes.mp3"

class SaveAudio(ControlNode):
    """Save an audio file to disk."""

    class Inner:
        pass

class NEW_YAMLLoaderNode(DataNode):
    pass

class Plain:
    pass
"#;
        let classes = parse_class_definitions(source);
        let names: Vec<&str> = classes.iter().map(ClassName::as_str).collect();
        assert_eq!(names, vec!["NEW_YAMLLoaderNode", "Plain", "SaveAudio"]);
    }

    #[test]
    fn ignores_comments_and_lookalikes() {
        let source = "# class Hidden(DataNode):\nclassification = 1\nclass  Spaced (Base):\n";
        let classes = parse_class_definitions(source);
        assert_eq!(classes.len(), 1);
        assert!(classes.contains(&ClassName::new("Spaced")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = scan_class_definitions(Path::new("/nonexistent/node.py")).unwrap_err();
        assert!(format!("{err:#}").contains("reading /nonexistent/node.py"));
    }
}
