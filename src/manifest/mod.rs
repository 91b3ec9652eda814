//! Node library manifest wiring.
//!
//! Types here mirror the manifest document; callers use `ManifestIndex` for
//! validated lookups and `LibraryRepository` when several libraries are
//! loaded at once.

pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use identity::{CategoryKey, ClassName, LibrarySchemaVersion};
pub use index::{IndexOptions, ManifestIndex};
pub use model::{Category, CategoryEntry, LibraryMetadata, Manifest, NodeDescriptor, NodeMetadata};
pub use repository::LibraryRepository;

pub use model::{load_manifest_from_path, parse_manifest};
