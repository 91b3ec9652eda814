//! Loader configuration.
//!
//! Values come from environment variables so shell entry points and the
//! engine can steer loading without flags; the CLI overrides them per run.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `NODE_MANIFEST_ROOT` | library root node paths resolve against |
//! | `NODE_MANIFEST_SCHEMA` | path to a manifest JSON Schema (default: bundled) |
//! | `NODE_MANIFEST_DANGLING` | `reject` or `fallback:<category>` |
//! | `NODE_MANIFEST_PARTIAL` | `skip` or `abort` |

use crate::loader::PartialFailurePolicy;
use crate::manifest::{CategoryKey, IndexOptions};
use crate::schema_loader::SchemaSource;
use crate::validation::DanglingCategoryPolicy;
use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

pub const ROOT_ENV: &str = "NODE_MANIFEST_ROOT";
pub const SCHEMA_ENV: &str = "NODE_MANIFEST_SCHEMA";
pub const DANGLING_ENV: &str = "NODE_MANIFEST_DANGLING";
pub const PARTIAL_ENV: &str = "NODE_MANIFEST_PARTIAL";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoaderConfig {
    pub root: Option<PathBuf>,
    pub schema: SchemaSource,
    pub dangling_category: DanglingCategoryPolicy,
    pub partial_failure: PartialFailurePolicy,
}

impl LoaderConfig {
    /// Build a config from the process environment. Empty variables count as
    /// unset; malformed policy values are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(root) = get(ROOT_ENV) {
            config.root = Some(PathBuf::from(root));
        }
        if let Some(schema) = get(SCHEMA_ENV) {
            config.schema = SchemaSource::Path(PathBuf::from(schema));
        }
        if let Some(raw) = get(DANGLING_ENV) {
            config.dangling_category =
                parse_dangling_policy(&raw).with_context(|| format!("reading {DANGLING_ENV}"))?;
        }
        if let Some(raw) = get(PARTIAL_ENV) {
            config.partial_failure =
                parse_partial_policy(&raw).with_context(|| format!("reading {PARTIAL_ENV}"))?;
        }
        Ok(config)
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            schema: self.schema.clone(),
            dangling_category: self.dangling_category.clone(),
        }
    }
}

/// Parse `reject` or `fallback:<category>`.
pub fn parse_dangling_policy(raw: &str) -> Result<DanglingCategoryPolicy> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("reject") {
        return Ok(DanglingCategoryPolicy::Reject);
    }
    if let Some(key) = raw.strip_prefix("fallback:") {
        let key = key.trim();
        if key.is_empty() {
            bail!("fallback policy needs a category key (fallback:<category>)");
        }
        return Ok(DanglingCategoryPolicy::Fallback(CategoryKey::new(key)));
    }
    bail!("unknown dangling-category policy '{raw}' (expected reject|fallback:<category>)")
}

/// Parse `skip` or `abort`.
pub fn parse_partial_policy(raw: &str) -> Result<PartialFailurePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "skip" => Ok(PartialFailurePolicy::SkipNode),
        "abort" => Ok(PartialFailurePolicy::AbortLibrary),
        other => bail!("unknown partial-failure policy '{other}' (expected skip|abort)"),
    }
}
