//! Command-line front end for node library manifests.
//!
//! Validates a manifest, looks up categories and nodes, lists the node table,
//! runs the load plan against a library root, and re-serializes the document.
//! Environment configuration (`NODE_MANIFEST_*`) applies first; flags override
//! it. Set `RUST_LOG=info` (or `debug`) for loader progress on stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use node_manifest::config::{parse_dangling_policy, parse_partial_policy};
use node_manifest::{
    CategoryEntry, CategoryKey, ClassName, LibraryLoader, LoaderConfig, ManifestIndex,
    SchemaSource, Severity, check_manifest, load_manifest_from_path,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "node-manifest", version, about = "Inspect and validate node library manifests")]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ConfigOverrides {
    /// Library root that node file paths resolve against
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Manifest JSON Schema to validate against instead of the bundled one
    #[arg(long, global = true)]
    schema: Option<PathBuf>,
    /// Dangling category policy: reject | fallback:<category>
    #[arg(long, global = true)]
    dangling: Option<String>,
    /// Partial failure policy: skip | abort
    #[arg(long, global = true)]
    partial: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Schema and cross-reference validation
    Validate {
        manifest: PathBuf,
        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },
    /// Print one category as JSON
    Category { manifest: PathBuf, key: String },
    /// Print one node descriptor as JSON
    Node { manifest: PathBuf, class_name: String },
    /// List nodes as class, category, display name
    List {
        manifest: PathBuf,
        #[arg(long)]
        category: Option<String>,
    },
    /// Resolve every node source under the library root
    Resolve {
        manifest: PathBuf,
        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-serialize the manifest as pretty JSON
    Fmt { manifest: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.overrides.apply(LoaderConfig::from_env()?)?;
    let options = config.index_options();

    match cli.command {
        Command::Validate { manifest, strict } => {
            let issues = check_manifest(&manifest, &options)?;
            let mut failed = false;
            for issue in &issues {
                let severity = issue.severity();
                if severity == Severity::Error || strict {
                    failed = true;
                }
                println!("{severity}: {issue}");
            }
            if failed {
                return Ok(ExitCode::FAILURE);
            }
            println!("{}: ok", manifest.display());
        }
        Command::Category { manifest, key } => {
            let index = ManifestIndex::load(&manifest, &options)?;
            let key = CategoryKey::new(key);
            let category = index.require_category(&key)?;
            // Same `{ <key>: category }` shape as a manifest category entry.
            let entry = CategoryEntry::single(key.clone(), category.clone());
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        Command::Node {
            manifest,
            class_name,
        } => {
            let index = ManifestIndex::load(&manifest, &options)?;
            let node = index.require_node(&ClassName::new(class_name))?;
            println!("{}", serde_json::to_string_pretty(node)?);
        }
        Command::List { manifest, category } => {
            let index = ManifestIndex::load(&manifest, &options)?;
            let filter = category.map(CategoryKey::new);
            if let Some(key) = &filter {
                index.require_category(key)?;
            }
            for node in index.nodes() {
                if filter.as_ref().is_some_and(|key| node.category() != key) {
                    continue;
                }
                println!(
                    "{}\t{}\t{}",
                    node.class_name,
                    node.category(),
                    node.display_name()
                );
            }
        }
        Command::Resolve { manifest, json } => {
            let index = ManifestIndex::load(&manifest, &options)?;
            let report = LibraryLoader::new(&config).resolve(&index)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for node in &report.loaded {
                    println!("ok\t{}\t{}", node.class_name, node.source.display());
                }
                for failure in &report.failed {
                    println!("failed\t{}\t{}", failure.class_name, failure.reason);
                }
            }
            if !report.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Fmt { manifest } => {
            let parsed = load_manifest_from_path(&manifest)?;
            println!("{}", parsed.to_json_pretty()?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

impl ConfigOverrides {
    fn apply(self, mut config: LoaderConfig) -> Result<LoaderConfig> {
        if let Some(root) = self.root {
            config.root = Some(root);
        }
        if let Some(schema) = self.schema {
            config.schema = SchemaSource::Path(schema);
        }
        if let Some(raw) = self.dangling {
            config.dangling_category = parse_dangling_policy(&raw).context("--dangling")?;
        }
        if let Some(raw) = self.partial {
            config.partial_failure = parse_partial_policy(&raw).context("--partial")?;
        }
        Ok(config)
    }
}
