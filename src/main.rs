// Procurement Radar - offline inspection of KLASS classification exports

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use procurement_radar::classification::fingerprint;
use procurement_radar::logging::init_tracing;
use procurement_radar::{load_file, FilterResolver, HierarchyQueryService, Scheme};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "radar")]
#[command(about = "Inspect NUTS / STYRK classification CSV exports")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the hierarchy and print statistics
    Check {
        /// geography (nuts) or occupation (styrk)
        scheme: Scheme,
        file: PathBuf,
    },

    /// Print the hierarchy down to a level as JSON
    Tree {
        scheme: Scheme,
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        level: u32,
    },

    /// Expand codes or names to their leaf codes
    Resolve {
        scheme: Scheme,
        file: PathBuf,
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Check { scheme, file } => run_check(scheme, &file),
        Command::Tree { scheme, file, level } => run_tree(scheme, &file, level),
        Command::Resolve {
            scheme,
            file,
            identifiers,
        } => run_resolve(scheme, &file, &identifiers),
    }
}

fn load(scheme: Scheme, file: &Path) -> Result<HierarchyQueryService> {
    let records = load_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    HierarchyQueryService::from_records(scheme, records, Some(file.display().to_string()))
        .with_context(|| format!("{} data in {} is inconsistent", scheme, file.display()))
}

fn run_check(scheme: Scheme, file: &Path) -> Result<()> {
    println!("📂 Checking {} classification: {}", scheme, file.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let records = load_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    println!("✓ Loaded {} records", records.len());
    println!("✓ Fingerprint: {}", fingerprint(&records));

    let service = HierarchyQueryService::from_records(scheme, records, None)
        .with_context(|| format!("{} data in {} is inconsistent", scheme, file.display()))?;
    let index = service.index();

    println!("✓ Hierarchy built: {} roots, max level {}", index.roots().count(), index.max_level());
    for level in 1..=index.max_level() {
        println!("   level {}: {} codes", level, index.at_level(level).len());
    }

    let valid = service.valid_levels();
    println!("✓ Served levels: {}..={}", valid.start(), valid.end());

    Ok(())
}

fn run_tree(scheme: Scheme, file: &Path, level: u32) -> Result<()> {
    let service = load(scheme, file)?;
    let structure = service.get_hierarchy(level)?;
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}

fn run_resolve(scheme: Scheme, file: &Path, identifiers: &[String]) -> Result<()> {
    let service = Arc::new(load(scheme, file)?);
    let resolver = FilterResolver::new().with_service(Arc::clone(&service));

    for identifier in identifiers {
        let code = service.resolve_identifier(identifier)?;
        println!("✓ {} → {} ({})", identifier, code, service.describe(&code).unwrap_or_default());
    }

    let leaves = resolver.resolve(scheme, identifiers)?;
    println!("\n🎯 {} leaf codes:", leaves.len());
    for code in &leaves {
        println!("   {} {}", code, service.describe(code).unwrap_or_default());
    }

    Ok(())
}
