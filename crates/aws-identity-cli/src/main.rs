//! AWS Identity Manager CLI — `awsident` command.
//!
//! Provides a command-line interface for listing, adding, importing,
//! renaming and removing locally stored AWS credential sets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::warn;

use aws_identity::import::import_into;
use aws_identity::{IamCsvParser, Identity, IdentityFields, IdentityParser, IdentityStore};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// AWS Identity Manager CLI — keep named AWS credential sets in a
/// protected local registry.
#[derive(Parser, Debug)]
#[command(
    name = "awsident",
    about = "AWS Identity Manager CLI",
    version,
    long_about = "awsident — AWS Identity Manager CLI\n\nStore named AWS credential sets in a protected local registry\nand import them from IAM console CSV exports."
)]
struct Cli {
    /// Configuration directory (default: ~/.aws-identity-manager)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all identities
    List,

    /// Display one identity
    Show {
        /// Identity id
        id: String,

        /// Print the secret access key unmasked
        #[arg(long)]
        reveal: bool,
    },

    /// Add an identity
    Add {
        /// Human-readable name (also the id unless --id is given)
        #[arg(long)]
        name: String,

        /// AWS access key id
        #[arg(long)]
        access_key_id: String,

        /// AWS secret access key
        #[arg(long)]
        secret_access_key: String,

        /// Explicit id distinct from the name
        #[arg(long)]
        id: Option<String>,
    },

    /// Import identities from an IAM console credentials CSV
    Import {
        /// Path to the CSV file
        file: PathBuf,

        /// Skip rows whose id is already stored with different values
        #[arg(long)]
        skip_existing: bool,
    },

    /// Change the id of an identity
    Rename {
        /// Current id
        old_id: String,

        /// New id
        new_id: String,
    },

    /// Remove an identity
    Remove {
        /// Identity id
        id: String,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut store = match cli.config_dir {
        Some(dir) => open_store(&dir)?,
        None => IdentityStore::open_default().context("failed to open identity store")?,
    };
    let verbose = cli.verbose;

    match cli.command {
        Commands::List => cmd_list(&store, verbose),
        Commands::Show { id, reveal } => cmd_show(&store, &id, reveal),
        Commands::Add {
            name,
            access_key_id,
            secret_access_key,
            id,
        } => {
            let mut fields = IdentityFields::new(name, access_key_id, secret_access_key);
            fields.id = id;
            cmd_add(&mut store, fields)
        }
        Commands::Import {
            file,
            skip_existing,
        } => cmd_import(&mut store, &file, skip_existing),
        Commands::Rename { old_id, new_id } => cmd_rename(&mut store, &old_id, &new_id),
        Commands::Remove { id } => cmd_remove(&mut store, &id),
    }
}

fn open_store(config_dir: &Path) -> Result<IdentityStore> {
    IdentityStore::open(config_dir)
        .with_context(|| format!("failed to open identity store at {}", config_dir.display()))
}

// ── Command implementations ───────────────────────────────────────────────────

/// `awsident list`
fn cmd_list(store: &IdentityStore, verbose: bool) -> Result<()> {
    if store.is_empty() {
        println!("No identities stored.");
        return Ok(());
    }

    for (key, identity) in store.items() {
        if verbose {
            println!("{key}\t{}\t{}", identity.name, identity.access_key_id);
        } else {
            println!("{key}");
        }
    }

    if verbose {
        println!("\n{} identities in {}", store.len(), store.identities_path().display());
    }
    Ok(())
}

/// `awsident show ID [--reveal]`
fn cmd_show(store: &IdentityStore, id: &str, reveal: bool) -> Result<()> {
    let identity = store
        .get(id)
        .ok_or_else(|| anyhow!("identity '{id}' not found"))?;
    print_identity(identity, reveal);
    Ok(())
}

/// `awsident add --name N --access-key-id K --secret-access-key S [--id I]`
fn cmd_add(store: &mut IdentityStore, fields: IdentityFields) -> Result<()> {
    let identity = store.add_identity(fields).context("failed to add identity")?;
    println!("Stored identity '{}'", identity.id);
    Ok(())
}

/// `awsident import FILE [--skip-existing]`
fn cmd_import(store: &mut IdentityStore, file: &Path, skip_existing: bool) -> Result<()> {
    let parser = IamCsvParser::new(file);

    let imported = if skip_existing {
        let identities = parser
            .identities()
            .with_context(|| format!("failed to parse {}", file.display()))?;

        let accepted = without_conflicts(store, identities);
        store.add_identities(accepted)
    } else {
        import_into(store, &parser)
    };
    let added = imported.with_context(|| format!("failed to import {}", file.display()))?;

    println!("Imported {added} new identities from {}", file.display());
    Ok(())
}

/// Drop every identity whose id is already held by a different record,
/// either in `store` or earlier in `identities`.
fn without_conflicts(store: &IdentityStore, identities: Vec<Identity>) -> Vec<Identity> {
    let mut accepted: HashMap<String, Identity> = HashMap::new();
    let mut ordered = Vec::with_capacity(identities.len());

    for identity in identities {
        let conflicts = store
            .get(&identity.id)
            .or_else(|| accepted.get(&identity.id))
            .is_some_and(|existing| *existing != identity);

        if conflicts {
            warn!("skipping '{}': already held with different values", identity.id);
            eprintln!("Skipped '{}' (already exists)", identity.id);
            continue;
        }

        accepted
            .entry(identity.id.clone())
            .or_insert_with(|| identity.clone());
        ordered.push(identity);
    }

    ordered
}

/// `awsident rename OLD NEW`
fn cmd_rename(store: &mut IdentityStore, old_id: &str, new_id: &str) -> Result<()> {
    let identity = store
        .rename(old_id, new_id)
        .with_context(|| format!("failed to rename '{old_id}'"))?;
    println!("Renamed '{old_id}' to '{}'", identity.id);
    Ok(())
}

/// `awsident remove ID`
fn cmd_remove(store: &mut IdentityStore, id: &str) -> Result<()> {
    let removed = store
        .remove(id)
        .with_context(|| format!("failed to remove '{id}'"))?;
    println!("Removed identity '{}'", removed.id);
    Ok(())
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_identity(identity: &Identity, reveal: bool) {
    let secret = if reveal {
        identity.secret_access_key.clone()
    } else {
        identity.masked_secret()
    };

    println!("ID:                {}", identity.id);
    println!("Name:              {}", identity.name);
    println!("Access key ID:     {}", identity.access_key_id);
    println!("Secret access key: {secret}");
}
