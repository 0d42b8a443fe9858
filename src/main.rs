use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use wedding_rsvp::{
    init_logging, resolve_config, Event, GuestDirectory, GuestDocument, GuestInput, GuestRecord,
    SqliteGuestStore,
};

#[derive(Parser)]
#[command(name = "rsvp-admin")]
#[command(about = "Manage the wedding guest directory: submit, look up, merge and review RSVPs")]
struct Cli {
    /// Config file (defaults to $RSVP_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every household, newest first
    List,
    /// Show dashboard counters
    Stats,
    /// Find a previous answer for a person and event
    Lookup {
        /// Full name as typed in the form
        name: String,
        /// "ceremony" or "celebration"
        event: Event,
    },
    /// Submit an RSVP from a JSON file
    Submit {
        /// JSON payload in the RSVP form shape
        file: PathBuf,
        /// "ceremony" or "celebration"
        event: Event,
    },
    /// Delete a household
    Delete { id: String },
    /// Fold a duplicate household into another one
    Merge {
        /// Record that disappears
        source: String,
        /// Record that keeps its id
        target: String,
    },
    /// Import exported guest documents (current or legacy shape)
    Import { file: PathBuf },
}

/// One entry of an exported guest collection.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedGuest {
    id: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    document: GuestDocument,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    let store = SqliteGuestStore::open(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let directory = GuestDirectory::new(Arc::new(store.clone()), config.directory.clone());

    match cli.command {
        Commands::List => cmd_list(&directory).await,
        Commands::Stats => cmd_stats(&directory).await,
        Commands::Lookup { name, event } => cmd_lookup(&directory, &name, event).await,
        Commands::Submit { file, event } => cmd_submit(&directory, &file, event).await,
        Commands::Delete { id } => {
            directory.delete_guest(&id).await?;
            println!("🗑️  Deleted {}", id);
            Ok(())
        }
        Commands::Merge { source, target } => {
            directory.merge_records(&source, &target).await?;
            println!("🧬 Merged {} into {}", source, target);
            Ok(())
        }
        Commands::Import { file } => cmd_import(&store, &file),
    }
}

async fn cmd_list(directory: &GuestDirectory) -> Result<()> {
    let guests = directory.list_guests().await?;

    println!("💌 {} households", guests.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for guest in &guests {
        print_guest(guest);
    }
    Ok(())
}

async fn cmd_stats(directory: &GuestDirectory) -> Result<()> {
    let stats = directory.stats().await?;

    println!("📊 Guest directory");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Households:            {}", stats.households);
    println!("Ceremony guests:       {}", stats.ceremony_guests);
    println!("Celebration guests:    {}", stats.celebration_guests);
    println!("Bus (outbound/return): {}/{}", stats.bus_outbound, stats.bus_return);
    println!("Intolerances:          {}", stats.intolerances);
    println!("Children:              {}", stats.children);
    Ok(())
}

async fn cmd_lookup(directory: &GuestDirectory, name: &str, event: Event) -> Result<()> {
    match directory.find_existing_for_event(name, event).await? {
        Some(guest) => {
            println!("✓ {} already answered for the {}:", name, event);
            print_guest(&guest);
        }
        None => println!("No previous {} answer for {}", event, name),
    }
    Ok(())
}

async fn cmd_submit(directory: &GuestDirectory, file: &PathBuf, event: Event) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let candidate: GuestInput = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse RSVP payload in {}", file.display()))?;

    let outcome = directory.submit_rsvp(candidate, event).await?;

    if outcome.is_update {
        println!("✓ Updated household {}", outcome.id);
    } else {
        println!("✓ Created household {}", outcome.id);
    }
    for warning in &outcome.warnings {
        println!("  ⚠️  {}", warning);
    }
    Ok(())
}

fn cmd_import(store: &SqliteGuestStore, file: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let exported: Vec<ExportedGuest> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse guest export in {}", file.display()))?;

    let mut imported = 0;
    let mut skipped = 0;
    for entry in &exported {
        let created_at = entry.created_at.unwrap_or_else(Utc::now);
        if store.import_document(&entry.id, created_at, &entry.document)? {
            imported += 1;
        } else {
            skipped += 1;
        }
    }

    println!("✓ Imported: {} households", imported);
    println!("✓ Skipped existing: {}", skipped);
    println!("✓ Directory now holds {} households", store.count()?);
    Ok(())
}

fn print_guest(guest: &GuestRecord) {
    println!(
        "{}  {}  ceremony={:?} celebration={:?} bus={:?}",
        guest.id, guest.name, guest.ceremony_attendance, guest.celebration_attendance, guest.bus
    );
    for companion in &guest.companions {
        println!("    + {}{}", companion.name, intolerance_suffix(companion.has_intolerance, &companion.intolerance_type));
    }
    for child in &guest.children_detail {
        println!("    · {}{}", child.name, intolerance_suffix(child.has_intolerance, &child.intolerance_type));
    }
    if !guest.comment.is_empty() {
        println!("    \"{}\"", guest.comment);
    }
}

fn intolerance_suffix(has_intolerance: bool, kind: &str) -> String {
    if has_intolerance {
        format!(" ({})", kind)
    } else {
        String::new()
    }
}
