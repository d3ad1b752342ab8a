//! `friendbook` - CLI for the friendbook contact store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use friendbook::cli::{
    AddCommand, Cli, Command, ConfigCommand, ListCommand, RemoveAtCommand, RemoveCommand,
    ShowCommand,
};
use friendbook::location::FixedLocationProvider;
use friendbook::{
    init_logging, AddFlow, Config, LocationFeed, Portrait, RecordDraft, RecordStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::List(cmd) => handle_list(&open_store(&config), &cmd),
        Command::Show(cmd) => handle_show(&open_store(&config), &cmd),
        Command::Add(cmd) => handle_add(&config, &mut open_store(&config), cmd).await,
        Command::Remove(cmd) => handle_remove(&mut open_store(&config), &cmd),
        Command::RemoveAt(cmd) => handle_remove_at(&mut open_store(&config), &cmd),
        Command::Status(cmd) => handle_status(&config, &open_store(&config), cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> RecordStore {
    RecordStore::open(config.records_path(), config.storage.write_policy)
}

fn handle_list(store: &RecordStore, cmd: &ListCommand) -> anyhow::Result<()> {
    let query = cmd.search.as_deref().unwrap_or_default();
    let rows = store.matching_positions(query);

    if cmd.json {
        let out: Vec<_> = rows
            .iter()
            .map(|(position, record)| {
                serde_json::json!({
                    "position": position,
                    "record": record,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if rows.is_empty() {
        if store.is_empty() {
            println!("No friends yet.");
        } else {
            println!("No friends match \"{query}\".");
        }
        return Ok(());
    }
    for (position, record) in rows {
        println!(
            "{position:>4}  {:<24} {:<16} {:<16} {}",
            record.name, record.contact_number, record.social_handle, record.id
        );
    }
    Ok(())
}

fn handle_show(store: &RecordStore, cmd: &ShowCommand) -> anyhow::Result<()> {
    let Some(record) = store.find(cmd.id) else {
        bail!(friendbook::Error::RecordNotFound { id: cmd.id });
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("{}", record.name);
    println!("{}", "=".repeat(record.name.chars().count().max(1)));
    println!("Id:        {}", record.id);
    println!("Phone:     {}", record.contact_number);
    println!("Social:    {}", record.social_handle);
    println!("Location:  {}", record.coordinate());
    match record.portrait() {
        Portrait::Photo(bytes) => println!("Photo:     {} bytes", bytes.len()),
        Portrait::Placeholder => println!("Photo:     (placeholder)"),
    }
    if !record.note.is_empty() {
        println!();
        println!("{}", record.note);
    }
    Ok(())
}

async fn handle_add(
    config: &Config,
    store: &mut RecordStore,
    cmd: AddCommand,
) -> anyhow::Result<()> {
    let image = match &cmd.photo {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read photo {}", path.display()))?;
            Some(bytes)
        }
        None => None,
    };

    let provider = Arc::new(FixedLocationProvider::new(cmd.at.or(config.location.fixed)));
    let mut feed = LocationFeed::new(provider, config.location.channel_capacity);

    let flow = AddFlow::begin(&mut feed)?;
    tokio::time::sleep(config.settle_time()).await;

    let draft = RecordDraft {
        image,
        name: cmd.name,
        contact_number: cmd.phone,
        social_handle: cmd.social,
        note: cmd.note,
    };
    let record = flow
        .commit(draft, store)
        .with_context(|| format!("record was not saved to {}", store.path().display()))?;

    println!("Added {} ({})", record.name, record.id);
    if record.coordinate().is_zero() {
        println!("No location fix was available; saved at 0, 0.");
    } else {
        println!("Location: {}", record.coordinate());
    }
    Ok(())
}

fn handle_remove(store: &mut RecordStore, cmd: &RemoveCommand) -> anyhow::Result<()> {
    let mut positions = BTreeSet::new();
    for id in &cmd.ids {
        match store.position(*id) {
            Some(position) => {
                positions.insert(position);
            }
            None => eprintln!("No record with id {id}"),
        }
    }
    remove_positions(store, &positions)
}

fn handle_remove_at(store: &mut RecordStore, cmd: &RemoveAtCommand) -> anyhow::Result<()> {
    let positions: BTreeSet<usize> = cmd.positions.iter().copied().collect();
    remove_positions(store, &positions)
}

fn remove_positions(store: &mut RecordStore, positions: &BTreeSet<usize>) -> anyhow::Result<()> {
    let before = store.len();
    store
        .remove_at(positions)
        .with_context(|| format!("changes were not saved to {}", store.path().display()))?;
    println!("Removed {} record(s).", before - store.len());
    Ok(())
}

fn handle_status(config: &Config, store: &RecordStore, json: bool) -> anyhow::Result<()> {
    let stats = store.stats();
    if json {
        let status = serde_json::json!({
            "records_path": store.path(),
            "write_policy": config.storage.write_policy,
            "fixed_location": config.location.fixed,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("friendbook status");
    println!("-----------------");
    println!("Records file:   {}", store.path().display());
    println!("Write policy:   {:?}", config.storage.write_policy);
    println!("Records:        {}", stats.total_records);
    println!("With photo:     {}", stats.with_photo);
    println!("File size:      {} bytes", stats.file_size_bytes);
    match stats.last_persisted {
        Some(at) => println!("Last saved:     {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Last saved:     never"),
    }
    match config.location.fixed {
        Some(fixed) => println!("Location:       fixed at {fixed}"),
        None => println!("Location:       unavailable"),
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Records path:     {}", config.records_path().display());
                println!("  Write policy:     {:?}", config.storage.write_policy);
                println!();
                println!("[Location]");
                match config.location.fixed {
                    Some(fixed) => println!("  Fixed position:   {fixed}"),
                    None => println!("  Fixed position:   (none)"),
                }
                println!("  Settle time (ms): {}", config.location.settle_ms);
                println!("  Channel capacity: {}", config.location.channel_capacity);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
