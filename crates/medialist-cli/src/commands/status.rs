//! Status command handler

use anyhow::Result;
use serde::Serialize;

use medialist_core::{Backend, MediaKind, Store};

use crate::output::{print_json, Output, OutputFormat};

#[derive(Serialize)]
struct StatusReport {
    backend: Backend,
    data_dir: String,
    counts: Vec<KindCount>,
}

#[derive(Serialize)]
struct KindCount {
    kind: MediaKind,
    count: usize,
}

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let config = store.config();
    let counts: Vec<KindCount> = store
        .entity_counts()?
        .into_iter()
        .map(|(kind, count)| KindCount { kind, count })
        .collect();

    match output.format {
        OutputFormat::Json => {
            print_json(&StatusReport {
                backend: store.backend(),
                data_dir: config.data_dir.display().to_string(),
                counts,
            });
        }
        OutputFormat::Quiet => {
            println!("{}", store.backend());
        }
        OutputFormat::Human => {
            println!("Medialist Status");
            println!("================");
            println!();
            println!("Storage:");
            println!("  Backend:  {}", store.backend());
            match store.backend() {
                Backend::Memory => println!("  Location: (in memory, not persisted)"),
                Backend::File => println!("  Location: {}", config.data_dir.display()),
                Backend::Sqlite => println!("  Location: {}", config.sqlite_path().display()),
            }
            println!();
            println!("Catalog:");
            for KindCount { kind, count } in &counts {
                println!("  {:<10} {}", format!("{}:", kind), count);
            }
        }
    }

    Ok(())
}
