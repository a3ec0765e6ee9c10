//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use medialist_core::{ListContents, ListRecord, MediaEntity};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a list and everything in it
    pub fn print_list_contents(&self, contents: &ListContents) {
        match self.format {
            OutputFormat::Human => {
                let list = &contents.list;
                println!("ID:    {}", list.id);
                println!("Name:  {}", list.name);
                println!("Owner: {}", list.owner);

                if contents.is_empty() {
                    println!();
                    println!("This list is empty.");
                    return;
                }
                print_section("Movies", &contents.movies);
                print_section("Series", &contents.series);
                print_section("Anime", &contents.anime);
                println!("\n{} title(s)", contents.len());
            }
            OutputFormat::Json => print_json(contents),
            OutputFormat::Quiet => {
                for id in contents.movies.iter().map(|m| m.id) {
                    println!("movie {}", id);
                }
                for id in contents.series.iter().map(|s| s.id) {
                    println!("series {}", id);
                }
                for id in contents.anime.iter().map(|a| a.id) {
                    println!("anime {}", id);
                }
            }
        }
    }

    /// Print a set of lists
    pub fn print_lists(&self, lists: &[ListRecord]) {
        match self.format {
            OutputFormat::Human => {
                if lists.is_empty() {
                    println!("No lists found.");
                    return;
                }
                for list in lists {
                    println!("{:>6} | {} | {}", list.id, truncate(&list.name, 40), list.owner);
                }
                println!("\n{} list(s)", lists.len());
            }
            OutputFormat::Json => print_json(&lists),
            OutputFormat::Quiet => {
                for list in lists {
                    println!("{}", list.id);
                }
            }
        }
    }

    /// Print stored entities of one kind
    pub fn print_entities<E: MediaEntity>(&self, entities: &[E]) {
        match self.format {
            OutputFormat::Human => {
                if entities.is_empty() {
                    println!("No {} entries found.", E::KIND);
                    return;
                }
                for entity in entities {
                    println!("{}", entity_line(entity));
                }
                println!("\n{} {}(s)", entities.len(), E::KIND);
            }
            OutputFormat::Json => print_json(&entities),
            OutputFormat::Quiet => {
                for entity in entities {
                    println!("{}", entity.id());
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_section<E: MediaEntity>(heading: &str, entities: &[E]) {
    if entities.is_empty() {
        return;
    }
    println!();
    println!("── {} ({}) ──", heading, entities.len());
    for entity in entities {
        println!("{}", entity_line(entity));
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// One-line summary: id, title and both attributes
fn entity_line<E: MediaEntity>(entity: &E) -> String {
    let (first_name, second_name) = E::KIND.attribute_names();
    let (first, second) = entity.attributes();
    format!(
        "{:>8} | {} | {}: {}, {}: {}",
        entity.id(),
        truncate(entity.title(), 40),
        first_name,
        first,
        second_name,
        second
    )
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
