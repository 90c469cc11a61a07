//! Command-line surface: a thin presentation consumer of the summary core.
//!
//! Rendering stays deliberately dumb — totals, a status list, the
//! zero-filled matrix, the ranking — or the raw JSON envelope with
//! `--json`. Everything with actual logic lives below this module.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cache::QueryCache;
use crate::summary::{self, SummaryOptions, SummaryView};

#[derive(Parser, Debug)]
#[command(
    name = "ivy",
    version,
    about = "Supplier analytics views over a Supabase-backed table store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Cache window for table fetches, in seconds.
    #[arg(long, global = true, default_value_t = 300)]
    pub ttl: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the full supplier summary: totals, status mix, rankings.
    Summary {
        /// How many suppliers to rank.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Fetch any table by name and preview its rows.
    Table {
        /// Table name, e.g. "suppliers".
        name: String,
        /// Maximum number of rows to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let cache = QueryCache::supabase();
    let ttl = Duration::from_secs(cli.ttl);

    match cli.command {
        Command::Summary { top } => {
            let options = SummaryOptions { ttl, top };
            let view = summary::build_summary(&cache, &options)?;
            if cli.json {
                println!("{}", view.to_cli_json());
            } else {
                print_summary(&view);
            }
        }
        Command::Table { name, limit } => {
            let table = cache.fetch(&name, ttl)?;
            if cli.json {
                let rows: Vec<serde_json::Value> =
                    table.iter().take(limit).map(|row| row.to_json()).collect();
                println!(
                    "{}",
                    serde_json::json!({"table": name, "row_count": table.len(), "rows": rows})
                );
            } else {
                println!("{name}: {} row(s)", table.len());
                for row in table.iter().take(limit) {
                    println!("  {}", row.to_json());
                }
                if table.len() > limit {
                    println!("  … {} more", table.len() - limit);
                }
            }
        }
    }
    Ok(())
}

fn print_summary(view: &SummaryView) {
    println!("Total suppliers: {}", view.total_suppliers);

    if !view.supplier_status.is_empty() {
        println!("\nStatus distribution");
        let width = view
            .supplier_status
            .iter()
            .map(|cell| cell.category.len())
            .max()
            .unwrap_or(0);
        for cell in &view.supplier_status {
            println!("  {:<width$}  {}", cell.category, cell.count);
        }
    }

    if !view.events_by_supplier.is_empty() {
        println!("\nEvents per supplier");
        let categories = &view.events_by_supplier.categories;
        let key_width = view
            .events_by_supplier
            .rows
            .iter()
            .map(|row| row.key.len())
            .max()
            .unwrap_or(0)
            .max("supplier".len());
        print!("  {:<key_width$}", "supplier");
        for category in categories {
            print!("  {category:>8}");
        }
        println!("  {:>8}", "total");
        for (key, cells) in view.events_by_supplier.matrix() {
            print!("  {key:<key_width$}");
            for cell in &cells {
                print!("  {cell:>8}");
            }
            let row_total: u64 = cells.iter().sum();
            println!("  {row_total:>8}");
        }
    }

    if !view.top_suppliers.is_empty() {
        println!("\nTop suppliers by event count");
        for (rank, entry) in view.top_suppliers.iter().enumerate() {
            let breakdown: Vec<String> = entry
                .by_category
                .iter()
                .map(|cell| format!("{}: {}", cell.category, cell.count))
                .collect();
            println!(
                "  {:>2}. {}  {} event(s)  ({})",
                rank + 1,
                entry.key,
                entry.total,
                breakdown.join(", ")
            );
        }
    }
}
