//! Search command handler.

use anyhow::Result;
use searchmiw_core::api::Dispatcher;
use searchmiw_core::config::Config;
use searchmiw_core::services::{HistoryService, SearchResults, SearchService};

pub struct SearchOptions<'a> {
    pub query: &'a str,
    pub language: &'a str,
    /// Also record the query in the user's history
    pub save: bool,
    pub json: bool,
}

pub async fn run(dispatcher: &Dispatcher, config: &Config, opts: SearchOptions<'_>) -> Result<()> {
    let results = SearchService::new(dispatcher, config.search.transport)
        .search(opts.query, opts.language)
        .await?;

    // Results are shown even if saving fails afterwards.
    if opts.json {
        super::print_json(&results)?;
    } else {
        print_results(&results);
    }

    if opts.save {
        HistoryService::new(dispatcher)
            .record_search(&results.query)
            .await?;
        if !opts.json {
            println!();
            println!("✓ Saved to history");
        }
    }
    Ok(())
}

fn print_results(results: &SearchResults) {
    if results.is_empty() {
        println!("No results for \"{}\".", results.query);
        return;
    }

    println!(
        "Found {} results for \"{}\" ({} ms)",
        results.total_results, results.query, results.search_time_ms
    );
    for item in &results.results {
        println!();
        println!("  {} ({})", item.title, item.id);
        if !item.description.is_empty() {
            println!("    {}", item.description);
        }
        if !item.url.is_empty() {
            println!("    {}", item.url);
        }
    }
}
