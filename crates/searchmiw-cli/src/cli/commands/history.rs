//! History command handlers.

use anyhow::Result;
use searchmiw_core::api::Dispatcher;
use searchmiw_core::services::HistoryService;

pub async fn list(dispatcher: &Dispatcher, page: u32, size: u32, json: bool) -> Result<()> {
    let page = HistoryService::new(dispatcher)
        .get_history(page, size)
        .await?;

    if json {
        return super::print_json(&page);
    }
    if page.is_empty() {
        println!("No search history.");
        return Ok(());
    }

    for entry in &page.entries {
        let when = entry.timestamp.as_deref().unwrap_or("-");
        println!("{:<8} {:<26} {}", entry.id, when, entry.query);
    }
    Ok(())
}

pub async fn delete(dispatcher: &Dispatcher, id: &str) -> Result<()> {
    HistoryService::new(dispatcher)
        .delete_history_entry(id)
        .await?;
    println!("✓ Deleted history entry {}", id.trim());
    Ok(())
}

pub async fn clear(dispatcher: &Dispatcher) -> Result<()> {
    HistoryService::new(dispatcher).clear_history().await?;
    println!("✓ Search history cleared");
    Ok(())
}
