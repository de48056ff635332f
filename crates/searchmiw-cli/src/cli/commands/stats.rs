//! Stats command handler.

use anyhow::Result;
use searchmiw_core::api::Dispatcher;
use searchmiw_core::services::{ChartKind, ChartSeries, StatsService};

pub async fn show(dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let stats = StatsService::new(dispatcher).get_stats().await?;
    if json {
        return super::print_json(&stats);
    }

    print_series(&stats.searches);
    println!();
    print_series(&stats.registrations);
    Ok(())
}

fn print_series(series: &ChartSeries) {
    let kind = match series.kind {
        ChartKind::Line => "line",
        ChartKind::Bar => "bar",
    };
    println!("{} ({kind}, total {})", series.label, series.total());

    if series.is_empty() {
        println!("  no data");
        return;
    }
    for (date, count) in series.dates.iter().zip(&series.counts) {
        println!("  {date}  {count}");
    }
}
