//! Activity charts built from the GraphQL data panel.
//!
//! Two series: searches per day (line) and registrations per day (bar). Both
//! bucket by the UTC calendar date of each timestamp; naive timestamps are
//! taken as already being in UTC.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::from_payload;
use crate::api::{Dispatcher, RequestResult};

pub const STATS_QUERY: &str = r"
query GetStatsData {
  historyEntries {
    id
    timestamp
  }
  users {
    id
    createdAt
  }
}";

pub const SEARCHES_LABEL: &str = "Searches";
pub const REGISTRATIONS_LABEL: &str = "Registrations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

/// One chart: `dates[i]` has `counts[i]` events. Dates ascend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub kind: ChartKind,
    pub dates: Vec<String>,
    pub counts: Vec<u64>,
}

impl ChartSeries {
    fn from_timestamps<'t>(
        label: &str,
        kind: ChartKind,
        timestamps: impl IntoIterator<Item = &'t Value>,
    ) -> Self {
        let buckets = daily_counts(timestamps);
        let (dates, counts) = buckets
            .into_iter()
            .map(|(day, count)| (day.format("%Y-%m-%d").to_string(), count))
            .unzip();
        Self {
            label: label.to_string(),
            kind,
            dates,
            counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub searches: ChartSeries,
    pub registrations: ChartSeries,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StatsData {
    history_entries: Option<Vec<TimestampRow>>,
    users: Option<Vec<TimestampRow>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimestampRow {
    #[serde(alias = "createdAt")]
    timestamp: Value,
}

impl StatsView {
    fn from_data(data: StatsData) -> Self {
        let history = data.history_entries.unwrap_or_default();
        let users = data.users.unwrap_or_default();
        Self {
            searches: ChartSeries::from_timestamps(
                SEARCHES_LABEL,
                ChartKind::Line,
                history.iter().map(|row| &row.timestamp),
            ),
            registrations: ChartSeries::from_timestamps(
                REGISTRATIONS_LABEL,
                ChartKind::Bar,
                users.iter().map(|row| &row.timestamp),
            ),
        }
    }
}

pub struct StatsService<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> StatsService<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Fetches history and user timestamps and buckets them per day.
    ///
    /// # Errors
    /// The dispatcher's classification, or `ServerError` for an unexpected
    /// payload shape.
    pub async fn get_stats(&self) -> RequestResult<StatsView> {
        let data = self.dispatcher.graphql(STATS_QUERY, json!({})).await?;
        let data: StatsData = if data.is_null() {
            StatsData::default()
        } else {
            from_payload(data, "stats")?
        };
        Ok(StatsView::from_data(data))
    }
}

fn daily_counts<'t>(timestamps: impl IntoIterator<Item = &'t Value>) -> BTreeMap<NaiveDate, u64> {
    let mut buckets = BTreeMap::new();
    for value in timestamps {
        match parse_day(value) {
            Some(day) => *buckets.entry(day).or_insert(0) += 1,
            None if value.is_null() => {}
            None => tracing::debug!("skipping unparseable timestamp: {value}"),
        }
    }
    buckets
}

/// Calendar day of an RFC 3339 string, a naive ISO date/time, or epoch millis.
fn parse_day(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_day_str(s.trim()),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn parse_day_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.to_utc().date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
