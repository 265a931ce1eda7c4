//! Port of London vessel feed (JSON API).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::client::get_body;
use super::{UpstreamError, VesselSource};
use crate::models::{Category, Event, VesselKind};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    inport: Vec<VesselRecord>,
    #[serde(default)]
    arrivals: Vec<VesselRecord>,
    #[serde(default)]
    departures: Vec<VesselRecord>,
    #[serde(default)]
    forecast: Vec<VesselRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VesselRecord {
    location_from: String,
    location_to: String,
    location_name: String,
    vessel_name: String,
    visit: String,
    last_rep_dt: String,
    first_rep_dt: String,
    etad_dt: String,
}

pub struct PortOfLondonSource {
    client: Client,
    url: String,
}

impl PortOfLondonSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl VesselSource for PortOfLondonSource {
    async fn vessels(&self, kind: VesselKind) -> Result<Vec<Event>, UpstreamError> {
        if self.url.is_empty() {
            return Err(UpstreamError::NotConfigured);
        }
        tracing::info!(url = %self.url, kind = %kind, "Fetching vessels from API");

        let body = get_body(&self.client, &self.url).await?;
        let events = parse_vessels(&body, kind, Utc::now())?;

        tracing::info!(kind = %kind, count = events.len(), "Retrieved vessel events");
        Ok(events)
    }
}

/// Decode an API body into events of `kind`.
///
/// Records without a vessel name are skipped, as are records without a
/// visit number outside the forecast list. Unparsable times become `now`.
pub fn parse_vessels(
    body: &str,
    kind: VesselKind,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, UpstreamError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

    let lists = [
        (Category::Inport, response.inport),
        (Category::Arrivals, response.arrivals),
        (Category::Departures, response.departures),
        (Category::Forecast, response.forecast),
    ];

    let mut events = Vec::new();
    for (category, records) in lists {
        if kind.category().is_some_and(|wanted| wanted != category) {
            continue;
        }
        events.extend(records.into_iter().filter_map(|r| to_event(r, category, now)));
    }
    Ok(events)
}

fn to_event(record: VesselRecord, category: Category, now: DateTime<Utc>) -> Option<Event> {
    if record.vessel_name.is_empty() {
        tracing::warn!(category = %category, "Missing vessel name, skipping");
        return None;
    }
    if record.visit.is_empty() && category != Category::Forecast {
        tracing::warn!(vessel = %record.vessel_name, "Missing voyage number, skipping");
        return None;
    }

    let raw_time = match category {
        Category::Departures => &record.first_rep_dt,
        Category::Forecast => &record.etad_dt,
        _ => &record.last_rep_dt,
    };

    Some(Event {
        timestamp: parse_timestamp(raw_time).unwrap_or(now),
        vessel_name: record.vessel_name,
        category,
        voyage_number: non_empty(record.visit),
        direction: None,
        from: non_empty(record.location_from),
        to: non_empty(record.location_to),
        location: non_empty(record.location_name),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|t| t.and_utc())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BODY: &str = r#"{
        "inport": [
            {"vessel_name": "SEA LION", "visit": "V1", "location_name": "TILBURY", "last_rep_dt": "2025-03-01 10:15:00.000"},
            {"vessel_name": "", "visit": "V2"}
        ],
        "arrivals": [
            {"vessel_name": "NORTHERN STAR", "visit": "", "location_to": "GRAVESEND"}
        ],
        "departures": [
            {"vessel_name": "GLOBE", "visit": "V3", "location_from": "PURFLEET", "first_rep_dt": "2025-03-01 06:00:00.000"}
        ],
        "forecast": [
            {"vessel_name": "PIONEER", "location_to": "LONDON GATEWAY", "etad_dt": "garbage"}
        ]
    }"#;

    #[test]
    fn test_parse_all_lists_and_skip_incomplete_records() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let events = parse_vessels(BODY, VesselKind::All, now).unwrap();

        let names: Vec<_> = events.iter().map(|e| e.vessel_name.as_str()).collect();
        assert_eq!(names, vec!["SEA LION", "GLOBE", "PIONEER"]);

        assert_eq!(events[0].location.as_deref(), Some("TILBURY"));
        assert_eq!(events[0].timestamp, Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap());
        assert_eq!(events[1].timestamp, Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap());
        assert_eq!(events[1].from.as_deref(), Some("PURFLEET"));
        assert_eq!(events[2].timestamp, now, "unparsable forecast time falls back to now");
        assert_eq!(events[2].voyage_number, None);
    }

    #[test]
    fn test_parse_single_list() {
        let events = parse_vessels(BODY, VesselKind::Departures, Utc::now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, Category::Departures);
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = parse_vessels("<html>", VesselKind::All, Utc::now()).unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
    }
}
