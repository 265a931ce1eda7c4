//! Query-string parameters shared by the event endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::ApiError;
use crate::filter::EventQuery;
use crate::models::VesselKind;

/// Parameters accepted by `/bridge-lifts` and `/vessels`.
#[derive(Debug, Default, Deserialize)]
pub struct EventParams {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    pub unique: Option<String>,
    pub name: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl EventParams {
    /// `unique=true` (any case) enables frequency filtering.
    pub fn unique(&self) -> bool {
        self.unique
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// `category` wins over `type`; both absent means all vessels.
    pub fn vessel_kind(&self) -> Result<VesselKind, ApiError> {
        match non_blank(&self.category).or_else(|| non_blank(&self.kind)) {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(VesselKind::All),
        }
    }

    /// Name, location and time window as an [`EventQuery`].
    pub fn event_query(&self) -> Result<EventQuery, ApiError> {
        Ok(EventQuery {
            name: non_blank(&self.name).map(String::from),
            location: non_blank(&self.location).map(String::from),
            after: parse_bound("after", &self.after)?,
            before: parse_bound("before", &self.before)?,
        })
    }
}

/// Parameters accepted by `/locations`.
#[derive(Debug, Default, Deserialize)]
pub struct LocationParams {
    #[serde(rename = "minTotal")]
    pub min_total: Option<String>,
    pub q: Option<String>,
}

impl LocationParams {
    pub fn min_total(&self) -> Result<usize, ApiError> {
        match non_blank(&self.min_total) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("invalid minTotal parameter: {raw}"))),
            None => Ok(0),
        }
    }

    pub fn q(&self) -> Option<&str> {
        non_blank(&self.q)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(param: &str, value: &Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    non_blank(value)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| ApiError::BadRequest(format!("invalid {param} parameter")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vessel_kind_prefers_category() {
        let params = EventParams {
            category: Some("Departures".into()),
            kind: Some("arrivals".into()),
            ..Default::default()
        };
        assert_eq!(params.vessel_kind().unwrap(), VesselKind::Departures);
        assert_eq!(EventParams::default().vessel_kind().unwrap(), VesselKind::All);

        let params = EventParams {
            kind: Some("cruise".into()),
            ..Default::default()
        };
        assert!(matches!(params.vessel_kind(), Err(ApiError::InvalidVariant(_))));
    }

    #[test]
    fn test_event_query_bounds() {
        let params = EventParams {
            name: Some("  ".into()),
            after: Some("2025-03-01T10:00:00+01:00".into()),
            unique: Some("TRUE".into()),
            ..Default::default()
        };
        let query = params.event_query().unwrap();
        assert!(params.unique());
        assert_eq!(query.name, None);
        assert_eq!(query.after.unwrap().to_rfc3339(), "2025-03-01T09:00:00+00:00");

        let params = EventParams {
            before: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(params.event_query(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_min_total() {
        let params = LocationParams {
            min_total: Some("3".into()),
            q: None,
        };
        assert_eq!(params.min_total().unwrap(), 3);
        assert!(LocationParams {
            min_total: Some("lots".into()),
            q: None
        }
        .min_total()
        .is_err());
    }
}
