//! Unified river event type shared by both upstream sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Category of a river event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Tower Bridge lift.
    Bridge,
    /// Vessel currently in port.
    Inport,
    Arrivals,
    Departures,
    Forecast,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bridge => "bridge",
            Category::Inport => "inport",
            Category::Arrivals => "arrivals",
            Category::Departures => "departures",
            Category::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single bridge lift or vessel movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event time (serialized as RFC3339).
    pub timestamp: DateTime<Utc>,
    pub vessel_name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voyage_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Event {
    /// Create an event with only the identifying fields set.
    pub fn new(vessel_name: impl Into<String>, category: Category, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            vessel_name: vessel_name.into(),
            category,
            voyage_number: None,
            direction: None,
            from: None,
            to: None,
            location: None,
        }
    }

    /// The location name this event is attributed to for its category.
    ///
    /// In-port vessels report where they are, arrivals and forecasts where
    /// they are heading, departures where they left from.
    pub fn place(&self) -> Option<&str> {
        match self.category {
            Category::Inport => self.location.as_deref(),
            Category::Arrivals | Category::Forecast => self.to.as_deref(),
            Category::Departures => self.from.as_deref(),
            Category::Bridge => None,
        }
    }
}

/// A resource variant outside the known enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type: {0}")]
pub struct InvalidVariant(pub String);

/// Which vessel list to request from the vessel source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VesselKind {
    All,
    Inport,
    Arrivals,
    Departures,
    Forecast,
}

impl VesselKind {
    pub const ALL: [VesselKind; 5] = [
        VesselKind::All,
        VesselKind::Inport,
        VesselKind::Arrivals,
        VesselKind::Departures,
        VesselKind::Forecast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VesselKind::All => "all",
            VesselKind::Inport => "inport",
            VesselKind::Arrivals => "arrivals",
            VesselKind::Departures => "departures",
            VesselKind::Forecast => "forecast",
        }
    }

    /// The single category this kind selects, or `None` for `All`.
    pub fn category(&self) -> Option<Category> {
        match self {
            VesselKind::All => None,
            VesselKind::Inport => Some(Category::Inport),
            VesselKind::Arrivals => Some(Category::Arrivals),
            VesselKind::Departures => Some(Category::Departures),
            VesselKind::Forecast => Some(Category::Forecast),
        }
    }
}

impl fmt::Display for VesselKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VesselKind {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        VesselKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| InvalidVariant(s.to_string()))
    }
}
