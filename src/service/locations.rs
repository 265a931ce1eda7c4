//! Per-location vessel counts.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Category, Event};

/// Vessel activity attributed to one location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationStats {
    pub name: String,
    pub inport: usize,
    pub arrivals: usize,
    pub departures: usize,
    pub forecast: usize,
    pub total: usize,
}

impl LocationStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn count(&mut self, category: Category) {
        match category {
            Category::Inport => self.inport += 1,
            Category::Arrivals => self.arrivals += 1,
            Category::Departures => self.departures += 1,
            Category::Forecast => self.forecast += 1,
            Category::Bridge => return,
        }
        self.total += 1;
    }

    /// `min_total` bound and case-insensitive name substring `q`.
    pub fn matches(&self, min_total: usize, q: Option<&str>) -> bool {
        self.total >= min_total
            && q.map_or(true, |q| self.name.to_lowercase().contains(&q.to_lowercase()))
    }
}

/// Group events by [`Event::place`], busiest location first.
///
/// Events without a place are ignored. Equal totals are ordered by name.
pub fn aggregate(events: &[Event]) -> Vec<LocationStats> {
    let mut by_name: HashMap<&str, LocationStats> = HashMap::new();
    for event in events {
        let Some(place) = event.place().filter(|p| !p.trim().is_empty()) else {
            continue;
        };
        by_name
            .entry(place)
            .or_insert_with(|| LocationStats::new(place))
            .count(event.category);
    }

    let mut stats: Vec<LocationStats> = by_name.into_values().collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    stats
}
