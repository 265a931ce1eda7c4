//! Request-level narrowing of an event list by name, location and time.

use chrono::{DateTime, Utc};

use crate::models::{Category, Event};

/// Optional criteria; an empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    /// Case-insensitive substring of the vessel name.
    pub name: Option<String>,
    /// Case-insensitive substring of the category-appropriate place field.
    pub location: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.after.is_none() && self.before.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(name) = &self.name {
            if !contains_ignore_case(&event.vessel_name, name) {
                return false;
            }
        }

        if let Some(location) = &self.location {
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .is_some_and(|value| contains_ignore_case(value, location))
            };
            let matched = match event.category {
                Category::Inport => hit(&event.location),
                Category::Arrivals | Category::Forecast => hit(&event.to),
                Category::Departures => hit(&event.from),
                Category::Bridge => hit(&event.location) || hit(&event.to) || hit(&event.from),
            };
            if !matched {
                return false;
            }
        }

        if self.after.is_some_and(|after| event.timestamp < after) {
            return false;
        }
        if self.before.is_some_and(|before| event.timestamp > before) {
            return false;
        }
        true
    }

    /// Keep the matching events, in order.
    pub fn filter(&self, events: Vec<Event>) -> Vec<Event> {
        if self.is_empty() {
            return events;
        }
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(name: &str, category: Category, hour: u32) -> Event {
        Event::new(name, category, Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap())
    }

    #[test]
    fn test_name_and_time_window() {
        let events = vec![
            event("Silver Sturgeon", Category::Bridge, 9),
            event("SILVER DUCHESS", Category::Bridge, 14),
            event("Dixie Queen", Category::Bridge, 11),
        ];
        let query = EventQuery {
            name: Some("silver".into()),
            after: Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()),
            ..Default::default()
        };

        let kept = query.filter(events);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].vessel_name, "SILVER DUCHESS");
    }

    #[test]
    fn test_location_uses_category_field() {
        let mut arriving = event("A", Category::Arrivals, 8);
        arriving.to = Some("Tilbury".into());
        arriving.from = Some("Rotterdam".into());
        let mut leaving = event("B", Category::Departures, 8);
        leaving.from = Some("TILBURY 2".into());

        let query = EventQuery {
            location: Some("tilbury".into()),
            ..Default::default()
        };
        assert!(query.matches(&arriving));
        assert!(query.matches(&leaving));

        let query = EventQuery {
            location: Some("rotterdam".into()),
            ..Default::default()
        };
        assert!(!query.matches(&arriving));
    }
}
