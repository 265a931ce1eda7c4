//! Frequency-based suppression of over-represented vessels.
//!
//! # Design Decisions
//! - Pure functions over a complete batch; input order is preserved
//! - Ranking ties are broken by first appearance so the output is deterministic

use std::collections::HashMap;

use crate::models::{Category, Event};

/// How a batch is thinned before it is returned to a `unique` request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterPolicy {
    /// Keep a vessel only while it appears at most `threshold` times
    /// within its category.
    HardThreshold { threshold: usize },

    /// Drop the top `percentile` of vessels by count (at least one), and any
    /// vessel appearing more than `max_count` times.
    HybridPercentile { percentile: f64, max_count: usize },
}

impl FilterPolicy {
    pub const DEFAULT_THRESHOLD: usize = 4;
    pub const DEFAULT_PERCENTILE: f64 = 0.10;
    pub const DEFAULT_MAX_COUNT: usize = 8;
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy::HardThreshold {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

/// Apply `policy` to `events`, returning the surviving events in input order.
pub fn apply(events: &[Event], policy: FilterPolicy) -> Vec<Event> {
    match policy {
        FilterPolicy::HardThreshold { threshold } => hard_threshold(events, threshold),
        FilterPolicy::HybridPercentile {
            percentile,
            max_count,
        } => hybrid_percentile(events, percentile, max_count),
    }
}

fn hard_threshold(events: &[Event], threshold: usize) -> Vec<Event> {
    let mut counts: HashMap<(Category, &str), usize> = HashMap::new();
    for event in events {
        *counts
            .entry((event.category, event.vessel_name.as_str()))
            .or_default() += 1;
    }

    events
        .iter()
        .filter(|e| counts[&(e.category, e.vessel_name.as_str())] <= threshold)
        .cloned()
        .collect()
}

fn hybrid_percentile(events: &[Event], percentile: f64, max_count: usize) -> Vec<Event> {
    // (name, count) in order of first appearance.
    let mut ranked: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for event in events {
        let name = event.vessel_name.as_str();
        match index.get(name) {
            Some(&i) => ranked[i].1 += 1,
            None => {
                index.insert(name, ranked.len());
                ranked.push((name, 1));
            }
        }
    }
    if ranked.is_empty() {
        return Vec::new();
    }

    // Stable sort keeps first-appearance order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let cutoff = ((percentile * ranked.len() as f64).floor() as usize).max(1);

    let suppressed: HashMap<&str, ()> = ranked
        .iter()
        .enumerate()
        .filter(|(rank, (_, count))| *rank < cutoff || *count > max_count)
        .map(|(_, (name, _))| (*name, ()))
        .collect();

    events
        .iter()
        .filter(|e| !suppressed.contains_key(e.vessel_name.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn batch(category: Category, counts: &[(&str, usize)]) -> Vec<Event> {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let mut events = Vec::new();
        for (name, count) in counts {
            for i in 0..*count {
                events.push(Event::new(*name, category, base + Duration::minutes(i as i64)));
            }
        }
        events
    }

    fn names(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.vessel_name.as_str()).collect()
    }

    #[test]
    fn test_hard_threshold_drops_vessels_above_threshold() {
        let events = batch(Category::Inport, &[("A", 5), ("B", 2)]);
        let kept = apply(&events, FilterPolicy::HardThreshold { threshold: 4 });
        assert_eq!(names(&kept), vec!["B", "B"]);
    }

    #[test]
    fn test_hard_threshold_counts_per_category() {
        let mut events = batch(Category::Arrivals, &[("A", 3)]);
        events.extend(batch(Category::Departures, &[("A", 3)]));

        let kept = apply(&events, FilterPolicy::HardThreshold { threshold: 4 });
        assert_eq!(kept.len(), 6);
    }

    #[test]
    fn test_hybrid_caps_count_outside_top_percentile() {
        // Ten distinct vessels: cutoff = floor(0.1 * 10) = 1, so only "top"
        // is suppressed by rank; "busy" goes for exceeding max_count.
        let mut counts = vec![("top", 12), ("busy", 9)];
        let others = ["c", "d", "e", "f", "g", "h", "i", "j"];
        counts.extend(others.iter().map(|n| (*n, 2)));
        let events = batch(Category::Bridge, &counts);

        let kept = apply(
            &events,
            FilterPolicy::HybridPercentile {
                percentile: 0.10,
                max_count: 8,
            },
        );

        assert!(!names(&kept).contains(&"top"));
        assert!(!names(&kept).contains(&"busy"));
        assert_eq!(kept.len(), others.len() * 2);
    }

    #[test]
    fn test_hybrid_always_suppresses_at_least_one() {
        let events = batch(Category::Bridge, &[("solo", 1), ("pair", 1)]);
        let kept = apply(
            &events,
            FilterPolicy::HybridPercentile {
                percentile: 0.10,
                max_count: 8,
            },
        );
        // Equal counts: the first seen vessel ranks first.
        assert_eq!(names(&kept), vec!["pair"]);
    }

    #[test]
    fn test_empty_batch_and_input_untouched() {
        assert!(apply(&[], FilterPolicy::default()).is_empty());

        let events = batch(Category::Bridge, &[("A", 2), ("B", 1)]);
        let before = events.clone();
        let first = apply(&events, FilterPolicy::HybridPercentile { percentile: 0.5, max_count: 8 });
        let second = apply(&events, FilterPolicy::HybridPercentile { percentile: 0.5, max_count: 8 });
        assert_eq!(events, before);
        assert_eq!(first, second);
    }
}
