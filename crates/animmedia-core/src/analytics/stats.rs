use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::AnalyticsEvent;

/// Trailing window considered by `Analytics::stats`: seven days.
pub const STATS_WINDOW_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Number of pages reported in `most_visited_pages`.
const TOP_PAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub total_events: usize,
    pub unique_sessions: usize,
    pub most_visited_pages: Vec<PageVisits>,
    /// Mean session duration in milliseconds.
    pub average_time_on_site: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageVisits {
    pub page: String,
    pub visits: usize,
}

/// Summarize the events newer than one window before `now_millis`.
pub fn compute_stats(events: &[AnalyticsEvent], now_millis: i64) -> AnalyticsStats {
    let cutoff = now_millis - STATS_WINDOW_MILLIS;
    let recent: Vec<&AnalyticsEvent> = events.iter().filter(|e| e.timestamp > cutoff).collect();

    AnalyticsStats {
        total_events: recent.len(),
        unique_sessions: recent
            .iter()
            .map(|e| e.session.as_str())
            .collect::<HashSet<_>>()
            .len(),
        most_visited_pages: most_visited(&recent),
        average_time_on_site: average_session_duration(&recent),
    }
}

/// Pages by visit count, ties kept in first-seen order.
fn most_visited(events: &[&AnalyticsEvent]) -> Vec<PageVisits> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut pages: Vec<PageVisits> = Vec::new();

    for event in events {
        match index.get(event.page.as_str()) {
            Some(&i) => pages[i].visits += 1,
            None => {
                index.insert(event.page.as_str(), pages.len());
                pages.push(PageVisits {
                    page: event.page.clone(),
                    visits: 1,
                });
            }
        }
    }

    // Stable sort preserves first-seen order among equal counts
    pages.sort_by(|a, b| b.visits.cmp(&a.visits));
    pages.truncate(TOP_PAGES);
    pages
}

fn average_session_duration(events: &[&AnalyticsEvent]) -> f64 {
    let mut sessions: HashMap<&str, (i64, i64)> = HashMap::new();
    for event in events {
        sessions
            .entry(event.session.as_str())
            .and_modify(|(start, end)| {
                *start = (*start).min(event.timestamp);
                *end = (*end).max(event.timestamp);
            })
            .or_insert((event.timestamp, event.timestamp));
    }

    if sessions.is_empty() {
        return 0.0;
    }
    let total: i64 = sessions.values().map(|(start, end)| end - start).sum();
    total as f64 / sessions.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_726_000_000_000;
    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn event(session: &str, page: &str, timestamp: i64) -> AnalyticsEvent {
        AnalyticsEvent {
            name: "page_view".to_string(),
            attributes: serde_json::Map::new(),
            timestamp,
            session: session.to_string(),
            page: page.to_string(),
        }
    }

    #[test]
    fn test_eight_day_span_excludes_oldest() {
        let events = vec![
            event("s1", "/", NOW - 8 * DAY),
            event("s2", "/pages/agenda.html", NOW - 6 * DAY),
            event("s2", "/pages/agenda.html", NOW - 6 * DAY + 30_000),
            event("s3", "/", NOW),
        ];

        let stats = compute_stats(&events, NOW);
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.unique_sessions, 2);
        assert_eq!(
            stats.most_visited_pages,
            vec![
                PageVisits { page: "/pages/agenda.html".to_string(), visits: 2 },
                PageVisits { page: "/".to_string(), visits: 1 },
            ]
        );
        // s2 lasted 30s, s3 a single instant
        assert_eq!(stats.average_time_on_site, 15_000.0);
    }

    #[test]
    fn test_event_exactly_at_cutoff_is_excluded() {
        let events = vec![event("s1", "/", NOW - STATS_WINDOW_MILLIS)];
        assert_eq!(compute_stats(&events, NOW).total_events, 0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[], NOW);
        assert_eq!(stats.total_events, 0);
        assert_eq!(stats.unique_sessions, 0);
        assert!(stats.most_visited_pages.is_empty());
        assert_eq!(stats.average_time_on_site, 0.0);
    }

    #[test]
    fn test_top_five_ties_keep_first_seen_order() {
        let pages = ["/a", "/b", "/c", "/d", "/e", "/f"];
        let mut events: Vec<AnalyticsEvent> =
            pages.iter().map(|p| event("s", p, NOW)).collect();
        events.push(event("s", "/f", NOW));

        let top: Vec<String> = compute_stats(&events, NOW)
            .most_visited_pages
            .into_iter()
            .map(|p| p.page)
            .collect();
        assert_eq!(top, vec!["/f", "/a", "/b", "/c", "/d"]);
    }
}
