//! Read-side analytics over the audit trail.
//!
//! `AuditQuery` shares the trail's storage and never mutates it — it adds
//! no durable structures and does not participate in the write path.
//! Aggregations run over response-direction rows only: a response row is
//! the terminal record of one completed pipeline run, so counting
//! responses counts requests exactly once each.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use semblance_contracts::{
    action::ActionType,
    entry::{AuditEntry, Direction, EntryStatus},
};

use crate::trail::{InMemoryAuditTrail, TrailState};

/// A reporting period, resolved against the invocation time — callers do
/// not supply their own "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Since midnight UTC of the current day.
    Today,
    /// The trailing 7 days.
    Week,
    /// The trailing 30 days.
    Month,
    /// No lower bound.
    All,
}

impl Period {
    /// The concrete `after` boundary for this period relative to `now`,
    /// or `None` for an unbounded period.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Today => Utc
                .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
                .single(),
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => Some(now - Duration::days(30)),
            Period::All => None,
        }
    }
}

/// Timeline bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    Day,
}

/// A composable entry filter. Empty fields match everything.
///
/// `offset`/`limit` paginate `get_entries`; `count_entries` ignores them
/// and counts every matching row.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub action: Option<ActionType>,
    pub status: Option<EntryStatus>,
    pub direction: Option<Direction>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl EntryFilter {
    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(after) = self.after {
            if entry.timestamp < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if entry.timestamp > before {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(status) = self.status {
            if entry.status != status {
                return false;
            }
        }
        if let Some(direction) = self.direction {
            if entry.direction != direction {
                return false;
            }
        }
        true
    }
}

/// Per-service rollup for one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAggregate {
    /// The service prefix of the action (`email` for `email.fetch`).
    pub service: String,
    /// Completed pipeline runs (response rows) for this service.
    pub request_count: u64,
    pub success_count: u64,
    /// Everything terminal that was not a success: error, rate-limited,
    /// rejected.
    pub error_count: u64,
    pub time_saved_seconds: u64,
}

/// One timeline bucket, keyed by its truncated start instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBucket {
    pub bucket: DateTime<Utc>,
    pub count: u64,
}

/// Read-only analytics handle over a trail's storage.
pub struct AuditQuery {
    state: Arc<Mutex<TrailState>>,
}

impl AuditQuery {
    /// Create a query layer sharing `trail`'s storage.
    pub fn new(trail: &InMemoryAuditTrail) -> Self {
        Self {
            state: Arc::clone(&trail.state),
        }
    }

    /// Matching entries in insertion order, paginated by the filter's
    /// offset/limit.
    pub fn get_entries(&self, filter: &EntryFilter) -> Vec<AuditEntry> {
        let state = self.lock();
        let matching = state.entries.iter().filter(|e| filter.matches(e));

        match filter.limit {
            Some(limit) => matching.skip(filter.offset).take(limit).cloned().collect(),
            None => matching.skip(filter.offset).cloned().collect(),
        }
    }

    /// Number of matching entries, ignoring pagination.
    pub fn count_entries(&self, filter: &EntryFilter) -> usize {
        self.lock().entries.iter().filter(|e| filter.matches(e)).count()
    }

    /// Per-service rollup of completed runs within `period`, sorted by
    /// service name.
    pub fn aggregate_by_service(&self, period: Period) -> Vec<ServiceAggregate> {
        let after = period.start(Utc::now());
        let state = self.lock();

        let mut groups: BTreeMap<String, ServiceAggregate> = BTreeMap::new();
        for entry in Self::responses_after(&state, after) {
            let group = groups
                .entry(entry.action.service().to_string())
                .or_insert_with(|| ServiceAggregate {
                    service: entry.action.service().to_string(),
                    request_count: 0,
                    success_count: 0,
                    error_count: 0,
                    time_saved_seconds: 0,
                });

            group.request_count += 1;
            if entry.status == EntryStatus::Success {
                group.success_count += 1;
            } else {
                group.error_count += 1;
            }
            group.time_saved_seconds += entry.estimated_time_saved_seconds;
        }

        groups.into_values().collect()
    }

    /// Completed runs bucketed by hour or day, ascending, for charting.
    pub fn timeline(&self, period: Period, granularity: Granularity) -> Vec<TimelineBucket> {
        let after = period.start(Utc::now());
        let state = self.lock();

        let mut buckets: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
        for entry in Self::responses_after(&state, after) {
            if let Some(bucket) = truncate(entry.timestamp, granularity) {
                *buckets.entry(bucket).or_insert(0) += 1;
            }
        }

        buckets
            .into_iter()
            .map(|(bucket, count)| TimelineBucket { bucket, count })
            .collect()
    }

    /// The `limit` most recent entries with `status`, ascending.
    pub fn get_by_status(&self, status: EntryStatus, limit: usize) -> Vec<AuditEntry> {
        let state = self.lock();
        let matching: Vec<AuditEntry> = state
            .entries
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect();

        let skip = matching.len().saturating_sub(limit);
        matching[skip..].to_vec()
    }

    /// Distinct dotted action names seen within `period`, sorted.
    pub fn distinct_actions(&self, period: Period) -> Vec<String> {
        let after = period.start(Utc::now());
        let state = self.lock();

        let mut actions = BTreeSet::new();
        for entry in &state.entries {
            if within(after, entry.timestamp) {
                actions.insert(entry.action.to_string());
            }
        }
        actions.into_iter().collect()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, TrailState> {
        self.state.lock().expect("audit state lock poisoned")
    }

    fn responses_after(
        state: &TrailState,
        after: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &AuditEntry> {
        state
            .entries
            .iter()
            .filter(move |e| e.direction == Direction::Response && within(after, e.timestamp))
    }
}

/// True when there is no lower boundary or `ts` is at/after it.
fn within(after: Option<DateTime<Utc>>, ts: DateTime<Utc>) -> bool {
    match after {
        Some(after) => ts >= after,
        None => true,
    }
}

/// Truncate `ts` down to the start of its hour or day.
fn truncate(ts: DateTime<Utc>, granularity: Granularity) -> Option<DateTime<Utc>> {
    let hour = match granularity {
        Granularity::Hour => ts.hour(),
        Granularity::Day => 0,
    };
    Utc.with_ymd_and_hms(ts.year(), ts.month(), ts.day(), hour, 0, 0)
        .single()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use semblance_contracts::{
        action::ActionType,
        entry::{Direction, EntryStatus, NewAuditEntry},
    };

    use crate::trail::InMemoryAuditTrail;

    use super::{AuditQuery, EntryFilter, Granularity, Period};

    fn response(action: ActionType, status: EntryStatus, time_saved: u64) -> NewAuditEntry {
        NewAuditEntry {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            direction: Direction::Response,
            status,
            payload_hash: "0".repeat(64),
            signature: "sig".to_string(),
            metadata: None,
            estimated_time_saved_seconds: time_saved,
        }
    }

    fn request(action: ActionType) -> NewAuditEntry {
        NewAuditEntry {
            direction: Direction::Request,
            status: EntryStatus::Pending,
            ..response(action, EntryStatus::Pending, 0)
        }
    }

    /// The aggregation example from the dashboard contract: email.fetch,
    /// email.send, calendar.create within the period yield exactly two
    /// groups, email (count 2) and calendar (count 1).
    #[test]
    fn test_aggregate_by_service_groups_by_prefix() {
        let trail = InMemoryAuditTrail::new();
        trail.append(response(ActionType::EmailFetch, EntryStatus::Success, 30)).unwrap();
        trail.append(response(ActionType::EmailSend, EntryStatus::Error, 30)).unwrap();
        trail.append(response(ActionType::CalendarCreate, EntryStatus::Success, 10)).unwrap();

        let query = AuditQuery::new(&trail);
        let groups = query.aggregate_by_service(Period::Month);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].service, "calendar");
        assert_eq!(groups[0].request_count, 1);
        assert_eq!(groups[0].success_count, 1);
        assert_eq!(groups[1].service, "email");
        assert_eq!(groups[1].request_count, 2);
        assert_eq!(groups[1].success_count, 1);
        assert_eq!(groups[1].error_count, 1);
        assert_eq!(groups[1].time_saved_seconds, 60);
    }

    /// Request-direction rows never count toward aggregation — a pipeline
    /// run is tallied once, by its terminal response row.
    #[test]
    fn test_aggregation_ignores_request_rows() {
        let trail = InMemoryAuditTrail::new();
        trail.append(request(ActionType::EmailFetch)).unwrap();
        trail.append(response(ActionType::EmailFetch, EntryStatus::Success, 0)).unwrap();

        let query = AuditQuery::new(&trail);
        let groups = query.aggregate_by_service(Period::All);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].request_count, 1);
    }

    #[test]
    fn test_filter_composition_and_pagination() {
        let trail = InMemoryAuditTrail::new();
        for _ in 0..5 {
            trail.append(response(ActionType::EmailFetch, EntryStatus::Success, 0)).unwrap();
        }
        trail.append(response(ActionType::EmailFetch, EntryStatus::Error, 0)).unwrap();

        let query = AuditQuery::new(&trail);

        let successes = EntryFilter {
            status: Some(EntryStatus::Success),
            ..EntryFilter::default()
        };
        assert_eq!(query.count_entries(&successes), 5);

        // Pagination applies after filtering; count ignores it.
        let page = EntryFilter {
            status: Some(EntryStatus::Success),
            offset: 3,
            limit: Some(10),
            ..EntryFilter::default()
        };
        assert_eq!(query.get_entries(&page).len(), 2);
        assert_eq!(query.count_entries(&page), 5);

        let by_action = EntryFilter {
            action: Some(ActionType::CalendarList),
            ..EntryFilter::default()
        };
        assert_eq!(query.count_entries(&by_action), 0);
    }

    #[test]
    fn test_filter_time_window() {
        let trail = InMemoryAuditTrail::new();
        let t0 = Utc::now();

        let mut old = response(ActionType::EmailFetch, EntryStatus::Success, 0);
        old.timestamp = t0 - Duration::days(2);
        trail.append(old).unwrap();
        trail.append(response(ActionType::EmailFetch, EntryStatus::Success, 0)).unwrap();

        let query = AuditQuery::new(&trail);
        let recent = EntryFilter {
            after: Some(t0 - Duration::hours(1)),
            ..EntryFilter::default()
        };
        assert_eq!(query.count_entries(&recent), 1);

        let old_only = EntryFilter {
            before: Some(t0 - Duration::days(1)),
            ..EntryFilter::default()
        };
        assert_eq!(query.count_entries(&old_only), 1);
    }

    #[test]
    fn test_get_by_status_returns_recent_ascending() {
        let trail = InMemoryAuditTrail::new();
        for n in 0..4u64 {
            let mut e = response(ActionType::EmailFetch, EntryStatus::Error, 0);
            e.estimated_time_saved_seconds = n;
            trail.append(e).unwrap();
        }

        let query = AuditQuery::new(&trail);
        let errors = query.get_by_status(EntryStatus::Error, 2);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].estimated_time_saved_seconds, 2);
        assert_eq!(errors[1].estimated_time_saved_seconds, 3);
    }

    #[test]
    fn test_distinct_actions_sorted() {
        let trail = InMemoryAuditTrail::new();
        trail.append(response(ActionType::SearchQuery, EntryStatus::Success, 0)).unwrap();
        trail.append(response(ActionType::EmailFetch, EntryStatus::Success, 0)).unwrap();
        trail.append(response(ActionType::EmailFetch, EntryStatus::Error, 0)).unwrap();

        let query = AuditQuery::new(&trail);
        assert_eq!(
            query.distinct_actions(Period::All),
            vec!["email.fetch".to_string(), "search.query".to_string()]
        );
    }

    #[test]
    fn test_timeline_buckets_by_day() {
        let trail = InMemoryAuditTrail::new();
        let now = Utc::now();

        for offset in [0, 0, 1] {
            let mut e = response(ActionType::EmailFetch, EntryStatus::Success, 0);
            e.timestamp = now - Duration::days(offset);
            trail.append(e).unwrap();
        }

        let query = AuditQuery::new(&trail);
        let buckets = query.timeline(Period::Week, Granularity::Day);

        assert_eq!(buckets.len(), 2);
        // Ascending: yesterday first, then today with two runs.
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 2);
        assert!(buckets[0].bucket < buckets[1].bucket);
    }

    #[test]
    fn test_period_boundaries() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 15, 30, 45).unwrap();

        assert_eq!(
            Period::Today.start(now),
            Some(Utc.with_ymd_and_hms(2026, 8, 29, 0, 0, 0).unwrap())
        );
        assert_eq!(Period::Week.start(now), Some(now - Duration::days(7)));
        assert_eq!(Period::Month.start(now), Some(now - Duration::days(30)));
        assert_eq!(Period::All.start(now), None);
    }

    /// Entries older than the period are excluded from aggregation.
    #[test]
    fn test_aggregation_respects_period_window() {
        let trail = InMemoryAuditTrail::new();

        let mut stale = response(ActionType::EmailFetch, EntryStatus::Success, 0);
        stale.timestamp = Utc::now() - Duration::days(45);
        trail.append(stale).unwrap();
        trail.append(response(ActionType::EmailFetch, EntryStatus::Success, 0)).unwrap();

        let query = AuditQuery::new(&trail);
        assert_eq!(query.aggregate_by_service(Period::Month)[0].request_count, 1);
        assert_eq!(query.aggregate_by_service(Period::All)[0].request_count, 2);
    }
}
