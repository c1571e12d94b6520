//! Mentor call ledger
//!
//! Read-only projections over `Enrollment::booked_calls`. The ledger is append-only
//! upstream; revoking a mentor never removes its calls.

use crate::models::{Call, CallStatus};

/// Statuses that count as "this mentor already has a call"
const BOOKED_STATUSES: [CallStatus; 3] = [
    CallStatus::Pending,
    CallStatus::Scheduled,
    CallStatus::Completed,
];

/// True iff some call with the mentor is pending, scheduled or completed
pub fn has_booked_call(calls: &[Call], mentor_id: &str) -> bool {
    calls
        .iter()
        .any(|c| c.mentor_id == mentor_id && BOOKED_STATUSES.contains(&c.status))
}

/// True iff some call with the mentor is completed
pub fn has_completed_call(calls: &[Call], mentor_id: &str) -> bool {
    calls
        .iter()
        .any(|c| c.mentor_id == mentor_id && c.status == CallStatus::Completed)
}

/// The most recent call with the mentor.
///
/// Recency is `created_at`; calls without a timestamp rank oldest. Equal ranks keep
/// upstream array order, so the earliest element wins a tie.
pub fn call_info<'a>(calls: &'a [Call], mentor_id: &str) -> Option<&'a Call> {
    calls
        .iter()
        .filter(|c| c.mentor_id == mentor_id)
        .fold(None, |best: Option<&Call>, c| match best {
            Some(b) if b.created_at >= c.created_at => Some(b),
            _ => Some(c),
        })
}

/// All calls with the mentor, newest first
pub fn calls_for_mentor<'a>(calls: &'a [Call], mentor_id: &str) -> Vec<&'a Call> {
    let mut history: Vec<&Call> = calls.iter().filter(|c| c.mentor_id == mentor_id).collect();
    // Stable sort keeps upstream order between equal timestamps
    history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::fixtures::{call, call_at};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_no_calls_means_nothing_booked() {
        let calls = vec![call("c1", "other", CallStatus::Completed)];
        assert!(!has_booked_call(&calls, "m1"));
        assert!(!has_completed_call(&calls, "m1"));
        assert!(call_info(&calls, "m1").is_none());
    }

    #[test]
    fn test_pending_call_is_booked_but_not_completed() {
        let calls = vec![call("c1", "m1", CallStatus::Pending)];
        assert!(has_booked_call(&calls, "m1"));
        assert!(!has_completed_call(&calls, "m1"));
    }

    #[test]
    fn test_scheduled_call_is_booked() {
        let calls = vec![call("c1", "m1", CallStatus::Scheduled)];
        assert!(has_booked_call(&calls, "m1"));
        assert!(!has_completed_call(&calls, "m1"));
    }

    #[test]
    fn test_cancelled_call_does_not_count_as_booked() {
        let calls = vec![call("c1", "m1", CallStatus::Cancelled)];
        assert!(!has_booked_call(&calls, "m1"));
        assert!(!has_completed_call(&calls, "m1"));
    }

    #[test]
    fn test_unrecognised_status_is_neither_booked_nor_completed() {
        let calls = vec![call("c1", "m1", CallStatus::Unknown)];
        assert!(!has_booked_call(&calls, "m1"));
        assert!(!has_completed_call(&calls, "m1"));
        assert_eq!(call_info(&calls, "m1").map(|c| c.id.as_str()), Some("c1"));
    }

    #[test]
    fn test_completed_call_is_both() {
        let calls = vec![
            call("c1", "m1", CallStatus::Cancelled),
            call("c2", "m1", CallStatus::Completed),
        ];
        assert!(has_booked_call(&calls, "m1"));
        assert!(has_completed_call(&calls, "m1"));
    }

    #[test]
    fn test_call_info_prefers_most_recent() {
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        let calls = vec![
            call_at("old", "m1", CallStatus::Cancelled, base),
            call_at("new", "m1", CallStatus::Pending, base + Duration::days(2)),
            call_at("mid", "m1", CallStatus::Cancelled, base + Duration::days(1)),
        ];
        assert_eq!(call_info(&calls, "m1").unwrap().id, "new");
    }

    #[test]
    fn test_call_info_ties_keep_array_order() {
        let calls = vec![
            call("first", "m1", CallStatus::Cancelled),
            call("second", "m1", CallStatus::Pending),
        ];
        assert_eq!(call_info(&calls, "m1").unwrap().id, "first");
    }

    #[test]
    fn test_history_is_newest_first() {
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        let calls = vec![
            call_at("a", "m1", CallStatus::Cancelled, base),
            call_at("x", "m2", CallStatus::Pending, base),
            call_at("b", "m1", CallStatus::Completed, base + Duration::hours(5)),
        ];
        let ids: Vec<&str> = calls_for_mentor(&calls, "m1")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
