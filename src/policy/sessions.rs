//! Live session classification
//!
//! Buckets may overlap: an ongoing session that started yesterday is both upcoming
//! and past. Every bucket uses the same order: ongoing first, then by scheduled
//! date ascending, undated last. Ties keep upstream order.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Session, SessionStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionView {
    #[default]
    Upcoming,
    Today,
    Past,
    All,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedSession {
    #[serde(flatten)]
    pub session: Session,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionBuckets {
    pub upcoming: Vec<ClassifiedSession>,
    pub today: Vec<ClassifiedSession>,
    pub past: Vec<ClassifiedSession>,
    pub all: Vec<ClassifiedSession>,
}

impl SessionBuckets {
    pub fn into_view(self, view: SessionView) -> Vec<ClassifiedSession> {
        match view {
            SessionView::Upcoming => self.upcoming,
            SessionView::Today => self.today,
            SessionView::Past => self.past,
            SessionView::All => self.all,
        }
    }
}

pub fn is_upcoming(session: &Session, now: DateTime<Utc>) -> bool {
    session.status == SessionStatus::Ongoing
        || (session.status == SessionStatus::Scheduled
            && session.scheduled_date.is_some_and(|d| d > now))
}

pub fn is_past(session: &Session, now: DateTime<Utc>) -> bool {
    session.status == SessionStatus::Completed || session.scheduled_date.is_some_and(|d| d < now)
}

/// Half-open local day `[midnight, midnight + 1 day)` containing `now`
pub fn day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(chrono::NaiveTime::MIN);
    let start = local_midnight.and_utc() - Duration::seconds(i64::from(offset.local_minus_utc()));
    (start, start + Duration::days(1))
}

pub fn is_today(session: &Session, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    let (start, end) = day_bounds(now, offset);
    session
        .scheduled_date
        .is_some_and(|d| d >= start && d < end)
}

/// Sort in place: ongoing first, dated ascending, undated last
pub fn sort_sessions(sessions: &mut [ClassifiedSession]) {
    sessions.sort_by_key(|s| {
        (
            s.session.status != SessionStatus::Ongoing,
            s.session.scheduled_date.is_none(),
            s.session.scheduled_date,
        )
    });
}

/// End of a session, using `default_minutes` when it has no duration
pub fn ends_at(session: &Session, default_minutes: u32) -> Option<DateTime<Utc>> {
    let minutes = session.duration.unwrap_or(default_minutes);
    session
        .scheduled_date
        .map(|start| start + Duration::minutes(i64::from(minutes)))
}

pub fn classify(
    sessions: Vec<Session>,
    now: DateTime<Utc>,
    offset: FixedOffset,
    default_minutes: u32,
) -> SessionBuckets {
    let mut buckets = SessionBuckets::default();

    for session in sessions {
        let upcoming = is_upcoming(&session, now);
        let today = is_today(&session, now, offset);
        let past = is_past(&session, now);
        let entry = ClassifiedSession {
            ends_at: ends_at(&session, default_minutes),
            session,
        };
        if upcoming {
            buckets.upcoming.push(entry.clone());
        }
        if today {
            buckets.today.push(entry.clone());
        }
        if past {
            buckets.past.push(entry.clone());
        }
        buckets.all.push(entry);
    }

    sort_sessions(&mut buckets.upcoming);
    sort_sessions(&mut buckets.today);
    sort_sessions(&mut buckets.past);
    sort_sessions(&mut buckets.all);
    buckets
}
