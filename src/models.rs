//! Data model: raw source records, normalized observations, and the two
//! durable shapes (running aggregate and append-only ledger entry).

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scoring;

/// A raw last-active instant as delivered by the presence source.
///
/// Sources disagree on whether timestamps carry an offset; everything
/// downstream works on the normalized naive-UTC form only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Carries an explicit UTC offset
    Aware(DateTime<FixedOffset>),
    /// No offset; assumed to already be UTC
    Naive(NaiveDateTime),
}

/// One member of the watched group, as yielded by the presence stream.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub user_id: String,
    pub username: Option<String>,
    /// Absent for members that expose no presence status at all
    pub status: Option<MemberStatus>,
}

/// Presence status of a member. The last-active instant may be absent
/// (hidden, or the member is currently online with no recorded instant).
#[derive(Debug, Clone)]
pub struct MemberStatus {
    pub last_active: Option<RawTimestamp>,
}

/// A normalized (user, timestamp) fact ready for scoring. Produced once
/// per user per run and consumed immediately; never stored as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub user_id: String,
    pub username: Option<String>,
    /// Normalized to naive UTC before construction
    pub last_seen: NaiveDateTime,
}

impl Observation {
    /// Build an observation from a raw member record.
    ///
    /// Returns `Ok(None)` for members with no presence status or no
    /// last-active instant — those are not observations and are skipped
    /// without error. An empty user identifier is a malformed observation.
    pub fn from_member(member: &GroupMember) -> Result<Option<Self>, EngineError> {
        let Some(status) = &member.status else {
            return Ok(None);
        };
        let Some(raw) = &status.last_active else {
            return Ok(None);
        };

        if member.user_id.trim().is_empty() {
            return Err(EngineError::MalformedObservation(
                "empty user id".to_string(),
            ));
        }

        Ok(Some(Observation {
            user_id: member.user_id.clone(),
            username: member.username.clone(),
            last_seen: scoring::normalize(raw),
        }))
    }
}

/// Durable running total per user. At most one row per `user_id`; `points`
/// only ever accumulates, `last_seen` holds the most recently observed
/// value.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAggregate {
    pub user_id: String,
    pub username: Option<String>,
    pub last_seen: NaiveDateTime,
    pub points: i64,
}

/// One row of the append-only award ledger. Immutable once written; not
/// deduplicated across overlapping runs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointHistoryEntry {
    pub id: i64,
    pub user_id: String,
    pub points_awarded: i32,
    pub checked_at: NaiveDateTime,
}
