//! Presence normalization and the decay scoring function.
//!
//! Scoring is anchored to the start of the current UTC hour, not the
//! current instant, so every observation processed within the same hour
//! receives identical treatment regardless of micro-timing. Both functions
//! are pure; they are tested in isolation from storage.

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};

use crate::models::RawTimestamp;

/// Maximum award, given to users seen within the current hour.
pub const MAX_AWARD: i32 = 24;

/// Canonicalize a raw instant to naive UTC.
///
/// Offset-carrying instants are converted to UTC and stripped; naive ones
/// pass through unchanged (assumed UTC). Idempotent. Must run before
/// scoring — comparing mixed naive/aware instants silently yields a wrong
/// delta.
pub fn normalize(raw: &RawTimestamp) -> NaiveDateTime {
    match raw {
        RawTimestamp::Aware(dt) => dt.with_timezone(&Utc).naive_utc(),
        RawTimestamp::Naive(dt) => *dt,
    }
}

/// Truncate an instant down to the start of its hour.
pub fn hour_floor(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        - Duration::minutes(instant.minute() as i64)
        - Duration::seconds(instant.second() as i64)
        - Duration::nanoseconds(instant.nanosecond() as i64)
}

/// Decaying award for a normalized last-seen instant.
///
/// Seen within the last hour of the anchor (or in the future relative to
/// it) earns the full [`MAX_AWARD`]; one point is lost per whole elapsed
/// hour; from 24 hours on the award is zero. Always in `[0, 24]`.
pub fn score(last_seen: NaiveDateTime, now: DateTime<Utc>) -> i32 {
    let anchor = hour_floor(now.naive_utc());
    let elapsed = anchor - last_seen;

    if elapsed < Duration::hours(1) {
        MAX_AWARD
    } else if elapsed < Duration::hours(24) {
        (MAX_AWARD as i64 - elapsed.num_hours()).max(0) as i32
    } else {
        0
    }
}
