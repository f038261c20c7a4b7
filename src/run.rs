//! Run orchestration: drives the presence stream through normalize →
//! score → commit, isolating per-user failures so one bad record never
//! aborts the run.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{EngineError, Result, SourceError};
use crate::models::Observation;
use crate::scoring;
use crate::source::PresenceSource;
use crate::store::AwardStore;

/// Lifecycle of a single run.
///
/// `Aborted` is reached only when the presence source itself cannot be
/// established; every other run ends in `Done`, even if some observations
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Starting,
    Connected,
    Streaming,
    Disconnected,
    Done,
    Aborted,
}

/// Outcome report for one run over the full presence stream.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Members yielded by the stream
    pub observed: u64,
    /// Observations that reached the scoring function
    pub scored: u64,
    /// Observations whose award transaction committed
    pub committed: u64,
    /// Members with no presence status or no last-active instant
    pub skipped: u64,
    /// Malformed observations plus failed store writes
    pub failed: u64,

    pub state: RunState,

    /// Set when the stream failed mid-run. Already-committed awards stay
    /// committed; a rate limit recorded here still carries its wait.
    pub interruption: Option<SourceError>,
}

/// Drives one end-to-end execution over the presence stream.
///
/// Processing is strictly sequential: each observation is normalized,
/// scored, and committed before the next is pulled, and the stream is
/// never materialized in full. Cross-run safety lives entirely in the
/// store's atomic increment; the orchestrator holds no locks.
///
/// Zero-point awards are still committed: the aggregate row is created or
/// refreshed (`last_seen`, `username`) and the ledger records the zero.
pub struct RunOrchestrator<S, W> {
    source: S,
    store: W,
}

impl<S: PresenceSource, W: AwardStore> RunOrchestrator<S, W> {
    pub fn new(source: S, store: W) -> Self {
        Self { source, store }
    }

    /// Execute one run.
    ///
    /// # Errors
    ///
    /// Returns the source error when the presence source cannot be
    /// established; no observations are processed in that case. Use
    /// [`EngineError::retry_after`] to detect a rate-limit demand.
    /// Per-observation failures never surface here — they are logged,
    /// counted in the summary, and the run continues.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let checked_at = run_stamp(started_at);
        let mut state = RunState::Starting;
        debug!(?state, "run starting");

        let mut stream = match self.source.connect().await {
            Ok(stream) => stream,
            Err(err) => {
                state = RunState::Aborted;
                error!(?state, error = %err, "presence source could not be established");
                return Err(EngineError::Source(err));
            }
        };
        state = RunState::Connected;
        debug!(?state, "presence source established");

        let mut observed: u64 = 0;
        let mut scored: u64 = 0;
        let mut committed: u64 = 0;
        let mut skipped: u64 = 0;
        let mut failed: u64 = 0;
        let mut interruption = None;

        state = RunState::Streaming;
        debug!(?state, "consuming presence stream");

        while let Some(item) = stream.next().await {
            let member = match item {
                Ok(member) => member,
                Err(err) => {
                    warn!(error = %err, "presence stream interrupted, ending run early");
                    interruption = Some(err);
                    break;
                }
            };
            observed += 1;

            let observation = match Observation::from_member(&member) {
                Ok(Some(observation)) => observation,
                Ok(None) => {
                    debug!(user_id = %member.user_id, "no last-active instant, skipping");
                    skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(user_id = %member.user_id, error = %err, "malformed observation");
                    failed += 1;
                    continue;
                }
            };

            let award = scoring::score(observation.last_seen, started_at);
            scored += 1;

            match self
                .store
                .commit_award(&observation, award, checked_at)
                .await
            {
                Ok(()) => {
                    committed += 1;
                    debug!(user_id = %observation.user_id, award, "observation committed");
                }
                Err(err) => {
                    failed += 1;
                    warn!(
                        user_id = %observation.user_id,
                        error = %err,
                        "award commit failed, continuing with remaining users"
                    );
                }
            }
        }

        drop(stream);
        state = RunState::Disconnected;
        debug!(?state, "presence stream released");
        state = RunState::Done;

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            observed,
            scored,
            committed,
            skipped,
            failed,
            state,
            interruption,
        };
        info!(
            observed = summary.observed,
            scored = summary.scored,
            committed = summary.committed,
            skipped = summary.skipped,
            failed = summary.failed,
            "run finished"
        );

        Ok(summary)
    }
}

/// One stamp per run: the start instant truncated to whole seconds. Every
/// ledger row written by the run carries it.
fn run_stamp(started_at: DateTime<Utc>) -> NaiveDateTime {
    let naive = started_at.naive_utc();
    naive.with_nanosecond(0).unwrap_or(naive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_stamp_truncates_to_whole_seconds() {
        let started = Utc
            .with_ymd_and_hms(2024, 3, 15, 12, 30, 45)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let stamp = run_stamp(started);
        assert_eq!(stamp.and_utc().timestamp(), started.timestamp());
        assert_eq!(stamp.nanosecond(), 0);
    }
}
