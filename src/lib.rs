//! # Presence-to-points aggregation engine
//!
//! Converts observed "last active" timestamps for members of a group into
//! a decaying engagement score, and durably records both a running
//! per-user total and an immutable per-award ledger.
//!
//! ## Data flow
//!
//! ```text
//! presence stream → normalize → score → atomic upsert (aggregate + ledger)
//!                    (naive UTC) (0..=24)      one transaction each
//! ```
//!
//! The decay function awards 24 points to users seen within the current
//! hour and loses one point per whole elapsed hour, bottoming out at zero
//! from 24 hours on. Scoring anchors to the start of the current UTC hour
//! so every observation in a run gets identical treatment.
//!
//! ## Consistency model
//!
//! Runs may overlap (manual re-run, back-to-back schedules). The only
//! safety mechanism is the store's atomic increment-on-conflict upsert:
//! the running total is adjusted server-side in the same statement that
//! decides insert-vs-update, so neither of two concurrent awards can be
//! lost. The ledger is intentionally append-only and not deduplicated —
//! overlapping runs produce multiple entries for the same user and hour,
//! which is accepted as an audit trail, not a bug.
//!
//! Each observation commits in its own transaction. An interrupted run
//! keeps everything already committed and leaves no partial state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use presence_points::{db, EngineConfig, PgAwardStore, RunOrchestrator};
//!
//! let config = EngineConfig::from_env()?;
//! config.validate()?;
//!
//! let pool = db::create_pool(&config).await?;
//! db::run_migrations(&pool).await?;
//!
//! // `source` is any PresenceSource implementation owned by the host
//! let source = MyTelegramSource::new(&config.group_id);
//! let orchestrator = RunOrchestrator::new(source, PgAwardStore::new(pool));
//!
//! match orchestrator.run().await {
//!     Ok(summary) => println!("committed {} awards", summary.committed),
//!     Err(err) => match err.retry_after() {
//!         Some(wait) => eprintln!("rate limited, retry in {wait:?}"),
//!         None => eprintln!("run aborted: {err}"),
//!     },
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod run;
pub mod scoring;
pub mod source;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, Result, SourceError};
pub use models::{
    GroupMember, MemberStatus, Observation, PointHistoryEntry, RawTimestamp, UserAggregate,
};
pub use run::{RunOrchestrator, RunState, RunSummary};
pub use source::{MemberStream, PresenceSource};
pub use store::{AwardStore, PgAwardStore};
