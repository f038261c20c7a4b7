//! Seam to the external presence source.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::SourceError;
use crate::models::GroupMember;

/// Lazily produced stream of group members. Items may individually fail
/// mid-stream; the orchestrator stops consuming on the first stream error.
pub type MemberStream<'a> = BoxStream<'a, Result<GroupMember, SourceError>>;

/// The external component that yields presence facts for a group.
///
/// Implementations own authentication, session handling, transport, and
/// whatever rate-limit bookkeeping their backend requires; the engine only
/// consumes the member stream. `connect` must return
/// [`SourceError::RateLimited`] carrying the demanded wait when the source
/// requires backoff — the engine reports it to the caller and never sleeps
/// itself.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    /// Establish the source and return the member stream.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] when the source cannot be
    /// reached or authenticated; the run is aborted and no observations
    /// are processed.
    async fn connect(&self) -> Result<MemberStream<'_>, SourceError>;
}
