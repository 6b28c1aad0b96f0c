// # Platform Adapter Trait
//
// Defines the interface for querying a remote platform's version API and
// normalizing the response into the common title shape.
//
// ## Implementations
//
// - Battle.net, Prospero, Orbis, Steam: `patchwatch-platforms` crate
//
// ## Normal outcomes vs. errors
//
// Titles come and go upstream. "Not found", a `success: false` flag, a
// malformed payload, or a transient network failure are all *normal*
// outcomes for a single title and surface as `Ok(None)`, never as `Err`.
// `Err` is reserved for conditions worth logging at error severity; the
// reconciler still continues with the remaining titles either way.

use async_trait::async_trait;

use crate::platform::{Platform, TitleState, TrackedTitle, UpdateEvent};

/// Trait for platform adapter implementations
///
/// One adapter exists per tracked platform. Adapters are isolated and
/// stateless: they perform remote lookups and normalization only. Diffing
/// against history, retry policy, and the commit decision are owned by the
/// [`Reconciler`](crate::engine::Reconciler); adapters must not touch the
/// history store or decide whether an update is notification-worthy.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Fetch the current remote state for a configured title.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(TitleState))`: upstream knows the title
    /// - `Ok(None)`: title not found, payload malformed, or a soft remote
    ///   failure, counted as "no update this cycle"
    /// - `Err(Error)`: a failure worth surfacing for this title
    async fn fetch(&self, title: &TrackedTitle) -> crate::Result<Option<TitleState>>;

    /// Build the notification event for a detected change.
    ///
    /// Called only when `previous` differs from the fetched version. Adapters
    /// with secondary lookups (artwork, build names) perform them here so the
    /// extra calls only happen for genuine updates; such lookups are
    /// best-effort and must never fail the event.
    async fn build_event(&self, previous: &str, state: &TitleState) -> UpdateEvent {
        UpdateEvent::from_state(previous, state)
    }
}
