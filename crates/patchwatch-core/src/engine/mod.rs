//! Update reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Fetching remote state via each PlatformAdapter
//! - Diffing it against the HistoryStore
//! - Delivering notifications via the Notifier
//! - Committing history only after successful delivery
//!
//! ## Per-title state machine
//!
//! ```text
//! FETCH ──(no data)──────────────────────────▶ DONE (no-op)
//! FETCH ──(data, no prior history)───────────▶ RECORD FIRST SEEN (no notification)
//! FETCH ──(data, prior == current)───────────▶ DONE (no-op)
//! FETCH ──(data, prior != current)──▶ NOTIFY ──(delivered)──▶ COMMIT HISTORY
//!                                           └─(failed)─────▶ DONE (no commit,
//!                                                            retried next run)
//! ```
//!
//! The whole run is strictly sequential: platforms in canonical order, titles
//! in configured order, each fetch and notify awaited to completion before
//! the next title. The only ordering that matters is within a title: fetch,
//! diff, notify, then commit.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::TitlesConfig;
use crate::error::Result;
use crate::platform::Platform;
use crate::traits::{HistoryStore, Notifier, PlatformAdapter};

/// Capacity of the event channel handed out at construction.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// A run started
    RunStarted { titles: usize },

    /// A title produced no data this cycle (not found, soft failure)
    FetchSkipped { platform: Platform, title_id: String },

    /// A previously untracked title was recorded silently
    FirstSeen {
        platform: Platform,
        title_id: String,
        version: String,
    },

    /// A title's version matches history
    Unchanged {
        platform: Platform,
        title_id: String,
        version: String,
    },

    /// A version change was detected
    UpdateDetected {
        platform: Platform,
        title_id: String,
        previous: String,
        current: String,
    },

    /// Notification delivered and history committed
    Committed {
        platform: Platform,
        title_id: String,
        version: String,
    },

    /// Notification delivery failed; history left untouched
    NotifyFailed { platform: Platform, title_id: String },

    /// The run finished
    RunFinished { changed: bool },
}

/// Outcome of processing a single title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TitleOutcome {
    Skipped,
    FirstSeen,
    Unchanged,
    Updated,
    NotifyFailed,
}

/// Counters for one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Titles processed
    pub checked: usize,
    /// Updates detected, delivered, and committed
    pub updated: usize,
    /// Previously untracked titles recorded silently
    pub first_seen: usize,
    /// Titles whose version matched history
    pub unchanged: usize,
    /// Titles with no data this cycle
    pub skipped: usize,
    /// Titles that errored or whose notification failed
    pub failed: usize,
}

/// Core reconciliation engine
///
/// The reconciler owns the adapters, the history store, and the notifier,
/// threading state explicitly through each step rather than hanging it off
/// shared mutable context.
///
/// ## Invariants
///
/// - History is committed to a new version only after the notifier reports
///   successful delivery
/// - First-seen titles get a silent history write and never a notification
/// - A per-title failure never aborts the rest of the run; only a final
///   history save failure is propagated (and is fatal to the process)
pub struct Reconciler {
    /// Platform adapters, in processing order
    adapters: Vec<Box<dyn PlatformAdapter>>,

    /// Configured titles per platform
    titles: TitlesConfig,

    /// Persisted last-seen-version snapshot
    history: Box<dyn HistoryStore>,

    /// Notification sink
    notifier: Box<dyn Notifier>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcilerEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// per-title reconciliation events.
    pub fn new(
        adapters: Vec<Box<dyn PlatformAdapter>>,
        titles: TitlesConfig,
        history: Box<dyn HistoryStore>,
        notifier: Box<dyn Notifier>,
    ) -> (Self, mpsc::Receiver<ReconcilerEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reconciler = Self {
            adapters,
            titles,
            history,
            notifier,
            event_tx: tx,
        };

        (reconciler, rx)
    }

    /// Run one reconciliation cycle over every configured title.
    ///
    /// `suppress_save` carries the debug flag through to the final guarded
    /// history save.
    ///
    /// # Errors
    ///
    /// Only a history save failure is returned; everything else is logged
    /// and counted in the [`RunSummary`].
    pub async fn run(&self, suppress_save: bool) -> Result<RunSummary> {
        let total: usize = self
            .adapters
            .iter()
            .map(|a| self.titles.for_platform(a.platform()).len())
            .sum();

        self.emit(ReconcilerEvent::RunStarted { titles: total });
        info!("processing {} configured titles", total);

        let mut summary = RunSummary::default();

        for adapter in &self.adapters {
            let platform = adapter.platform();

            for title in self.titles.for_platform(platform) {
                summary.checked += 1;

                match self.process_title(adapter.as_ref(), &title).await {
                    Ok(TitleOutcome::Skipped) => summary.skipped += 1,
                    Ok(TitleOutcome::FirstSeen) => summary.first_seen += 1,
                    Ok(TitleOutcome::Unchanged) => summary.unchanged += 1,
                    Ok(TitleOutcome::Updated) => summary.updated += 1,
                    Ok(TitleOutcome::NotifyFailed) => summary.failed += 1,
                    Err(e) => {
                        error!("{} title {} failed: {}", platform, title.id, e);
                        summary.failed += 1;
                    }
                }
            }
        }

        let changed = self.history.is_dirty().await;
        self.emit(ReconcilerEvent::RunFinished { changed });

        if changed {
            // The one error worth propagating: losing the snapshot here
            // would replay or swallow notifications on every future run.
            self.history.save(suppress_save).await?;
        } else {
            debug!("no titles changed this run, skipping history save");
        }

        info!(
            "finished processing titles ({} updated, {} first seen, {} unchanged, {} skipped, {} failed)",
            summary.updated, summary.first_seen, summary.unchanged, summary.skipped, summary.failed
        );

        Ok(summary)
    }

    /// Drive the state machine for a single title.
    async fn process_title(
        &self,
        adapter: &dyn PlatformAdapter,
        title: &crate::platform::TrackedTitle,
    ) -> Result<TitleOutcome> {
        let platform = adapter.platform();

        let Some(state) = adapter.fetch(title).await? else {
            debug!("{} title {} returned no data this cycle", platform, title.id);
            self.emit(ReconcilerEvent::FetchSkipped {
                platform,
                title_id: title.id.clone(),
            });
            return Ok(TitleOutcome::Skipped);
        };

        let previous = self.history.get(platform, &state.title_id).await?;

        let previous = match previous {
            None => {
                self.history
                    .set(platform, &state.title_id, &state.current_version)
                    .await?;

                info!(
                    "{} title {} previously untracked, saved version {} to title history",
                    platform, state.name, state.current_version
                );
                self.emit(ReconcilerEvent::FirstSeen {
                    platform,
                    title_id: state.title_id.clone(),
                    version: state.current_version.clone(),
                });
                return Ok(TitleOutcome::FirstSeen);
            }
            Some(previous) if previous == state.current_version => {
                info!(
                    "{} title {} not updated ({})",
                    platform, state.name, state.current_version
                );
                self.emit(ReconcilerEvent::Unchanged {
                    platform,
                    title_id: state.title_id.clone(),
                    version: state.current_version.clone(),
                });
                return Ok(TitleOutcome::Unchanged);
            }
            Some(previous) => previous,
        };

        info!(
            "{} title {} updated, {} -> {}",
            platform, state.name, previous, state.current_version
        );
        self.emit(ReconcilerEvent::UpdateDetected {
            platform,
            title_id: state.title_id.clone(),
            previous: previous.clone(),
            current: state.current_version.clone(),
        });

        let event = adapter.build_event(&previous, &state).await;

        if self.notifier.notify(&event).await {
            debug!(
                "{} notification for {} delivered via {}",
                platform,
                state.name,
                self.notifier.notifier_name()
            );

            // Commit strictly after confirmed delivery.
            self.history
                .set(platform, &state.title_id, &state.current_version)
                .await?;

            self.emit(ReconcilerEvent::Committed {
                platform,
                title_id: state.title_id.clone(),
                version: state.current_version.clone(),
            });
            Ok(TitleOutcome::Updated)
        } else {
            warn!(
                "{} notification for {} via {} failed, history not committed; will re-attempt next run",
                platform,
                state.name,
                self.notifier.notifier_name()
            );
            self.emit(ReconcilerEvent::NotifyFailed {
                platform,
                title_id: state.title_id.clone(),
            });
            Ok(TitleOutcome::NotifyFailed)
        }
    }

    /// Emit a reconciler event, dropping it with a warning when the channel
    /// is full.
    fn emit(&self, event: ReconcilerEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping reconciler event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_default_is_zeroed() {
        let summary = RunSummary::default();
        assert_eq!(summary.checked, 0);
        assert_eq!(summary.updated, 0);
    }

    #[test]
    fn events_are_comparable() {
        let event = ReconcilerEvent::RunStarted { titles: 3 };
        assert_eq!(event.clone(), event);
    }
}
