// # Notifier Trait
//
// Defines the interface for delivering a formatted update notification.
//
// ## Contract
//
// `notify` returns a plain bool: `true` means the notification was delivered
// and the reconciler may commit the new version to history; `false` means it
// was not, the commit is skipped, and the same update is re-attempted on the
// next scheduled run. Delivery failures are logged *inside* the notifier and
// never propagate past this boundary.

use async_trait::async_trait;

use crate::platform::UpdateEvent;

/// Trait for notification sink implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an update notification.
    ///
    /// # Returns
    ///
    /// `true` if the notification was delivered, `false` otherwise.
    async fn notify(&self, event: &UpdateEvent) -> bool;

    /// Get the notifier name (for logging/debugging).
    fn notifier_name(&self) -> &'static str;
}
