//! # Event subscriber trait.
//!
//! Each [`Subscribe`] implementation gets its own bounded queue and worker task
//! inside a [`SubscriberSet`](super::SubscriberSet):
//! - a slow subscriber only fills its own queue;
//! - on overflow the event is dropped for that subscriber and
//!   `EventKind::SubscriberOverflow` is published;
//! - panics are caught and published as `EventKind::SubscriberPanicked`.

use async_trait::async_trait;

use crate::events::Event;

/// Observer of driver runtime events.
///
/// Events arrive in publication order. Implementations should not block the
/// executor and should handle their own errors.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Runs on the subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
