use thiserror::Error;

/// Errors surfaced by [`EventRegistry::try_dispatch`](crate::EventRegistry::try_dispatch).
///
/// Empty callbacks and stale handles are not errors; they are silently ignored.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A subscriber panicked. Subscribers after it in the same dispatch were not invoked.
    #[error("subscriber in slot {slot} panicked: {message}")]
    SubscriberPanicked { slot: usize, message: String },
}

impl DispatchError {
    /// Returns a short stable label for use in logs
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::SubscriberPanicked { .. } => "subscriber_panicked",
        }
    }

    pub(crate) fn from_panic(slot: usize, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        DispatchError::SubscriberPanicked { slot, message }
    }
}
