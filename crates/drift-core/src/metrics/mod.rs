//! Metrics facade.
//!
//! Events implement [`events::InternalEvent`] and record through the
//! `metrics` crate. No exporter is installed here; the embedding process
//! decides where metrics go.

pub mod events;

/// Macro for emitting metric events.
///
/// This macro calls the `InternalEvent::emit()` method on the given event,
/// which records the corresponding metric.
///
/// # Example
///
/// ```ignore
/// use drift_core::metrics::events::BytesRead;
///
/// emit!(BytesRead { bytes: 1024, target: "events".to_string() });
/// ```
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}

pub use emit;
