//! Structured logging vocabulary.
//!
//! Every event carries `event` and `component` fields; the names live in [`events`]
//! and the helpers that format field values in [`fields`].

pub mod events;
pub mod fields;

/// Emits a `tracing` event at a level chosen at runtime from a
/// [`RouteLogLevel`](crate::RouteLogLevel). `Off` emits nothing.
macro_rules! event_at_level {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            $crate::settings::RouteLogLevel::Off => {}
            $crate::settings::RouteLogLevel::Error => ::tracing::error!($($arg)+),
            $crate::settings::RouteLogLevel::Warn => ::tracing::warn!($($arg)+),
            $crate::settings::RouteLogLevel::Info => ::tracing::info!($($arg)+),
            $crate::settings::RouteLogLevel::Debug => ::tracing::debug!($($arg)+),
            $crate::settings::RouteLogLevel::Trace => ::tracing::trace!($($arg)+),
        }
    };
}

pub(crate) use event_at_level;
