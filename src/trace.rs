//! Conditional tracing macros (zero-cost when feature disabled).
//!
//! With the `tracing` feature each pipeline stage opens an info-level span and
//! reports counts as events. Without it the macros expand to nothing and the
//! argument expressions are only evaluated to keep bindings used.

/// Open an info-level span around a pipeline stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emit a debug-level event with per-stage counters.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::debug!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Emit a warn-level event for a frame that was dropped.
///
/// The detector swallows per-frame failures so this is the only place the
/// reason surfaces.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)+) => {
        tracing::warn!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)+) => {
        let _ = format_args!($($arg)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Stand-in span guard when tracing is disabled.
///
/// Lets call sites write `let _guard = trace_span!(...).entered();` without
/// conditional compilation.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mimicking `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
