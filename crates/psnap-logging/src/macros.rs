//! ---
//! psnap_section: "03-logging"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Structured logging context and macros."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
/// Shared expansion for the level-specific macros. Not part of the public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __psnap_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            device = ctx.device.unwrap_or(""),
            port = ctx.port.map(i64::from).unwrap_or(-1),
            parameter = ctx.parameter.map(i64::from).unwrap_or(-1),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with device/port/parameter context.
#[macro_export]
macro_rules! psnap_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with device/port/parameter context.
#[macro_export]
macro_rules! psnap_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with device/port/parameter context.
#[macro_export]
macro_rules! psnap_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with device/port/parameter context.
#[macro_export]
macro_rules! psnap_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__psnap_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
