/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field automatically so callers never need
/// to remember the string literal. Domains in use: `sys` (lifecycle), `route`
/// (router tick), `disp` (dispatcher + transfer workers), `conf`
/// (configuration).
///
/// # Usage
///
/// ```ignore
/// df_info!(sys, "pipeline started");
/// df_warn!(conf, error = %e, "unable to read configuration");
/// df_debug!(disp, folder = %path.display(), "transfer queued");
/// ```
///
/// The domain identifier is a bare identifier, not a string — the macro
/// stringifies it.

/// Internal helper. Do not call directly; use `df_error!` … `df_trace!`.
#[doc(hidden)]
macro_rules! df_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

/// Log at ERROR level with an automatic `domain` field.
macro_rules! df_error {
    ($domain:ident, $($rest:tt)*) => {
        df_log!(error, $domain, $($rest)*)
    };
}

/// Log at WARN level with an automatic `domain` field.
macro_rules! df_warn {
    ($domain:ident, $($rest:tt)*) => {
        df_log!(warn, $domain, $($rest)*)
    };
}

/// Log at INFO level with an automatic `domain` field.
macro_rules! df_info {
    ($domain:ident, $($rest:tt)*) => {
        df_log!(info, $domain, $($rest)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
macro_rules! df_debug {
    ($domain:ident, $($rest:tt)*) => {
        df_log!(debug, $domain, $($rest)*)
    };
}

/// Log at TRACE level with an automatic `domain` field.
#[allow(unused_macros)]
macro_rules! df_trace {
    ($domain:ident, $($rest:tt)*) => {
        df_log!(trace, $domain, $($rest)*)
    };
}
