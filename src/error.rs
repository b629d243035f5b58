use std::fmt::Display;

/// Logs an error together with its `source()` chain and discards it.
pub trait ResultOkLogExt<T> {
    /// Returns the `Ok` value, or logs `"{context}: {error}"` and returns `None`.
    fn ok_log(self, context: impl Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, context: impl Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {}", error_chain(&err));
                None
            }
        }
    }
}

/// Renders an error and every distinct message of its sources, separated by `: `.
///
/// Sources whose message is already part of the outer message are skipped.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}
