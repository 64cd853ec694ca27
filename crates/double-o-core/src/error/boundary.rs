/// Macro to define error boundaries with automatic `From` implementation.
///
/// Converting a third-party error into a crate error at the point where it
/// crosses into the crate keeps call sites free of `map_err()` chains and lets
/// the `?` operator do the work.
///
/// # Syntax
///
/// ```ignore
/// error_boundary!(SourceError => TargetError, |err_var| {
///     // conversion logic returning TargetError
/// });
/// ```
///
/// # Example
///
/// ```
/// use double_o_core::error_boundary;
/// use std::io;
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("connection failed: {0}")]
///     Connection(String),
///     #[error("request timed out")]
///     Timeout,
/// }
///
/// error_boundary!(io::Error => FetchError, |e| {
///     if e.kind() == io::ErrorKind::TimedOut {
///         FetchError::Timeout
///     } else {
///         FetchError::Connection(e.to_string())
///     }
/// });
///
/// fn read_token() -> Result<String, FetchError> {
///     let token = std::fs::read_to_string("/run/secrets/token")?;
///     Ok(token)
/// }
/// ```
///
/// # Multiple Boundaries
///
/// Several source types may convert into the same target:
///
/// ```
/// use double_o_core::error_boundary;
/// use std::io;
///
/// #[derive(Debug, thiserror::Error)]
/// enum LoadError {
///     #[error("io: {0}")]
///     Io(String),
///     #[error("parse: {0}")]
///     Parse(String),
/// }
///
/// error_boundary!(io::Error => LoadError, |e| LoadError::Io(e.to_string()));
/// error_boundary!(std::num::ParseIntError => LoadError, |e| LoadError::Parse(e.to_string()));
///
/// fn load_retries(path: &str) -> Result<u32, LoadError> {
///     let raw = std::fs::read_to_string(path)?;
///     Ok(raw.trim().parse::<u32>()?)
/// }
/// ```
#[macro_export]
macro_rules! error_boundary {
    ($inner:ty => $outer:ty, |$err:ident| $body:expr) => {
        impl ::std::convert::From<$inner> for $outer {
            fn from($err: $inner) -> $outer {
                $body
            }
        }
    };
}
