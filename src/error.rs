use thiserror::Error;

/// Errors returned by progress bar construction and the drive operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The format string passed to [`ProgressBar::new`] was empty.
    ///
    /// [`ProgressBar::new`]: crate::ProgressBar::new
    #[error("format cannot be empty")]
    EmptyFormat,

    /// A drive operation was invoked on a bar configured for another mode.
    ///
    /// `operation` names the rejected call and `expected` the configuration it needs.
    #[error("`{operation}` requires {expected} bar")]
    ModeMismatch {
        operation: &'static str,
        expected: &'static str,
    },

    /// The [`BytesWriter`] was written to after it had been closed.
    ///
    /// [`BytesWriter`]: crate::BytesWriter
    #[error("channel closed")]
    WriterClosed,

    /// The [`BytesWriter`] was closed twice.
    ///
    /// [`BytesWriter`]: crate::BytesWriter
    #[error("the BytesWriter has been closed")]
    AlreadyClosed,
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
