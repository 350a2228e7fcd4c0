//! Types for working with errors produced by the pool.

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Convenience alias for the boxed driver errors carried by [`Error::Open`]
/// and [`Error::Execute`].
pub type BoxDynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents all the ways a method can fail within the pool.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration file was missing, unreadable, or invalid.
    ///
    /// This is fatal: a pool cannot be constructed from a bad configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The driver failed to open a new session.
    ///
    /// The pool never surfaces this from [`Pool::acquire`]; open failures
    /// during warm-up and in the producer are logged and compensated for at
    /// runtime. Driver `Connect` implementations use it to report failures.
    ///
    /// [`Pool::acquire`]: crate::Pool::acquire
    #[error("error opening a database session: {0}")]
    Open(#[source] BoxDynError),

    /// The driver reported a failure while executing a statement.
    #[error("error executing a statement: {0}")]
    Execute(#[source] BoxDynError),

    /// [`Pool::acquire`] timed out: no session became available within the
    /// configured acquire deadline.
    ///
    /// This is an ordinary recoverable error; the caller chooses whether to
    /// retry or fall back.
    ///
    /// [`Pool::acquire`]: crate::Pool::acquire
    #[error("timed out waiting for an idle session")]
    AcquireTimeout,

    /// [`Pool::close`] was called; the pool no longer hands out sessions.
    ///
    /// Callers must not retry against this pool.
    ///
    /// [`Pool::close`]: crate::Pool::close
    #[error("attempted to acquire a session from a pool that is shutting down")]
    ShuttingDown,
}
