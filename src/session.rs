use futures_core::future::BoxFuture;

use crate::{Credentials, Endpoint, Result};

/// Summary of a statement's effect, as reported by the server.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryResult {
    rows_affected: u64,
    last_insert_id: Option<u64>,
}

impl QueryResult {
    /// Construct a result; called by driver `Session` implementations.
    pub fn new(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Identifier generated for an `AUTO_INCREMENT` column by the last
    /// `INSERT`, if the server reported one.
    pub fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }
}

/// A live, authenticated session with the database backend.
///
/// Implemented by the driver. The pool treats a session as an opaque
/// capability: it is opened by a [`Connect`] implementation, handed to
/// exactly one caller at a time, and closed when the pool retires it.
///
/// There is no per-operation timeout here; sessions own that concern.
pub trait Session: Send + 'static {
    /// Execute a single statement and return its outcome.
    fn execute(&mut self, statement: &str) -> BoxFuture<'_, Result<QueryResult>>;

    /// Cheap liveness probe (`COM_PING` or equivalent).
    fn ping(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Gracefully terminate the session.
    ///
    /// The pool invokes this on every session it retires: reaped sessions,
    /// sessions drained at shutdown, and sessions returned after the pool
    /// has closed. Errors are logged by the pool, never surfaced.
    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

/// Opens new [`Session`]s on behalf of the pool.
///
/// Opening is expected to be slow (TCP handshake, authentication, session
/// setup); the pool never holds its internal lock across a call to `open`.
pub trait Connect: Send + Sync + 'static {
    /// Open a new authenticated session against `endpoint`.
    ///
    /// Failures are reported as [`Error::Open`](crate::Error::Open).
    fn open(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> BoxFuture<'_, Result<Box<dyn Session>>>;
}
