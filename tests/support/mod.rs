//! In-memory stand-in for a database driver, shared by the integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;

use tidepool::{
    Connect, Credentials, Endpoint, Error, PoolConfig, PoolSession, QueryResult, Result, Session,
};

/// Test connector: opens numbered in-memory sessions and records closures.
///
/// Clones share state, so a test can keep one handle for observation while
/// the pool owns another.
#[derive(Clone, Default)]
pub struct StubConnector {
    next_id: Arc<AtomicUsize>,
    fail_opens: Arc<AtomicBool>,
    open_delay: Duration,
    closed: Arc<Mutex<Vec<u64>>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent open take `delay` to complete.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Toggle whether subsequent opens fail.
    pub fn fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Total sessions opened so far.
    pub fn opened(&self) -> usize {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Ids of closed sessions, in the order their closes ran.
    pub fn closed_ids(&self) -> Vec<u64> {
        self.closed.lock().unwrap().clone()
    }
}

impl Connect for StubConnector {
    fn open(
        &self,
        _endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> BoxFuture<'_, Result<Box<dyn Session>>> {
        async move {
            if !self.open_delay.is_zero() {
                tokio::time::sleep(self.open_delay).await;
            }
            if self.fail_opens.load(Ordering::SeqCst) {
                return Err(Error::Open("stub connector refused to open".into()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
            Ok(Box::new(StubSession {
                id,
                closed: Arc::clone(&self.closed),
            }) as Box<dyn Session>)
        }
        .boxed()
    }
}

/// One stub session; identifies itself through `last_insert_id`.
pub struct StubSession {
    id: u64,
    closed: Arc<Mutex<Vec<u64>>>,
}

impl Session for StubSession {
    fn execute(&mut self, _statement: &str) -> BoxFuture<'_, Result<QueryResult>> {
        let id = self.id;
        async move { Ok(QueryResult::new(1, Some(id))) }.boxed()
    }

    fn ping(&mut self) -> BoxFuture<'_, Result<()>> {
        async { Ok(()) }.boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        async move {
            self.closed.lock().unwrap().push(self.id);
            Ok(())
        }
        .boxed()
    }
}

/// Which stub session does this handle wrap?
pub async fn session_id(session: &mut PoolSession) -> u64 {
    session
        .execute("SELECT 1")
        .await
        .expect("stub execute")
        .last_insert_id()
        .expect("stub sessions always report an id")
}

/// Default test configuration against a fictitious server.
pub fn config() -> PoolConfig {
    PoolConfig::new(
        Endpoint::new("127.0.0.1", 3306),
        Credentials::new("root", "secret", "pool_test"),
    )
}

/// Poll `predicate` every 10ms until it holds or `wait` elapses.
pub async fn eventually(mut predicate: impl FnMut() -> bool, wait: Duration) -> bool {
    let deadline = Instant::now() + wait;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
