//! Provides the connection pool for asynchronous database sessions.
//!
//! Opening a database session for each and every statement quickly becomes
//! expensive: every open pays for a TCP handshake, authentication, and
//! server-side session setup. A connection pool amortizes that cost by
//! keeping a bounded set of live sessions and handing them out for repeated
//! use.
//!
//! Three concurrent actors coordinate over one shared queue: consumers pop
//! idle sessions in [`Pool::acquire`] with a bounded wait, a background
//! producer grows the pool on demand up to `max_size`, and a background
//! reaper evicts sessions idle beyond `max_idle_time`, never shrinking the
//! pool below `init_size`.

mod connection;
mod idle;
mod inner;
mod producer;
mod reaper;

pub use self::connection::PoolSession;

use std::{fmt, sync::Arc};

use tokio::sync::OnceCell;

use self::inner::PoolInner;
use crate::{session::Connect, PoolConfig, QueryResult, Result};

/// Environment variable naming the configuration file read by
/// [`Pool::instance`]; defaults to `pool.conf` in the working directory.
const CONFIG_ENV: &str = "TIDEPOOL_CONFIG";
const CONFIG_DEFAULT: &str = "pool.conf";

static INSTANCE: OnceCell<Pool> = OnceCell::const_new();

/// An asynchronous pool of database sessions.
///
/// Create a pool with [`Pool::open`] (or use the process-wide
/// [`Pool::instance`]) and call [`Pool::acquire`] to borrow a session; when
/// the returned [`PoolSession`] is dropped the session goes back to the pool
/// for reuse.
///
/// Sessions are handed out oldest-idle first, and the pool has a hard
/// session limit: if `acquire` is called while every session is checked out
/// and the pool is at `max_size`, the caller waits until a session becomes
/// available or the acquire deadline passes.
///
/// `Pool` is `Send`, `Sync` and `Clone`. It is intended to be created once
/// at the start of your program and shared with all tasks for the process'
/// lifetime. Cloning is cheap; all clones refer to the same pool state.
///
/// We recommend calling [`close`][Pool::close] during shutdown: it wakes any
/// waiting `acquire` calls, closes idle sessions so the server can reclaim
/// them promptly, and joins the two background actors.
pub struct Pool(pub(crate) Arc<PoolInner>);

impl Pool {
    /// Construct a pool: validate the configuration, eagerly open
    /// `init_size` sessions, and start the producer and reaper.
    ///
    /// Fails only on an invalid configuration. Open failures during warm-up
    /// are logged and made up for by the producer once demand appears.
    pub async fn open<C: Connect>(config: PoolConfig, connector: C) -> Result<Pool> {
        config.validate()?;
        let inner = PoolInner::new_arc(config, Arc::new(connector));
        inner.warm_up().await;
        inner.spawn_actors();
        Ok(Pool(inner))
    }

    /// The process-wide pool, constructed on first call.
    ///
    /// The first call loads the configuration file named by the
    /// `TIDEPOOL_CONFIG` environment variable (default `pool.conf`) and
    /// builds the pool with `connector`; concurrent first calls are
    /// serialized and exactly one initialization occurs. Later calls return
    /// the existing pool and ignore `connector`.
    ///
    /// Fails only if the configuration cannot be loaded.
    pub async fn instance<C: Connect>(connector: C) -> Result<&'static Pool> {
        INSTANCE
            .get_or_try_init(|| async {
                let path =
                    std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_DEFAULT.to_owned());
                let config = PoolConfig::from_file(&path)?;
                Pool::open(config, connector).await
            })
            .await
    }

    /// Retrieve a session from the pool.
    ///
    /// The total time this method is allowed to wait is capped by
    /// [`PoolConfig::acquire_timeout`]; when that elapses it returns
    /// [`Error::AcquireTimeout`](crate::Error::AcquireTimeout). Once the
    /// pool is closed it returns
    /// [`Error::ShuttingDown`](crate::Error::ShuttingDown) instead.
    pub async fn acquire(&self) -> Result<PoolSession> {
        self.0.acquire().await
    }

    /// Attempt to retrieve a session if one is idle right now.
    ///
    /// Returns `None` immediately when the queue is empty or the pool is
    /// closed; never waits.
    pub fn try_acquire(&self) -> Option<PoolSession> {
        self.0.try_acquire()
    }

    /// Borrow a session just long enough to execute one statement.
    pub async fn execute(&self, statement: &str) -> Result<QueryResult> {
        self.acquire().await?.execute(statement).await
    }

    /// Shut down the pool, immediately waking all waiting `acquire` calls.
    ///
    /// Any currently waiting or subsequent call to [`Pool::acquire`] returns
    /// [`Error::ShuttingDown`](crate::Error::ShuttingDown) and no new
    /// sessions are opened. Idle sessions are closed and the producer and
    /// reaper are joined before this returns. Checked-out sessions are
    /// unaffected; they are closed on-drop rather than returned.
    ///
    /// `close()` may be called from multiple handles; every call observes
    /// the same shutdown.
    pub async fn close(&self) {
        self.0.close().await
    }

    /// Returns `true` if [`close`][Pool::close] has been called on the pool.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// The number of live sessions, idle and checked out together.
    pub fn size(&self) -> u32 {
        self.0.size()
    }

    /// The number of sessions currently idle in the queue.
    pub fn num_idle(&self) -> usize {
        self.0.num_idle()
    }
}

/// Returns a new `Pool` handle tied to the same shared pool state.
impl Clone for Pool {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("size", &self.0.size())
            .field("num_idle", &self.0.num_idle())
            .field("is_closed", &self.0.is_closed())
            .field("config", &self.0.config)
            .finish()
    }
}

#[test]
#[allow(dead_code)]
fn assert_pool_traits() {
    fn assert_send<T: Send>() {}
    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_clone<T: Clone>() {}

    fn assert_pool() {
        assert_send_sync::<Pool>();
        assert_clone::<Pool>();
        assert_send::<PoolSession>();
    }
}
