use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use event_listener::{Event, IntoNotification};
use parking_lot::Mutex;
use tokio::{task::JoinHandle, time::timeout};

use super::{
    connection::PoolSession,
    idle::{Idle, IdleQueue},
    producer, reaper,
};
use crate::{
    session::{Connect, Session},
    Error, PoolConfig, Result,
};

/// Shared pool state.
///
/// The `(idle, live)` pair is guarded by one mutex, which is never held
/// across a session open or close, nor across any await point. The two wait
/// events replace a condition variable: `available` wakes consumers when a
/// session enters the queue, `wanted` wakes the producer when demand appears.
pub(crate) struct PoolInner {
    state: Mutex<PoolState>,
    /// Fired once per session pushed into `idle`.
    pub(super) available: Event,
    /// Fired when the producer should re-evaluate its work predicate.
    pub(super) wanted: Event,
    /// Fired once, when the pool closes.
    pub(super) on_closed: Event,
    is_closed: AtomicBool,
    /// Producer and reaper handles, taken and joined by `close`.
    tasks: Mutex<Vec<JoinHandle<()>>>,
    pub(super) connector: Arc<dyn Connect>,
    pub(super) config: PoolConfig,
}

struct PoolState {
    idle: IdleQueue,
    /// Sessions currently idle or checked out. Only mutated under the mutex.
    live: u32,
}

impl PoolInner {
    pub(super) fn new_arc(config: PoolConfig, connector: Arc<dyn Connect>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PoolState {
                idle: IdleQueue::with_capacity(config.max_size as usize),
                live: 0,
            }),
            available: Event::new(),
            wanted: Event::new(),
            on_closed: Event::new(),
            is_closed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            connector,
            config,
        })
    }

    /// Eagerly open `init_size` sessions.
    ///
    /// Individual failures are not fatal: they are logged and the producer
    /// compensates once demand appears.
    pub(super) async fn warm_up(&self) {
        for _ in 0..self.config.init_size {
            match self
                .connector
                .open(&self.config.endpoint, &self.config.credentials)
                .await
            {
                Ok(session) => {
                    let mut state = self.state.lock();
                    state.live += 1;
                    state.idle.push(session);
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to open a session during warm-up");
                }
            }
        }
    }

    pub(super) fn spawn_actors(self: &Arc<Self>) {
        let tasks = vec![
            tokio::spawn(producer::run(Arc::downgrade(self))),
            tokio::spawn(reaper::run(Arc::downgrade(self))),
        ];
        *self.tasks.lock() = tasks;
    }

    /// Current number of live sessions, idle or checked out.
    pub(super) fn size(&self) -> u32 {
        self.state.lock().live
    }

    pub(super) fn num_idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    pub(super) fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::Acquire)
    }

    fn mark_closed(&self) {
        if !self.is_closed.swap(true, Ordering::AcqRel) {
            self.on_closed.notify(usize::MAX);
            self.available.notify(usize::MAX);
            self.wanted.notify(usize::MAX);
        }
    }

    /// Acquire an idle session, waiting up to the configured deadline.
    pub(super) async fn acquire(self: &Arc<Self>) -> Result<PoolSession> {
        let deadline = Instant::now() + self.config.acquire_timeout;
        loop {
            if self.is_closed() {
                return Err(Error::ShuttingDown);
            }
            if let Some(idle) = self.pop_idle() {
                return Ok(self.attach(idle));
            }
            // Consumers observing emptiness are the producer's cue to grow
            // the pool.
            self.wanted.notify(1);
            let listener = self.available.listen();
            // A push can race the registration above; look again now that we
            // are guaranteed to be woken by the next one.
            if self.is_closed() {
                return Err(Error::ShuttingDown);
            }
            if let Some(idle) = self.pop_idle() {
                return Ok(self.attach(idle));
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(Error::AcquireTimeout);
            };
            if timeout(remaining, listener).await.is_err() {
                // The deadline can race a release; one last look before
                // giving up.
                return match self.pop_idle() {
                    Some(idle) => Ok(self.attach(idle)),
                    None => Err(Error::AcquireTimeout),
                };
            }
            tracing::debug!("woken while waiting for an idle session; retrying");
        }
    }

    /// Acquire without waiting.
    pub(super) fn try_acquire(self: &Arc<Self>) -> Option<PoolSession> {
        if self.is_closed() {
            return None;
        }
        let idle = self.pop_idle()?;
        Some(self.attach(idle))
    }

    fn pop_idle(&self) -> Option<Idle> {
        self.state.lock().idle.pop()
    }

    fn attach(self: &Arc<Self>, idle: Idle) -> PoolSession {
        // Taking a session may have drained the queue; let the producer
        // re-evaluate.
        self.wanted.notify(1);
        PoolSession::new(Arc::clone(self), idle.session)
    }

    /// Return a checked-out session to the queue. Sole release path, called
    /// from the handle's drop.
    pub(super) fn release(&self, session: Box<dyn Session>) {
        let mut state = self.state.lock();
        if self.is_closed() {
            // The shutdown drain may already have swept the queue; close the
            // session instead of stranding it there.
            state.live -= 1;
            drop(state);
            spawn_close(session);
            return;
        }
        state.idle.push(session);
        drop(state);
        self.available.notify(1.additional());
    }

    /// Permanently remove one checked-out session from the books.
    pub(super) fn discard(&self) {
        self.state.lock().live -= 1;
        // A slot opened up; the producer may have waiters to serve.
        self.wanted.notify(1);
    }

    /// Reserve a slot for one new session if the pool is drained and below
    /// capacity. The caller must follow up with `fulfill` or `forfeit`.
    pub(super) fn try_reserve(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        let mut state = self.state.lock();
        if state.idle.is_empty() && state.live < self.config.max_size {
            state.live += 1;
            true
        } else {
            false
        }
    }

    /// Install a freshly opened session into a reserved slot.
    ///
    /// Returns the session back if the pool closed while it was being
    /// opened; the slot is released and the caller closes it.
    pub(super) fn fulfill(&self, session: Box<dyn Session>) -> Option<Box<dyn Session>> {
        let mut state = self.state.lock();
        if self.is_closed() {
            state.live -= 1;
            return Some(session);
        }
        state.idle.push(session);
        drop(state);
        self.available.notify(1.additional());
        None
    }

    /// Release a reserved slot after a failed open.
    pub(super) fn forfeit(&self) {
        self.state.lock().live -= 1;
    }

    /// Pop every expired session the floor allows, front first.
    ///
    /// FIFO insertion plus monotonic timestamps keep the oldest session at
    /// the front, so a non-expired front ends the sweep.
    pub(super) fn take_expired(&self) -> Vec<Idle> {
        let mut state = self.state.lock();
        let mut expired = Vec::new();
        while state.live > self.config.init_size
            && state.idle.front_expired(self.config.max_idle_time)
        {
            let Some(idle) = state.idle.pop() else {
                break;
            };
            state.live -= 1;
            expired.push(idle);
        }
        expired
    }

    pub(super) fn drain_idle(&self) -> Vec<Idle> {
        let mut state = self.state.lock();
        let drained = state.idle.drain();
        state.live -= drained.len() as u32;
        drained
    }

    /// Close the pool: wake everything, drain the queue, join the actors.
    ///
    /// Checked-out sessions are unaffected; they are closed as their handles
    /// are dropped rather than being returned to the pool.
    pub(super) async fn close(self: &Arc<Self>) {
        self.mark_closed();
        for idle in self.drain_idle() {
            if let Err(error) = idle.session.close().await {
                tracing::warn!(%error, "error closing an idle session during shutdown");
            }
        }
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.mark_closed();
    }
}

/// Close a retired session without blocking the caller.
///
/// Drop handlers cannot await; if no runtime is current the session is
/// dropped in place and the driver's own drop behavior applies.
pub(super) fn spawn_close(session: Box<dyn Session>) {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move {
            if let Err(error) = session.close().await {
                tracing::warn!(%error, "error closing a retired session");
            }
        });
    }
}
