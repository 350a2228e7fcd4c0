use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::session::Session;

/// An idle session together with the time it last entered the queue.
pub(super) struct Idle {
    pub(super) session: Box<dyn Session>,
    pub(super) since: Instant,
}

/// FIFO of idle sessions, oldest at the front.
///
/// Pushes stamp the current time, so queue order matches `since` order and
/// the reaper only ever needs to look at the front. Not independently
/// thread-safe; the pool's mutex synchronizes access.
pub(super) struct IdleQueue {
    slots: VecDeque<Idle>,
}

impl IdleQueue {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(super) fn push(&mut self, session: Box<dyn Session>) {
        self.slots.push_back(Idle {
            session,
            since: Instant::now(),
        });
    }

    pub(super) fn pop(&mut self) -> Option<Idle> {
        self.slots.pop_front()
    }

    /// `true` if the oldest idle session has been idle at least `max_idle_time`.
    pub(super) fn front_expired(&self, max_idle_time: Duration) -> bool {
        self.slots
            .front()
            .is_some_and(|idle| idle.since.elapsed() >= max_idle_time)
    }

    pub(super) fn drain(&mut self) -> Vec<Idle> {
        self.slots.drain(..).collect()
    }
}
