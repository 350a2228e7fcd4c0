use std::sync::{Arc, Weak};

use tokio::time::sleep;

use super::inner::PoolInner;

/// Idle-eviction actor.
///
/// Wakes every `max_idle_time`, evicts expired sessions from the front of
/// the queue down to the `init_size` floor, and closes them outside the
/// lock. On shutdown it drains whatever is left in the queue and exits.
pub(super) async fn run(pool: Weak<PoolInner>) {
    let period = {
        let Some(inner) = pool.upgrade() else { return };
        inner.config.max_idle_time
    };
    loop {
        {
            let Some(inner) = pool.upgrade() else { return };
            if inner.is_closed() {
                drain(&inner).await;
                return;
            }
            let closed = inner.on_closed.listen();
            drop(inner);
            tokio::select! {
                _ = sleep(period) => {}
                _ = closed => {}
            }
        }

        let Some(inner) = pool.upgrade() else { return };
        if inner.is_closed() {
            drain(&inner).await;
            return;
        }

        let expired = inner.take_expired();
        if expired.is_empty() {
            continue;
        }
        let evicted = expired.len();
        for idle in expired {
            if let Err(error) = idle.session.close().await {
                tracing::warn!(%error, "error closing an evicted session");
            }
        }
        tracing::debug!(evicted, "evicted over-idle sessions");
        // Capacity opened up; consumers waking to an empty queue rely on the
        // producer to refill it.
        inner.wanted.notify(1);
    }
}

async fn drain(inner: &Arc<PoolInner>) {
    for idle in inner.drain_idle() {
        if let Err(error) = idle.session.close().await {
            tracing::warn!(%error, "error closing an idle session during shutdown");
        }
    }
}
