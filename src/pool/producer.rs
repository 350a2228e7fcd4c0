use std::sync::{Arc, Weak};

use super::inner::PoolInner;

/// On-demand growth actor.
///
/// Sleeps until a consumer signals demand, then opens at most one session
/// per wakeup. Producing one at a time bounds the response to a connection
/// storm and avoids opening sessions the workload may no longer need; the
/// work predicate is re-evaluated on every pass, so sustained demand keeps
/// the actor busy without any signal bookkeeping.
///
/// Holds only a weak pool reference so an abandoned pool can be collected;
/// the actor exits when the pool is gone or closed.
pub(super) async fn run(pool: Weak<PoolInner>) {
    loop {
        let Some(inner) = pool.upgrade() else { return };
        if inner.is_closed() {
            return;
        }
        let wanted = inner.wanted.listen();
        let closed = inner.on_closed.listen();
        // The predicate check comes after the listener registrations above,
        // so a signal racing the check lands on a registered listener.
        let grew = inner.try_reserve() && grow(&inner).await;
        if grew {
            continue;
        }
        // Nothing to do, or the last open failed: wait for fresh demand
        // rather than spinning against a dead database.
        drop(inner);
        tokio::select! {
            _ = wanted => {}
            _ = closed => return,
        }
    }
}

/// Open one session into a reserved slot, outside the pool lock.
///
/// Returns `false` if the open failed or the pool closed meanwhile.
async fn grow(inner: &Arc<PoolInner>) -> bool {
    match inner
        .connector
        .open(&inner.config.endpoint, &inner.config.credentials)
        .await
    {
        Ok(session) => match inner.fulfill(session) {
            None => true,
            Some(session) => {
                // Pool closed while we were connecting.
                let _ = session.close().await;
                false
            }
        },
        Err(error) => {
            tracing::warn!(%error, "failed to open a new session; releasing the reserved slot");
            inner.forfeit();
            false
        }
    }
}
