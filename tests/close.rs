use std::time::Duration;

use tidepool::{Error, Pool};
use tokio::time::sleep;

mod support;
use support::{config, eventually, session_id, StubConnector};

#[tokio::test]
async fn close_while_waiting_does_not_panic() -> anyhow::Result<()> {
    let connector = StubConnector::new();
    let pool = Pool::open(
        config()
            .init_size(1)
            .max_size(1)
            .acquire_timeout(Duration::from_secs(5)),
        connector.clone(),
    )
    .await?;

    // Hold the only session so the subsequent acquire must wait
    let session = pool.acquire().await?;

    let pool_for_waiter = pool.clone();
    let waiter = tokio::spawn(async move { pool_for_waiter.acquire().await });

    // ensure the waiter is blocking on acquire
    sleep(Duration::from_millis(50)).await;

    pool.close().await;

    let res = waiter.await.expect("waiter task panicked");
    assert!(matches!(res, Err(Error::ShuttingDown)));

    drop(session);
    Ok(())
}

#[tokio::test]
async fn acquire_after_close_is_rejected() -> anyhow::Result<()> {
    let connector = StubConnector::new();
    let pool = Pool::open(config().init_size(2).max_size(2), connector.clone()).await?;

    pool.close().await;
    assert!(pool.is_closed());

    assert!(matches!(pool.acquire().await, Err(Error::ShuttingDown)));
    assert!(pool.try_acquire().is_none());

    // the idle queue was drained and its sessions closed
    assert_eq!(pool.size(), 0);
    assert_eq!(pool.num_idle(), 0);
    assert_eq!(connector.closed_ids().len(), 2);
    Ok(())
}

#[tokio::test]
async fn sessions_returned_after_close_are_closed_not_pooled() -> anyhow::Result<()> {
    let connector = StubConnector::new();
    let pool = Pool::open(config().init_size(1).max_size(1), connector.clone()).await?;

    let mut session = pool.acquire().await?;
    let id = session_id(&mut session).await;

    pool.close().await;
    drop(session);

    assert!(eventually(|| connector.closed_ids().contains(&id), Duration::from_secs(1)).await);
    assert_eq!(pool.size(), 0);
    assert_eq!(pool.num_idle(), 0);
    Ok(())
}

#[tokio::test]
async fn close_twice_is_harmless() -> anyhow::Result<()> {
    let connector = StubConnector::new();
    let pool = Pool::open(config().init_size(1).max_size(2), connector.clone()).await?;

    pool.close().await;
    pool.close().await;

    assert!(pool.is_closed());
    assert_eq!(pool.size(), 0);
    assert_eq!(connector.closed_ids().len(), 1);
    Ok(())
}

#[tokio::test]
async fn close_during_an_in_flight_open_discards_the_new_session() -> anyhow::Result<()> {
    let connector = StubConnector::new().with_open_delay(Duration::from_millis(200));
    let pool = Pool::open(
        config()
            .init_size(1)
            .max_size(2)
            .acquire_timeout(Duration::from_millis(500)),
        connector.clone(),
    )
    .await?;

    let held = pool.acquire().await?;

    // a second acquire makes the producer start opening a session
    let pool_for_waiter = pool.clone();
    let waiter = tokio::spawn(async move { pool_for_waiter.acquire().await });
    sleep(Duration::from_millis(50)).await;

    // close while that open is still in flight; close joins the producer,
    // which hands the late session straight to its close path
    pool.close().await;

    let res = waiter.await.expect("waiter task panicked");
    assert!(matches!(res, Err(Error::ShuttingDown)));
    assert!(eventually(|| connector.closed_ids().len() == 1, Duration::from_secs(1)).await);
    // only the checked-out session remains on the books
    assert_eq!(pool.size(), 1);

    drop(held);
    assert!(eventually(|| pool.size() == 0, Duration::from_secs(1)).await);
    assert_eq!(connector.closed_ids().len(), 2);
    Ok(())
}

#[test]
fn pool_session_drop_without_runtime_does_not_panic() {
    let res = std::panic::catch_unwind(|| {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        let (pool, session) = rt.block_on(async {
            let pool = Pool::open(config(), StubConnector::new())
                .await
                .expect("pool");
            let session = pool.acquire().await.expect("session");
            (pool, session)
        });

        drop(rt);
        drop(session);
        drop(pool);
    });

    assert!(res.is_ok());
}
