use std::fmt::{self, Debug, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::inner::PoolInner;
use crate::{session::Session, QueryResult, Result};

/// A session checked out from a [`Pool`][crate::Pool].
///
/// Will be returned to the pool on-drop. The handle owns its session
/// exclusively; it is not clonable, so transferring ownership is the only
/// way to move it between tasks.
pub struct PoolSession {
    session: Option<Box<dyn Session>>,
    pool: Arc<PoolInner>,
}

const EXPECT_MSG: &str = "BUG: inner session already taken!";

impl PoolSession {
    pub(super) fn new(pool: Arc<PoolInner>, session: Box<dyn Session>) -> Self {
        Self {
            session: Some(session),
            pool,
        }
    }

    /// Execute a single statement on the borrowed session.
    pub async fn execute(&mut self, statement: &str) -> Result<QueryResult> {
        self.session
            .as_mut()
            .expect(EXPECT_MSG)
            .execute(statement)
            .await
    }

    /// Probe the borrowed session for liveness.
    pub async fn ping(&mut self) -> Result<()> {
        self.session.as_mut().expect(EXPECT_MSG).ping().await
    }

    /// Close this session instead of returning it to the pool.
    ///
    /// The pool's producer may open a replacement once demand appears.
    pub async fn close(mut self) -> Result<()> {
        let session = self.session.take().expect(EXPECT_MSG);
        self.pool.discard();
        session.close().await
    }
}

impl Debug for PoolSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolSession").finish()
    }
}

impl Deref for PoolSession {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        self.session.as_deref().expect(EXPECT_MSG)
    }
}

impl DerefMut for PoolSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_deref_mut().expect(EXPECT_MSG)
    }
}

/// Returns the session to the [`Pool`][crate::Pool] it was checked out from,
/// refreshing its idle timestamp.
impl Drop for PoolSession {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}
