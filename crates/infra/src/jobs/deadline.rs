//! Wall-clock ceiling for external calls.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {}s exceeded", .0.as_secs())]
pub struct DeadlineExceeded(pub Duration);

/// Races a unit of work against a fixed ceiling.
///
/// The work receives a [`CancellationToken`] that is cancelled as soon as
/// the race is decided either way, so anything it handed off (poll loops,
/// spawned helpers) winds down instead of outliving the call. The work's
/// own future is dropped when the ceiling wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    ceiling: Duration,
}

impl Deadline {
    pub fn new(ceiling: Duration) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub async fn run<F, Fut>(&self, work: F) -> Result<Fut::Output, DeadlineExceeded>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future,
    {
        let token = CancellationToken::new();
        let _cancel_on_exit = token.clone().drop_guard();

        tokio::time::timeout(self.ceiling, work(token))
            .await
            .map_err(|_| DeadlineExceeded(self.ceiling))
    }
}
