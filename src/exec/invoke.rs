//! Turns one action invocation into an outcome, whatever happens inside it

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use super::context::ExecContext;
use crate::action::{ActionFuture, ActionResult, Fault};

/// Task handle that aborts the task when dropped.
///
/// Dropping a pattern future before it completes stops every invocation it
/// still has in flight. Blocking bodies already running on the blocking pool
/// cannot be interrupted and run to completion.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `start` on its own task and settle it into an `ActionResult`.
///
/// The producer is called inside the task, so a panic while building the
/// future is captured the same way as a panic while polling it. Returned
/// errors, panics, cancellation and an elapsed `action_timeout_ms` all become
/// error results.
pub(crate) async fn settle<O, F>(ctx: &ExecContext, name: &str, start: F) -> ActionResult<O>
where
    O: Send + 'static,
    F: FnOnce() -> ActionFuture<O> + Send + 'static,
{
    let mut task = AbortOnDrop(ctx.spawn(async move { start().await }));

    let joined = match ctx.config().action_timeout() {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                let fault = Fault::timeout(limit);
                warn!(action = name, fault = %fault, "action_failed");
                return ActionResult::from_fault(fault);
            }
        },
        None => task.await,
    };

    match joined {
        Ok(Ok(result)) => {
            debug!(action = name, code = result.code(), "action_completed");
            result
        }
        Ok(Err(error)) => {
            let fault = Fault::from_error(error);
            warn!(action = name, fault = %fault, "action_failed");
            ActionResult::from_fault(fault)
        }
        Err(join_error) => {
            let fault = Fault::from_join_error(join_error);
            warn!(action = name, fault = %fault, "action_failed");
            ActionResult::from_fault(fault)
        }
    }
}
