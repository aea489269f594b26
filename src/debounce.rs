//! Debounce with cancel-on-supersede.
//!
//! Every call to [`Debouncer::call`] cancels the token handed to the previous
//! invocation. That stops it whether it is still waiting out the delay or
//! already running the operation, as long as the operation watches its token.

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Operation<A, O> = Arc<dyn Fn(A, CancellationToken) -> BoxFuture<'static, O> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<O> {
    /// The delay elapsed and the operation ran to completion.
    Completed(O),
    /// Superseded before the delay elapsed; the operation never started.
    Cancelled,
}

pub struct Debouncer<A, O> {
    delay: Duration,
    op: Operation<A, O>,
    current: Mutex<Option<CancellationToken>>,
}

impl<A, O> Debouncer<A, O>
where
    A: Send + 'static,
    O: Send + 'static,
{
    pub fn new<F, Fut>(delay: Duration, op: F) -> Debouncer<A, O>
    where
        F: Fn(A, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        Debouncer {
            delay,
            op: Arc::new(move |arg: A, token: CancellationToken| -> BoxFuture<'static, O> {
                op(arg, token).boxed()
            }),
            current: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `op(arg)` after the quiescence delay. Must be called from
    /// within a tokio runtime.
    pub fn call(&self, arg: A) -> JoinHandle<Debounced<O>> {
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }

        let op = self.op.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Debounced::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
            Debounced::Completed(op(arg, token).await)
        })
    }

    /// Cancels the outstanding invocation, if any, without scheduling a new one.
    pub fn cancel(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }
}

impl<A, O> Drop for Debouncer<A, O> {
    fn drop(&mut self) {
        if let Some(token) = self.current.get_mut().take() {
            token.cancel();
        }
    }
}
