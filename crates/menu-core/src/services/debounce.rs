//! Debounced side effect: rapid triggers coalesce into one run with the
//! last value.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::debug;

type Effect<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<T> {
    value: Option<T>,
    generation: u64,
}

struct Inner<T> {
    delay: Duration,
    effect: Effect<T>,
    pending: Mutex<Pending<T>>,
    /// Serializes effect runs so a later value is never overwritten by an
    /// earlier one.
    run_lock: tokio::sync::Mutex<()>,
}

pub struct Debouncer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, effect: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                delay,
                effect: Arc::new(move |value| effect(value).boxed()),
                pending: Mutex::new(Pending {
                    value: None,
                    generation: 0,
                }),
                run_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn trigger(&self, value: T) {
        let generation = {
            let mut pending = self.inner.pending.lock();
            pending.value = Some(value);
            pending.generation += 1;
            pending.generation
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, debounced effect stays pending until flush");
            return;
        };

        let inner = self.inner.clone();
        runtime.spawn(async move {
            tokio::time::sleep(inner.delay).await;
            let _run = inner.run_lock.lock().await;
            let value = {
                let mut pending = inner.pending.lock();
                if pending.generation != generation {
                    return;
                }
                pending.value.take()
            };
            if let Some(value) = value {
                (inner.effect)(value).await;
            }
        });
    }

    /// Run the pending effect now, if any.
    pub async fn flush(&self) {
        let _run = self.inner.run_lock.lock().await;
        let value = {
            let mut pending = self.inner.pending.lock();
            pending.generation += 1;
            pending.value.take()
        };
        if let Some(value) = value {
            (self.inner.effect)(value).await;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.lock().value.is_some()
    }
}
