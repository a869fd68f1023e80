use crate::prelude::*;

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

type Pending<T> = Shared<BoxFuture<'static, std::result::Result<T, SunSpecError>>>;

enum CacheState<T> {
    Empty,
    Pending(Pending<T>),
    Ready(T),
}

/// A write-once value whose initialisation runs at most once at a time.
///
/// Concurrent callers arriving while the initialiser runs await the same
/// result. A failed initialisation returns the cache to empty so the next
/// caller starts over.
pub struct SingleFlight<T> {
    state: Mutex<CacheState<T>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(CacheState::Empty),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState<T>>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("single-flight cache lock poisoned"))
    }

    /// The cached value, if initialisation has completed.
    pub fn get(&self) -> Option<T> {
        match &*self.lock().ok()? {
            CacheState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.lock().as_deref(), Ok(CacheState::Pending(_)))
    }

    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock()?;
            match &*state {
                CacheState::Ready(value) => return Ok(value.clone()),
                CacheState::Pending(pending) => pending.clone(),
                CacheState::Empty => {
                    let pending = init()
                        .map(|result| result.map_err(SunSpecError::from_anyhow))
                        .boxed()
                        .shared();
                    *state = CacheState::Pending(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut state = self.lock()?;
        let current = matches!(&*state, CacheState::Pending(p) if p.ptr_eq(&pending));
        match result {
            Ok(value) => {
                if current {
                    *state = CacheState::Ready(value.clone());
                }
                Ok(value)
            }
            Err(e) => {
                if current {
                    *state = CacheState::Empty;
                }
                Err(e.into())
            }
        }
    }
}
