//! Bounded concurrent batch fetching.
//!
//! [`fetch_all`] resolves a list of ids through a single-item fetcher with at
//! most `concurrency` fetches in flight. The first failure cancels the rest of
//! the batch, and every spawned task is joined before the call returns, on the
//! success path and on the error path alike.

use std::future::Future;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a batch produced no items.
#[derive(Debug, thiserror::Error)]
pub enum BatchError<E> {
    /// A fetch returned an error. Carries the fetcher's error unchanged.
    #[error("fetch failed: {0}")]
    Fetch(#[source] E),

    /// A fetch task panicked.
    #[error("fetch task panicked: {0}")]
    Panicked(#[source] JoinError),

    /// The caller's token was cancelled before every item was fetched.
    ///
    /// Also covers fetches that returned an error only because they observed
    /// the cancellation.
    #[error("batch cancelled before completion")]
    Cancelled,
}

impl<E> BatchError<E> {
    /// Returns the fetcher's error if that is what failed the batch.
    pub fn fetch_error(&self) -> Option<&E> {
        match self {
            BatchError::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

/// What a single fetch unit reports back to the collecting loop.
enum Unit<T, E> {
    Fetched(T),
    Failed(E),
    /// Cancellation fired before the fetch finished, or the fetch failed after
    /// observing it.
    Abandoned,
}

/// Owns the result buffer. Only the loop in [`fetch_all`] touches it.
struct Collector<T, E> {
    slots: Vec<Option<T>>,
    failure: Option<BatchError<E>>,
    token: CancellationToken,
}

impl<T, E> Collector<T, E> {
    fn new(total: usize, token: CancellationToken) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(total).collect(),
            failure: None,
            token,
        }
    }

    fn record(&mut self, joined: Result<(usize, Unit<T, E>), JoinError>) {
        let failure = match joined {
            Ok((index, Unit::Fetched(item))) => {
                // Items arriving after a failure are discarded.
                if self.failure.is_none() {
                    self.slots[index] = Some(item);
                }
                return;
            }
            Ok((_, Unit::Abandoned)) => return,
            Ok((_, Unit::Failed(err))) => BatchError::Fetch(err),
            Err(err) => BatchError::Panicked(err),
        };

        // First failure wins; later ones are dropped.
        if self.failure.is_none() {
            warn!(
                total = self.slots.len(),
                panicked = matches!(failure, BatchError::Panicked(_)),
                "batch fetch failed, cancelling remaining fetches"
            );
            self.failure = Some(failure);
            self.token.cancel();
        }
    }

    fn finish(self) -> Result<Vec<T>, BatchError<E>> {
        if let Some(err) = self.failure {
            return Err(err);
        }

        // A missing slot means the caller cancelled before it was fetched.
        self.slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or(BatchError::Cancelled)
    }
}

/// Fetch every id with at most `concurrency` fetches running at once.
///
/// `concurrency` of 0 is treated as 1. Slots are handed out in input order,
/// so a limit of 1 runs the fetches strictly one after another. `fetch` is
/// only called once an id has been admitted, and a slot is handed back only
/// after the previous holder's outcome has been recorded.
///
/// Each fetch receives a child of `cancel`. The child is cancelled as soon as
/// any fetch fails; fetches in flight are dropped and ids not yet admitted are
/// never passed to `fetch`. Every spawned task is joined before this returns.
///
/// On success the items come back in input order, one per id (duplicate ids
/// are fetched independently). On failure no items are returned. When several
/// fetches fail at about the same time, which error is reported is not
/// deterministic.
pub async fn fetch_all<I, T, E, F, Fut>(
    cancel: &CancellationToken,
    ids: I,
    concurrency: usize,
    fetch: F,
) -> Result<Vec<T>, BatchError<E>>
where
    I: IntoIterator,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(CancellationToken, I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let ids: Vec<I::Item> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let total = ids.len();
    let concurrency = concurrency.max(1);
    let token = cancel.child_token();
    let gate = Semaphore::new(concurrency);
    let mut collector = Collector::new(total, token.clone());
    let mut units = JoinSet::new();

    debug!(total, concurrency, "batch fetch started");

    for (index, id) in ids.into_iter().enumerate() {
        // Wait for a slot, collecting finished units meanwhile. A unit's slot
        // is returned here, after its outcome is recorded, so a failure always
        // cancels the batch before the next id can be admitted.
        let admitted = loop {
            tokio::select! {
                biased;
                Some(joined) = units.join_next() => {
                    collector.record(joined);
                    gate.add_permits(1);
                }
                _ = token.cancelled() => break false,
                permit = gate.acquire() => match permit {
                    Ok(permit) => {
                        permit.forget();
                        break true;
                    }
                    Err(_) => break false,
                },
            }
        };
        if !admitted {
            debug!(admitted = index, total, "batch fetch stopped admitting");
            break;
        }

        let fetched = fetch(token.clone(), id);
        let token = token.clone();
        units.spawn(async move {
            let unit: Unit<T, E> = tokio::select! {
                biased;
                _ = token.cancelled() => Unit::Abandoned,
                outcome = fetched => match outcome {
                    Ok(item) => Unit::Fetched(item),
                    // An error caused by cancellation is not a fetch failure.
                    Err(_) if token.is_cancelled() => Unit::Abandoned,
                    Err(err) => Unit::Failed(err),
                },
            };
            (index, unit)
        });
    }

    // Drain every unit, even after a failure, so nothing outlives this call.
    while let Some(joined) = units.join_next().await {
        collector.record(joined);
    }

    let result = collector.finish();
    if result.is_ok() {
        debug!(total, "batch fetch completed");
    }
    result
}
