//! Bounded-concurrency fan-out over a list of keys.
//!
//! Workers run interleaved on the calling task; nothing is spawned. One
//! worker's failure is recorded against its index and never affects the
//! others.

use std::future::Future;

use fleet_core::BatchProgress;
use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchConfigError {
    #[error("batch concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),
}

/// Result of one item, keyed by its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<V, E> {
    Success { index: usize, result: V },
    Failure { index: usize, error: E },
}

impl<V, E> FetchOutcome<V, E> {
    pub fn index(&self) -> usize {
        match self {
            FetchOutcome::Success { index, .. } | FetchOutcome::Failure { index, .. } => *index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<T> {
    pub index: usize,
    pub value: T,
}

/// Successes and failures, each sorted by original index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome<V, E> {
    pub successes: Vec<Indexed<V>>,
    pub failures: Vec<Indexed<E>>,
}

impl<V, E> Default for BatchOutcome<V, E> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<V, E> BatchOutcome<V, E> {
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges both partitions back into input order.
    pub fn into_outcomes(self) -> Vec<FetchOutcome<V, E>> {
        let mut outcomes: Vec<FetchOutcome<V, E>> = self
            .successes
            .into_iter()
            .map(|item| FetchOutcome::Success {
                index: item.index,
                result: item.value,
            })
            .chain(self.failures.into_iter().map(|item| FetchOutcome::Failure {
                index: item.index,
                error: item.value,
            }))
            .collect();
        outcomes.sort_by_key(FetchOutcome::index);
        outcomes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    concurrency: usize,
}

impl BatchExecutor {
    pub fn new(concurrency: usize) -> Result<Self, BatchConfigError> {
        if concurrency == 0 {
            return Err(BatchConfigError::InvalidConcurrency(concurrency));
        }
        Ok(Self { concurrency })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `worker` over every item with at most `concurrency` invocations
    /// unsettled at once. `on_progress` sees `{0, total}` first and then one
    /// update per settled item.
    pub async fn run<'a, K, V, E, F, Fut>(
        &self,
        items: &'a [K],
        worker: F,
        mut on_progress: impl FnMut(BatchProgress),
    ) -> BatchOutcome<V, E>
    where
        F: Fn(&'a K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut outcome = BatchOutcome::default();
        let total = items.len();
        if total == 0 {
            return outcome;
        }
        on_progress(BatchProgress::start(total));

        let mut pending = items.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        for (index, item) in pending.by_ref().take(self.concurrency) {
            in_flight.push(settle(index, worker(item)));
        }

        let mut completed = 0;
        while let Some((index, result)) = in_flight.next().await {
            completed += 1;
            match result {
                Ok(value) => outcome.successes.push(Indexed { index, value }),
                Err(value) => outcome.failures.push(Indexed { index, value }),
            }
            on_progress(BatchProgress { completed, total });
            if let Some((index, item)) = pending.next() {
                in_flight.push(settle(index, worker(item)));
            }
        }

        outcome.successes.sort_by_key(|item| item.index);
        outcome.failures.sort_by_key(|item| item.index);
        outcome
    }
}

async fn settle<Fut: Future>(index: usize, work: Fut) -> (usize, Fut::Output) {
    (index, work.await)
}
