use std::thread;
use std::time::Duration;

use crate::domain::KernelError;
use crate::entity::EventRecord;

use super::config::RetryConfig;
use super::entity_store::EntityStore;

/// Decorates an `EntityStore` with bounded exponential backoff on
/// `KernelError::Transient` failures. Non-transient errors (not found,
/// concurrency conflicts) pass straight through, untouched and unretried.
pub struct RetryingEntityStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: EntityStore> RetryingEntityStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        RetryingEntityStore { inner, config }
    }

    fn retry<T>(&self, mut call: impl FnMut() -> Result<T, KernelError>) -> Result<T, KernelError> {
        let mut attempt = 0;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(KernelError::Transient(message)) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(KernelError::RetryableExhausted { attempts: attempt, message });
                    }
                    let delay = self.config.backoff_seconds(attempt);
                    thread::sleep(Duration::from_secs_f64(delay.max(0.0)));
                }
                Err(other) => return Err(other),
            }
        }
    }
}

impl<S: EntityStore> EntityStore for RetryingEntityStore<S> {
    fn get(&self, id: &str) -> Result<Option<Vec<EventRecord>>, KernelError> {
        self.retry(|| self.inner.get(id))
    }

    fn commit(
        &self,
        id: &str,
        expected_version: u64,
        new_events: &[EventRecord],
    ) -> Result<(), KernelError> {
        self.retry(|| self.inner.commit(id, expected_version, new_events))
    }

    fn delete(&self, id: &str) -> Result<bool, KernelError> {
        self.retry(|| self.inner.delete(id))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FlakyEntityStore;
    use super::*;
    use crate::persistence::in_memory_store::InMemoryEntityStore;

    fn fast_config() -> RetryConfig {
        RetryConfig { max_retries: 4, backoff_factor: 0.001 }
    }

    #[test]
    fn succeeds_after_transient_failures_within_budget() {
        let store = RetryingEntityStore::new(FlakyEntityStore::new(2), fast_config());
        store.commit("d1", 0, &[EventRecord::new("Created", vec![], 1)]).unwrap();
    }

    #[test]
    fn surfaces_retryable_exhausted_past_budget() {
        let store = RetryingEntityStore::new(FlakyEntityStore::new(10), fast_config());
        let err = store
            .commit("d1", 0, &[EventRecord::new("Created", vec![], 1)])
            .unwrap_err();
        assert!(matches!(err, KernelError::RetryableExhausted { attempts: 5, .. }));
    }

    #[test]
    fn non_transient_errors_bypass_retry() {
        let store = RetryingEntityStore::new(InMemoryEntityStore::new(), fast_config());
        store.commit("d1", 0, &[EventRecord::new("Created", vec![], 1)]).unwrap();
        let err = store
            .commit("d1", 0, &[EventRecord::new("Stomped", vec![], 1)])
            .unwrap_err();
        assert!(matches!(err, KernelError::ConcurrentWrite { .. }));
    }
}
