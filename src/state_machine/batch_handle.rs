use super::errors::StateMachineResult;
use super::states::BatchState;
use crate::models::progress_batch::{NewProgressBatch, ProgressBatch};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Thread-safe handle to a progress batch shared between its owner and workers
///
/// Every counter update and transition runs under one lock, so concurrent
/// workers never lose increments. The lock is never held across an await.
#[derive(Debug, Clone)]
pub struct BatchHandle {
    batch_id: Uuid,
    inner: Arc<Mutex<ProgressBatch>>,
}

impl BatchHandle {
    pub fn new(batch: ProgressBatch) -> Self {
        Self {
            batch_id: batch.id(),
            inner: Arc::new(Mutex::new(batch)),
        }
    }

    /// Create a fresh pending batch and wrap it
    pub fn create(attributes: Option<NewProgressBatch>) -> Self {
        Self::new(ProgressBatch::create(attributes))
    }

    pub fn id(&self) -> Uuid {
        self.batch_id
    }

    /// Copy of the current batch record
    pub fn snapshot(&self) -> ProgressBatch {
        self.inner.lock().clone()
    }

    pub fn state(&self) -> BatchState {
        self.inner.lock().state()
    }

    pub fn accomplished(&self) -> u64 {
        self.inner.lock().accomplished()
    }

    pub fn incidences(&self) -> u64 {
        self.inner.lock().incidences()
    }

    pub fn pending(&self) -> bool {
        self.inner.lock().pending()
    }

    pub fn finished(&self) -> bool {
        self.inner.lock().finished()
    }

    pub fn stopped(&self) -> bool {
        self.inner.lock().stopped()
    }

    pub fn finish(&self) -> StateMachineResult<BatchState> {
        self.inner.lock().finish()
    }

    pub fn stop(&self) -> StateMachineResult<BatchState> {
        self.inner.lock().stop()
    }

    pub fn resume(&self) -> StateMachineResult<BatchState> {
        self.inner.lock().resume()
    }

    pub fn record_accomplished(&self) -> u64 {
        self.inner.lock().record_accomplished()
    }

    pub fn record_incidence(&self) -> u64 {
        self.inner.lock().record_incidence()
    }

    /// Check whether two handles point at the same batch record
    pub fn same_batch(&self, other: &BatchHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<ProgressBatch> for BatchHandle {
    fn from(batch: ProgressBatch) -> Self {
        Self::new(batch)
    }
}
