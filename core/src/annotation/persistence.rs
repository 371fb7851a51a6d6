use crate::annotation::marker::PersistedMarker;
use crate::annotation::store::MarkerSnapshot;
use crate::prelude::{PersistenceError, PersistenceResult};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{MetricsRecorder, MetricsSnapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Marker storage keyed by measurement identifier.
#[async_trait]
pub trait MarkerRepository: Send + Sync {
    async fn load(&self, measurement_id: &str) -> PersistenceResult<Vec<PersistedMarker>>;

    /// Replaces every marker stored for `measurement_id`.
    ///
    /// Implementations must make the replacement atomic: a failure leaves the
    /// previous list intact rather than an empty one.
    async fn replace_all(
        &self,
        measurement_id: &str,
        markers: &[PersistedMarker],
    ) -> PersistenceResult<()>;
}

/// Process-local repository, mainly for tests and embedding.
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<HashMap<String, Vec<PersistedMarker>>>,
    offline: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with an I/O error until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> PersistenceResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(PersistenceError::Io("repository offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MarkerRepository for InMemoryRepository {
    async fn load(&self, measurement_id: &str) -> PersistenceResult<Vec<PersistedMarker>> {
        self.check_online()?;
        let records = self
            .records
            .lock()
            .map_err(|_| PersistenceError::Io("repository lock poisoned".into()))?;
        Ok(records.get(measurement_id).cloned().unwrap_or_default())
    }

    async fn replace_all(
        &self,
        measurement_id: &str,
        markers: &[PersistedMarker],
    ) -> PersistenceResult<()> {
        self.check_online()?;
        let mut records = self
            .records
            .lock()
            .map_err(|_| PersistenceError::Io("repository lock poisoned".into()))?;
        records.insert(measurement_id.to_string(), markers.to_vec());
        Ok(())
    }
}

/// Serializes marker loads and saves against one repository.
///
/// Saves queue behind each other so two replace-all writes for the same
/// measurement never interleave. Callers pass an owned snapshot, so the live
/// store stays editable while a save is pending.
pub struct MarkerSync<R: ?Sized> {
    repository: Arc<R>,
    gate: tokio::sync::Mutex<()>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<R: MarkerRepository + ?Sized> MarkerSync<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            gate: tokio::sync::Mutex::new(()),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new(),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub async fn load(&self, measurement_id: &str) -> PersistenceResult<Vec<PersistedMarker>> {
        let _guard = self.gate.lock().await;
        match self.repository.load(measurement_id).await {
            Ok(markers) => {
                self.logger.record(&format!(
                    "loaded {} markers for {}",
                    markers.len(),
                    measurement_id
                ));
                Ok(markers)
            }
            Err(err) => {
                self.logger
                    .warn(&format!("loading markers for {} failed: {}", measurement_id, err));
                Err(err)
            }
        }
    }

    /// Writes the snapshot and hands it back for `MarkerStore::mark_persisted`.
    pub async fn save(
        &self,
        measurement_id: &str,
        snapshot: MarkerSnapshot,
    ) -> PersistenceResult<MarkerSnapshot> {
        let _guard = self.gate.lock().await;
        match self
            .repository
            .replace_all(measurement_id, &snapshot.markers)
            .await
        {
            Ok(()) => {
                self.metrics.record_save();
                self.logger.record(&format!(
                    "saved {} markers for {}",
                    snapshot.markers.len(),
                    measurement_id
                ));
                Ok(snapshot)
            }
            Err(err) => {
                self.metrics.record_save_failure();
                self.logger
                    .warn(&format!("saving markers for {} failed: {}", measurement_id, err));
                Err(err)
            }
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::store::MarkerStore;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct SlowRepository {
        inner: InMemoryRepository,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl MarkerRepository for SlowRepository {
        async fn load(&self, measurement_id: &str) -> PersistenceResult<Vec<PersistedMarker>> {
            self.inner.load(measurement_id).await
        }

        async fn replace_all(
            &self,
            measurement_id: &str,
            markers: &[PersistedMarker],
        ) -> PersistenceResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            let result = self.inner.replace_all(measurement_id, markers).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips_order() {
        let sync = MarkerSync::new(Arc::new(InMemoryRepository::new()));
        let mut store = MarkerStore::new();
        store.add(1, 2, 30.0);
        store.add(3, 4, 45.0);

        let saved = sync.save("m-1", store.snapshot()).await.unwrap();
        store.mark_persisted(&saved);

        let mut reloaded = MarkerStore::new();
        reloaded.load_all(sync.load("m-1").await.unwrap());
        let coords: Vec<(u32, u32, Option<u32>)> = reloaded
            .iter()
            .map(|m| (m.x, m.y, m.persisted_index))
            .collect();
        assert_eq!(coords, vec![(1, 2, Some(1)), (3, 4, Some(2))]);
        assert_eq!(sync.metrics().saves, 1);
    }

    #[tokio::test]
    async fn concurrent_saves_are_serialized() {
        let repository = Arc::new(SlowRepository::default());
        let sync = MarkerSync::new(repository.clone());

        let mut store = MarkerStore::new();
        store.add(1, 1, 10.0);
        let first = store.snapshot();
        store.add(2, 2, 20.0);
        let second = store.snapshot();

        let (a, b) = tokio::join!(sync.save("m-2", first), sync.save("m-2", second));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(repository.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(sync.load("m-2").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_save_keeps_local_and_remote_state() {
        let repository = Arc::new(InMemoryRepository::new());
        let sync = MarkerSync::new(repository.clone());
        let mut store = MarkerStore::new();
        store.add(5, 5, 60.0);
        sync.save("m-3", store.snapshot()).await.unwrap();

        store.add(6, 6, 61.0);
        repository.set_offline(true);
        let err = sync.save("m-3", store.snapshot()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
        assert_eq!(store.len(), 2);
        assert_eq!(sync.metrics().save_failures, 1);

        repository.set_offline(false);
        assert_eq!(sync.load("m-3").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_stays_editable_while_save_is_pending() {
        let sync = MarkerSync::new(Arc::new(SlowRepository::default()));
        let mut store = MarkerStore::new();
        store.add(1, 1, 10.0);

        let pending = sync.save("m-4", store.snapshot());
        let late = store.add(7, 7, 70.0).id;
        let saved = pending.await.unwrap();
        store.mark_persisted(&saved);

        assert_eq!(store.get(late).unwrap().persisted_index, None);
        assert_eq!(store.iter().next().unwrap().persisted_index, Some(1));
    }
}
