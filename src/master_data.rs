// Reference lists (units, rooms, consumption options), fetched once per session

use futures::future::try_join3;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::api::BookingApi;
use crate::config::RetryConfig;
use crate::error::ApiError;
use crate::models::{Consumption, ConsumptionId, MeetingRoom, RoomId, Unit, UnitId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterData {
    pub units: Vec<Unit>,
    pub rooms: Vec<MeetingRoom>,
    pub consumptions: Vec<Consumption>,
}

impl MasterData {
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn room(&self, id: RoomId) -> Option<&MeetingRoom> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn active_rooms(&self) -> impl Iterator<Item = &MeetingRoom> {
        self.rooms.iter().filter(|r| r.is_active)
    }

    pub fn consumption_ids(&self) -> BTreeSet<ConsumptionId> {
        self.consumptions.iter().map(|c| c.id).collect()
    }

    // Capacity label shown next to the room picker
    pub fn capacity_label(&self, id: RoomId) -> Option<String> {
        self.room(id).map(|r| format!("{} people", r.capacity))
    }
}

pub struct MasterDataLoader {
    api: Arc<dyn BookingApi>,
    retry: RetryConfig,
    loaded: OnceCell<Arc<MasterData>>,
}

impl MasterDataLoader {
    pub fn new(api: Arc<dyn BookingApi>, retry: RetryConfig) -> Self {
        Self {
            api,
            retry,
            loaded: OnceCell::new(),
        }
    }

    // Fetches the three lists concurrently; all must succeed before any is usable.
    // A successful load is cached for the lifetime of the loader.
    pub async fn load(&self) -> Result<Arc<MasterData>, ApiError> {
        self.loaded
            .get_or_try_init(|| async {
                let api = self.api.as_ref();
                let (units, rooms, consumptions) = try_join3(
                    self.with_retry("units", move || api.fetch_units()),
                    self.with_retry("rooms", move || api.fetch_rooms()),
                    self.with_retry("consumptions", move || api.fetch_consumptions()),
                )
                .await?;

                info!(
                    units = units.len(),
                    rooms = rooms.len(),
                    consumptions = consumptions.len(),
                    "master data loaded"
                );
                Ok::<_, ApiError>(Arc::new(MasterData {
                    units,
                    rooms,
                    consumptions,
                }))
            })
            .await
            .cloned()
    }

    pub fn cached(&self) -> Option<Arc<MasterData>> {
        self.loaded.get().cloned()
    }

    async fn with_retry<T, F, Fut>(&self, list: &str, fetch: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        list,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        %error,
                        "master data fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_server::MockBookingApi;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_load_joins_all_lists_once() {
        let api = Arc::new(MockBookingApi::new());
        let loader = MasterDataLoader::new(api.clone(), RetryConfig::default());
        assert!(loader.cached().is_none());

        let first = assert_ok!(loader.load().await);
        let second = assert_ok!(loader.load().await);

        assert_eq!(first.units.len(), 2);
        assert_eq!(first.rooms.len(), 2);
        assert_eq!(first.consumptions.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(api.master_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let api = Arc::new(MockBookingApi::new());
        api.fail_next_master_fetches(2);
        let loader = MasterDataLoader::new(api.clone(), RetryConfig::default());

        assert_ok!(loader.load().await);
        assert_eq!(api.master_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let api = Arc::new(MockBookingApi::new());
        api.fail_next_master_fetches(100);
        let retry = RetryConfig {
            max_retries: 1,
            ..Default::default()
        };
        let loader = MasterDataLoader::new(api.clone(), retry);

        let error = assert_err!(loader.load().await);
        assert!(matches!(error, ApiError::NetworkError(_)));
        assert!(loader.cached().is_none());
    }

    #[tokio::test]
    async fn test_lookups() {
        let api = Arc::new(MockBookingApi::new());
        let loader = MasterDataLoader::new(api, RetryConfig::default());
        let master = assert_ok!(loader.load().await);

        assert_eq!(master.room(12).map(|r| r.name.as_str()), Some("Ruang Prambanan"));
        assert_eq!(master.capacity_label(12).as_deref(), Some("10 people"));
        assert!(master.room(99).is_none());
        assert_eq!(master.active_rooms().count(), 1);
        assert_eq!(master.unit(2).map(|u| u.name.as_str()), Some("UNIT PUSAT"));
        assert_eq!(
            master.consumption_ids().into_iter().collect::<Vec<_>>(),
            vec![1, 2]
        );
    }
}
