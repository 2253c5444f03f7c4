use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::HoldConfig;
use crate::models::{normalize_seat_label, NewSeatHolding, SeatHolding};
use crate::services::availability::BookedSeatIndex;
use crate::services::catalog::SeatCatalog;
use crate::store::HoldStore;
use crate::utils::error::AppError;

/// A checkout attempt's request to hold seats.
#[derive(Debug, Clone, Default)]
pub struct CreateHold {
    pub event_id: Uuid,
    pub schedule_id: String,
    pub seats: Vec<String>,
    pub code: String,
    pub user_info: serde_json::Value,
    /// Falls back to the configured default.
    pub ttl_secs: Option<i64>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Creates, closes and reads seat holdings.
///
/// Overlapping holds are accepted unless `HoldConfig::exclusive` is set;
/// contention is settled when a seat is actually allocated.
#[derive(Clone)]
pub struct HoldService {
    store: Arc<dyn HoldStore>,
    index: BookedSeatIndex,
    catalog: Arc<SeatCatalog>,
    clock: Arc<dyn Clock>,
    config: HoldConfig,
}

impl HoldService {
    pub fn new(
        store: Arc<dyn HoldStore>,
        index: BookedSeatIndex,
        catalog: Arc<SeatCatalog>,
        clock: Arc<dyn Clock>,
        config: HoldConfig,
    ) -> Self {
        Self {
            store,
            index,
            catalog,
            clock,
            config,
        }
    }

    pub async fn create_hold(&self, request: CreateHold) -> Result<SeatHolding, AppError> {
        let seats = self.validate(&request)?;
        let ttl_secs = request.ttl_secs.unwrap_or(self.config.default_ttl_secs);
        if ttl_secs < 1 || ttl_secs > self.config.max_ttl_secs {
            return Err(AppError::ValidationError(format!(
                "ttl must be between 1 and {} seconds",
                self.config.max_ttl_secs
            )));
        }

        if self.config.exclusive {
            let unavailable = self
                .index
                .unavailable_seats(request.event_id, &request.schedule_id)
                .await?;
            let taken: Vec<&str> = seats
                .iter()
                .filter(|seat| unavailable.contains(*seat))
                .map(String::as_str)
                .collect();
            if !taken.is_empty() {
                warn!(
                    event_id = %request.event_id,
                    schedule_id = %request.schedule_id,
                    seats = ?taken,
                    "Hold refused, seats unavailable"
                );
                return Err(AppError::SeatConflict(taken.join(",")));
            }
        }

        let now = self.clock.now();
        let holding = self
            .store
            .insert_hold(
                NewSeatHolding {
                    seats,
                    event_id: request.event_id,
                    schedule_id: request.schedule_id,
                    code: request.code,
                    user_info: request.user_info,
                    expire_time: now + Duration::seconds(ttl_secs),
                    ip: request.ip,
                    user_agent: request.user_agent,
                },
                now,
            )
            .await?;

        info!(
            hold_id = %holding.id,
            event_id = %holding.event_id,
            schedule_id = %holding.schedule_id,
            seats = ?holding.seats,
            expire_time = %holding.expire_time,
            "Seat hold created"
        );
        Ok(holding)
    }

    /// Normalised, de-duplicated seat labels of a valid request.
    fn validate(&self, request: &CreateHold) -> Result<Vec<String>, AppError> {
        if request.schedule_id.trim().is_empty() {
            return Err(AppError::ValidationError("schedule id is required".into()));
        }
        if request.code.trim().is_empty() {
            return Err(AppError::ValidationError("correlation code is required".into()));
        }

        let mut seats: Vec<String> = Vec::with_capacity(request.seats.len());
        for label in request.seats.iter().map(|s| normalize_seat_label(s)) {
            if !label.is_empty() && !seats.contains(&label) {
                seats.push(label);
            }
        }
        if seats.is_empty() {
            return Err(AppError::ValidationError(
                "at least one seat is required".into(),
            ));
        }

        if self.catalog.has_seat_map(request.event_id) {
            let unknown: Vec<&str> = seats
                .iter()
                .filter(|seat| !self.catalog.contains(request.event_id, seat))
                .map(String::as_str)
                .collect();
            if !unknown.is_empty() {
                return Err(AppError::ValidationError(format!(
                    "unknown seats for this event: {}",
                    unknown.join(",")
                )));
            }
        }
        Ok(seats)
    }

    /// Closing twice is fine; the first `closed_at` is kept.
    pub async fn close_hold(&self, id: Uuid) -> Result<SeatHolding, AppError> {
        let holding = self
            .store
            .close_hold(id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Seat hold '{}' was not found", id)))?;
        info!(hold_id = %id, "Seat hold closed");
        Ok(holding)
    }

    pub async fn get_hold(&self, id: Uuid) -> Result<SeatHolding, AppError> {
        self.store
            .get_hold(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Seat hold '{}' was not found", id)))
    }

    pub async fn list_active_holds(
        &self,
        event_id: Uuid,
        schedule_id: &str,
    ) -> Result<Vec<SeatHolding>, AppError> {
        Ok(self
            .store
            .list_active_holds(event_id, schedule_id, self.clock.now())
            .await?)
    }

    /// Deletes holds that ended longer ago than the configured grace period.
    pub async fn reap_stale_holds(&self) -> Result<u64, AppError> {
        let cutoff = self.clock.now() - self.config.reap_grace();
        let reaped = self.store.reap_holds(cutoff).await?;
        debug!(reaped, cutoff = %cutoff, "Reaped stale seat holds");
        Ok(reaped)
    }
}

/// Periodically deletes stale hold rows. Expiry itself never depends on
/// this task.
pub fn spawn_reaper(service: HoldService, every: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = service.reap_stale_holds().await {
                error!(error = %e, "Seat hold reaper failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn service(config: HoldConfig, catalog: SeatCatalog) -> (HoldService, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let catalog = Arc::new(catalog);
        let index = BookedSeatIndex::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::clone(&catalog),
            Arc::new(clock.clone()),
        );
        let service = HoldService::new(
            Arc::new(store.clone()),
            index,
            catalog,
            Arc::new(clock.clone()),
            config,
        );
        (service, store, clock)
    }

    fn request(event_id: Uuid, seats: &[&str]) -> CreateHold {
        CreateHold {
            event_id,
            schedule_id: "S1".to_string(),
            seats: seats.iter().map(|s| s.to_string()).collect(),
            code: "corr-1".to_string(),
            user_info: serde_json::json!({"cart": 7}),
            ttl_secs: Some(120),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_hold_normalises_and_sets_expiry() {
        let (service, _, clock) = service(HoldConfig::default(), SeatCatalog::default());
        let hold = service
            .create_hold(request(Uuid::new_v4(), &[" b5", "B5", "c1 "]))
            .await
            .unwrap();

        assert_eq!(hold.seats, vec!["B5", "C1"]);
        assert_eq!(hold.expire_time, clock.now() + Duration::seconds(120));
        assert!(hold.closed_at.is_none());
    }

    #[tokio::test]
    async fn test_create_hold_rejects_empty_seats_and_bad_ttl() {
        let (service, store, _) = service(HoldConfig::default(), SeatCatalog::default());
        let event_id = Uuid::new_v4();

        let empty = service.create_hold(request(event_id, &[" ", ""])).await;
        assert!(matches!(empty, Err(AppError::ValidationError(_))));

        let mut too_long = request(event_id, &["A1"]);
        too_long.ttl_secs = Some(HoldConfig::default().max_ttl_secs + 1);
        assert!(matches!(
            service.create_hold(too_long).await,
            Err(AppError::ValidationError(_))
        ));

        let mut zero = request(event_id, &["A1"]);
        zero.ttl_secs = Some(0);
        assert!(matches!(
            service.create_hold(zero).await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(store.hold_count(), 0);
    }

    #[tokio::test]
    async fn test_default_ttl_applies() {
        let config = HoldConfig {
            default_ttl_secs: 45,
            ..HoldConfig::default()
        };
        let (service, _, clock) = service(config, SeatCatalog::default());
        let mut req = request(Uuid::new_v4(), &["A1"]);
        req.ttl_secs = None;

        let hold = service.create_hold(req).await.unwrap();
        assert_eq!(hold.expire_time, clock.now() + Duration::seconds(45));
    }

    #[tokio::test]
    async fn test_seats_must_exist_in_seat_map() {
        let event_id = Uuid::new_v4();
        let catalog = SeatCatalog::from_json(&format!(
            r#"{{"events": [{{"event_id": "{event_id}", "zones": [{{"category": "zone1", "seats": ["A1"]}}]}}]}}"#
        ))
        .unwrap();
        let (service, _, _) = service(HoldConfig::default(), catalog);

        assert!(service.create_hold(request(event_id, &["a1"])).await.is_ok());
        assert!(matches!(
            service.create_hold(request(event_id, &["A1", "Q7"])).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_overlapping_holds_are_allowed_by_default() {
        let (service, store, _) = service(HoldConfig::default(), SeatCatalog::default());
        let event_id = Uuid::new_v4();

        service.create_hold(request(event_id, &["A1"])).await.unwrap();
        service.create_hold(request(event_id, &["A1"])).await.unwrap();
        assert_eq!(store.hold_count(), 2);
    }

    #[tokio::test]
    async fn test_exclusive_holds_refuse_unavailable_seats() {
        let config = HoldConfig {
            exclusive: true,
            ..HoldConfig::default()
        };
        let (service, _, _) = service(config, SeatCatalog::default());
        let event_id = Uuid::new_v4();

        service.create_hold(request(event_id, &["A1"])).await.unwrap();
        let second = service.create_hold(request(event_id, &["A2", "a1"])).await;
        assert!(matches!(second, Err(AppError::SeatConflict(seats)) if seats == "A1"));
    }

    #[tokio::test]
    async fn test_close_hold_is_idempotent() {
        let (service, _, clock) = service(HoldConfig::default(), SeatCatalog::default());
        let event_id = Uuid::new_v4();
        let hold = service.create_hold(request(event_id, &["B5"])).await.unwrap();

        let first = service.close_hold(hold.id).await.unwrap();
        clock.advance(Duration::seconds(5));
        let second = service.close_hold(hold.id).await.unwrap();

        assert!(first.closed_at.is_some());
        assert_eq!(first.closed_at, second.closed_at);
        assert!(service
            .list_active_holds(event_id, "S1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_close_unknown_hold_is_not_found() {
        let (service, _, _) = service(HoldConfig::default(), SeatCatalog::default());
        assert!(matches!(
            service.close_hold(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_hold(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reaper_respects_grace_period() {
        let (service, store, clock) = service(HoldConfig::default(), SeatCatalog::default());
        service
            .create_hold(request(Uuid::new_v4(), &["A1"]))
            .await
            .unwrap();

        clock.advance(Duration::hours(1));
        assert_eq!(service.reap_stale_holds().await.unwrap(), 0);

        clock.advance(Duration::days(1));
        assert_eq!(service.reap_stale_holds().await.unwrap(), 1);
        assert_eq!(store.hold_count(), 0);
    }
}
