use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use super::repository::{ReadingRepository, Snapshot};
use crate::gateway::FetchError;

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    Updated { sensors: usize, readings: usize },
    Failed(FetchError),
}

/// Runs repository refreshes on the runtime and reports back to the UI loop.
///
/// At most one refresh is in flight; requests made while busy are dropped.
/// Busy is cleared whenever the in-flight task finishes, fails, or vanishes.
pub struct RefreshOrchestrator {
    runtime: Handle,
    pending: Option<oneshot::Receiver<Result<Snapshot, FetchError>>>,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

impl RefreshOrchestrator {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: None,
            last_error: None,
            last_success: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a refresh unless one is already running. Returns whether a new
    /// refresh was started.
    pub fn request(&mut self, repo: &ReadingRepository) -> bool {
        if self.is_busy() {
            log::debug!("refresh already in flight, ignoring request");
            return false;
        }

        let fetcher = repo.fetcher();
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let _ = tx.send(fetcher.fetch().await);
        });
        self.pending = Some(rx);
        log::info!("refresh started against {}", repo.gateway().base_url());
        true
    }

    /// Forgets the in-flight refresh. Its result is dropped when it lands,
    /// so it can never be applied to a repository that has moved on.
    pub fn cancel(&mut self) -> bool {
        let dropped = self.pending.take().is_some();
        if dropped {
            log::info!("discarding in-flight refresh");
        }
        dropped
    }

    /// Non-blocking check for a finished refresh; applies it to `repo`.
    pub fn poll(&mut self, repo: &mut ReadingRepository) -> Option<RefreshOutcome> {
        let rx = self.pending.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(lost_task()),
        };
        self.pending = None;
        Some(self.complete(result, repo))
    }

    /// Waits for the in-flight refresh, if any.
    pub async fn wait(&mut self, repo: &mut ReadingRepository) -> Option<RefreshOutcome> {
        let rx = self.pending.take()?;
        let result = rx.await.unwrap_or_else(|_| Err(lost_task()));
        Some(self.complete(result, repo))
    }

    /// Request + wait. `None` when a refresh was already running.
    pub async fn refresh_all(&mut self, repo: &mut ReadingRepository) -> Option<RefreshOutcome> {
        if !self.request(repo) {
            return None;
        }
        self.wait(repo).await
    }

    fn complete(
        &mut self,
        result: Result<Snapshot, FetchError>,
        repo: &mut ReadingRepository,
    ) -> RefreshOutcome {
        match result {
            Ok(snapshot) => {
                let outcome = RefreshOutcome::Updated {
                    sensors: snapshot.sensors.len(),
                    readings: snapshot.readings.len(),
                };
                self.last_success = snapshot.fetched_at;
                self.last_error = None;
                repo.install(snapshot);
                log::info!("refresh complete: {outcome:?}");
                outcome
            }
            Err(err) => {
                log::error!("refresh failed: {err}");
                self.last_error = Some(err.to_string());
                RefreshOutcome::Failed(err)
            }
        }
    }
}

fn lost_task() -> FetchError {
    FetchError::Transport("refresh task ended without a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repository::Endpoints;
    use crate::gateway::mock::MockGateway;
    use crate::gateway::{READINGS_PATH, SENSORS_PATH};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn seeded_gateway() -> Arc<MockGateway> {
        let gateway = Arc::new(MockGateway::new().with_delay(Duration::from_millis(50)));
        gateway.respond(SENSORS_PATH, Ok(json!([{"SensorId": 1, "Name": "pH"}])));
        gateway.respond(
            READINGS_PATH,
            Ok(json!([{"SensorId": 1, "Value": 6.8, "Timestamp": "2024-01-01T10:00:00Z"}])),
        );
        gateway
    }

    #[tokio::test]
    async fn busy_flag_spans_the_refresh() {
        let gateway = seeded_gateway();
        let mut repo = ReadingRepository::new(gateway, Endpoints::default());
        let mut orchestrator = RefreshOrchestrator::new(Handle::current());

        assert!(!orchestrator.is_busy());
        assert!(orchestrator.request(&repo));
        assert!(orchestrator.is_busy());

        let outcome = orchestrator.wait(&mut repo).await;
        assert_eq!(
            outcome,
            Some(RefreshOutcome::Updated {
                sensors: 1,
                readings: 1
            })
        );
        assert!(!orchestrator.is_busy());
        assert!(orchestrator.last_success.is_some());
        assert_eq!(repo.sensors().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_requests_are_coalesced() {
        let gateway = seeded_gateway();
        let mut repo = ReadingRepository::new(gateway.clone(), Endpoints::default());
        let mut orchestrator = RefreshOrchestrator::new(Handle::current());

        assert!(orchestrator.request(&repo));
        assert!(!orchestrator.request(&repo));
        assert_eq!(orchestrator.refresh_all(&mut repo).await, None);

        orchestrator.wait(&mut repo).await;
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn failure_keeps_data_and_clears_busy() {
        let gateway = seeded_gateway();
        let mut repo = ReadingRepository::new(gateway.clone(), Endpoints::default());
        let mut orchestrator = RefreshOrchestrator::new(Handle::current());
        orchestrator.refresh_all(&mut repo).await;
        let before = repo.snapshot().clone();

        gateway.respond(READINGS_PATH, Err(FetchError::Timeout(5000)));
        let outcome = orchestrator.refresh_all(&mut repo).await;

        assert_eq!(outcome, Some(RefreshOutcome::Failed(FetchError::Timeout(5000))));
        assert!(!orchestrator.is_busy());
        assert_eq!(
            orchestrator.last_error.as_deref(),
            Some("Request timed out after 5000 ms")
        );
        assert_eq!(repo.snapshot(), &before);

        gateway.respond(
            READINGS_PATH,
            Ok(json!([{"SensorId": 1, "Value": 7.0, "Timestamp": "2024-01-01T11:00:00Z"}])),
        );
        orchestrator.refresh_all(&mut repo).await;
        assert_eq!(orchestrator.last_error, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_refresh_is_never_applied() {
        let gateway = seeded_gateway();
        let mut repo = ReadingRepository::new(gateway, Endpoints::default());
        let mut orchestrator = RefreshOrchestrator::new(Handle::current());

        assert!(!orchestrator.cancel());
        orchestrator.request(&repo);
        assert!(orchestrator.cancel());
        assert!(!orchestrator.is_busy());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(orchestrator.poll(&mut repo), None);
        assert!(repo.sensors().is_empty());
        assert_eq!(orchestrator.last_success, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn poll_picks_up_completion() {
        let gateway = seeded_gateway();
        let mut repo = ReadingRepository::new(gateway, Endpoints::default());
        let mut orchestrator = RefreshOrchestrator::new(Handle::current());

        assert_eq!(orchestrator.poll(&mut repo), None);
        orchestrator.request(&repo);

        let mut outcome = None;
        for _ in 0..200 {
            outcome = orchestrator.poll(&mut repo);
            if outcome.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(matches!(outcome, Some(RefreshOutcome::Updated { .. })));
        assert!(!orchestrator.is_busy());
    }
}
