use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use super::repository::ReadingRepository;
use super::SensorId;
use crate::gateway::{FetchError, Gateway, Method};

/// A reading typed in by the operator.
#[derive(Clone, Debug, PartialEq)]
pub struct ManualEntry {
    pub sensor_id: SensorId,
    pub value: f64,
    pub notes: String,
}

impl ManualEntry {
    /// Parses the form's value field. Accepts "25.3", "25.3 C", "pH 6.2".
    pub fn parse(sensor_id: SensorId, raw_value: &str, notes: &str) -> Result<Self, String> {
        let value = raw_value
            .split_whitespace()
            .find_map(|token| token.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", raw_value.trim()))?;
        Ok(Self {
            sensor_id,
            value,
            notes: notes.trim().to_string(),
        })
    }

    pub fn body(&self) -> Value {
        let mut body = json!({
            "SensorId": self.sensor_id,
            "Value": self.value,
            "Timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        if !self.notes.is_empty() {
            body["Notes"] = Value::String(self.notes.clone());
        }
        body
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitStatus {
    Sending,
    Saved,
    Failed(String),
}

/// Sends manual entries off the UI thread, one at a time.
pub struct EntrySubmitter {
    runtime: Handle,
    pending: Option<oneshot::Receiver<Result<(), FetchError>>>,
    pub status: Option<SubmitStatus>,
}

impl EntrySubmitter {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: None,
            status: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn submit(&mut self, repo: &ReadingRepository, entry: ManualEntry, token: Option<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        let gateway = Arc::clone(repo.gateway());
        let resource = repo.endpoints().create_reading.clone();
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                send(gateway.as_ref(), &resource, &entry, token.as_deref())
            })
            .await
            .unwrap_or_else(|e| Err(FetchError::Transport(format!("submit task failed: {e}"))));
            let _ = tx.send(result);
        });
        self.pending = Some(rx);
        self.status = Some(SubmitStatus::Sending);
        true
    }

    /// Returns the final status once the submission finishes.
    pub fn poll(&mut self) -> Option<&SubmitStatus> {
        let rx = self.pending.as_mut()?;
        let status = match rx.try_recv() {
            Err(TryRecvError::Empty) => return None,
            Ok(Ok(())) => SubmitStatus::Saved,
            Ok(Err(e)) => SubmitStatus::Failed(e.to_string()),
            Err(TryRecvError::Closed) => {
                SubmitStatus::Failed("submit task ended without a result".to_string())
            }
        };
        self.pending = None;
        self.status = Some(status);
        self.status.as_ref()
    }
}

pub fn send(
    gateway: &dyn Gateway,
    resource: &str,
    entry: &ManualEntry,
    token: Option<&str>,
) -> Result<(), FetchError> {
    let body = entry.body();
    match gateway.fetch(resource, Method::Post, Some(&body), token) {
        Ok(_) => {
            log::info!("saved manual reading for sensor {}", entry.sensor_id);
            Ok(())
        }
        Err(e) => {
            log::error!("manual reading for sensor {} failed: {e}", entry.sensor_id);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repository::Endpoints;
    use crate::gateway::mock::MockGateway;
    use crate::gateway::CREATE_READING_PATH;
    use std::time::Duration;

    #[test]
    fn parses_value_with_unit_or_prefix() {
        assert_eq!(ManualEntry::parse(1, "25.3 C", "").unwrap().value, 25.3);
        assert_eq!(ManualEntry::parse(1, "pH 6.2", "").unwrap().value, 6.2);
        assert!(ManualEntry::parse(1, "aphids observed", "").is_err());
        assert!(ManualEntry::parse(1, "", "").is_err());
    }

    #[test]
    fn body_carries_notes_only_when_present() {
        let entry = ManualEntry::parse(3, "750", "after dosing").unwrap();
        let body = entry.body();
        assert_eq!(body["SensorId"], 3);
        assert_eq!(body["Value"], 750.0);
        assert_eq!(body["Notes"], "after dosing");
        assert!(body["Timestamp"].as_str().unwrap().ends_with('Z'));

        let bare = ManualEntry::parse(3, "750", "  ").unwrap().body();
        assert!(bare.get("Notes").is_none());
    }

    #[test]
    fn send_posts_with_token() {
        let gateway = MockGateway::new();
        gateway.respond(CREATE_READING_PATH, Ok(json!({"SensorReadingId": 10})));
        let entry = ManualEntry::parse(2, "6.9", "").unwrap();
        send(&gateway, CREATE_READING_PATH, &entry, Some("mock_jwt_token")).unwrap();

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls[0].1, Method::Post);
        assert_eq!(calls[0].3.as_deref(), Some("mock_jwt_token"));
        assert_eq!(calls[0].2.as_ref().unwrap()["Value"], 6.9);
    }

    #[test]
    fn send_surfaces_http_errors() {
        let gateway = MockGateway::new();
        gateway.respond(
            CREATE_READING_PATH,
            Err(FetchError::Http {
                status: 400,
                message: "Unknown sensor".to_string(),
            }),
        );
        let entry = ManualEntry::parse(99, "1", "").unwrap();
        let err = send(&gateway, CREATE_READING_PATH, &entry, None).unwrap_err();
        assert_eq!(err.to_string(), "Unknown sensor");
    }

    #[test]
    fn unparseable_reply_is_not_reported_as_saved() {
        let gateway = MockGateway::new();
        gateway.respond(
            CREATE_READING_PATH,
            Err(FetchError::Format("response is not JSON: expected value".to_string())),
        );
        let entry = ManualEntry::parse(1, "7.1", "").unwrap();
        let err = send(&gateway, CREATE_READING_PATH, &entry, None).unwrap_err();
        assert!(matches!(err, FetchError::Format(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submitter_reports_completion() {
        let gateway = Arc::new(MockGateway::new().with_delay(Duration::from_millis(20)));
        gateway.respond(CREATE_READING_PATH, Ok(json!({})));
        let repo = ReadingRepository::new(gateway, Endpoints::default());
        let mut submitter = EntrySubmitter::new(Handle::current());

        let entry = ManualEntry::parse(1, "6.5", "").unwrap();
        assert!(submitter.submit(&repo, entry.clone(), None));
        assert!(!submitter.submit(&repo, entry, None));
        assert_eq!(submitter.status, Some(SubmitStatus::Sending));

        let mut done = None;
        for _ in 0..200 {
            if let Some(status) = submitter.poll() {
                done = Some(status.clone());
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(done, Some(SubmitStatus::Saved));
        assert!(!submitter.is_busy());
    }
}
