pub mod http;

use serde_json::Value;
use thiserror::Error;

pub use http::{GatewayConfig, HttpGateway};

/// Resource path for the full sensor list.
pub const SENSORS_PATH: &str = "Sensors/GetAllSensors";
/// Resource path for the full reading list.
pub const READINGS_PATH: &str = "SensorReadings/GetAllSensorReadings";
/// Resource path used when submitting a manual reading.
pub const CREATE_READING_PATH: &str = "SensorReadings/CreateSensorReading";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    fn sends_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Unexpected response body: {0}")]
    Format(String),
    #[error("Request failed: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// A request function against named resources of the farm API.
///
/// Implementations return the decoded JSON body normalized into a list of
/// records (see [`normalize_records`]).
pub trait Gateway: Send + Sync {
    fn fetch(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Vec<Value>, FetchError>;

    /// Base URL the gateway resolves resources against, for display.
    fn base_url(&self) -> &str;
}

/// Array bodies yield their elements, an empty object yields nothing and any
/// other object becomes a single record.
pub fn normalize_records(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(FetchError::Format(format!(
            "expected a JSON array or object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Picks the most useful message out of a failed response body.
pub fn error_message(status: u16, body: &str) -> String {
    let fallback = format!("HTTP error! status: {status}");
    match serde_json::from_str::<Value>(body) {
        Ok(json) => ["message", "detail"]
            .iter()
            .find_map(|key| match json.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or(fallback),
        Err(_) if !body.trim().is_empty() => body.to_string(),
        Err(_) => fallback,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Canned responses keyed by resource path.
    pub struct MockGateway {
        responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
        pub calls: Mutex<Vec<(String, Method, Option<Value>, Option<String>)>>,
        delay: Duration,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn respond(&self, resource: &str, response: Result<Value, FetchError>) {
            self.responses
                .lock()
                .unwrap()
                .insert(resource.to_string(), response);
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Gateway for MockGateway {
        fn fetch(
            &self,
            resource: &str,
            method: Method,
            body: Option<&Value>,
            token: Option<&str>,
        ) -> Result<Vec<Value>, FetchError> {
            self.calls.lock().unwrap().push((
                resource.to_string(),
                method,
                body.cloned(),
                token.map(str::to_string),
            ));
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            let response = self
                .responses
                .lock()
                .unwrap()
                .get(resource)
                .cloned()
                .unwrap_or_else(|| {
                    Err(FetchError::Http {
                        status: 404,
                        message: "HTTP error! status: 404".to_string(),
                    })
                });
            response.and_then(normalize_records)
        }

        fn base_url(&self) -> &str {
            "mock://farm/api"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_body_yields_elements() {
        let records = normalize_records(json!([{"SensorId": 1}, {"SensorId": 2}])).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn single_object_becomes_one_record() {
        let records = normalize_records(json!({"SensorId": 3, "Name": "pH"})).unwrap();
        assert_eq!(records, vec![json!({"SensorId": 3, "Name": "pH"})]);
    }

    #[test]
    fn empty_object_yields_nothing() {
        assert!(normalize_records(json!({})).unwrap().is_empty());
    }

    #[test]
    fn scalar_body_is_a_format_error() {
        assert!(matches!(
            normalize_records(json!("ok")),
            Err(FetchError::Format(_))
        ));
        assert!(matches!(
            normalize_records(Value::Null),
            Err(FetchError::Format(_))
        ));
    }

    #[test]
    fn error_message_prefers_message_then_detail() {
        assert_eq!(
            error_message(400, r#"{"message":"bad sensor","detail":"x"}"#),
            "bad sensor"
        );
        assert_eq!(error_message(500, r#"{"detail":"db down"}"#), "db down");
    }

    #[test]
    fn error_message_falls_back_to_text_then_status() {
        assert_eq!(error_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(404, ""), "HTTP error! status: 404");
        assert_eq!(error_message(418, r#"{"title":"x"}"#), "HTTP error! status: 418");
    }

    #[test]
    fn timeout_is_classified() {
        assert!(FetchError::Timeout(5000).is_timeout());
        assert_eq!(
            FetchError::Timeout(5000).to_string(),
            "Request timed out after 5000 ms"
        );
    }
}
