use std::io;
use std::time::Duration;

use serde_json::Value;

use super::{error_message, normalize_records, FetchError, Gateway, Method};

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Debug, PartialEq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Same configuration pointed at another API root.
    pub fn with_base_url(&self, base_url: &str) -> Self {
        Self::new(base_url, self.timeout)
    }

    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }
}

/// Blocking JSON client for the farm API.
pub struct HttpGateway {
    config: GatewayConfig,
    agent: ureq::Agent,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }

    fn classify_io(&self, err: &io::Error) -> FetchError {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                FetchError::Timeout(self.timeout_ms())
            }
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                FetchError::Format(err.to_string())
            }
            _ => FetchError::Transport(err.to_string()),
        }
    }

    fn classify(&self, err: ureq::Error) -> FetchError {
        match err {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                FetchError::Http {
                    status,
                    message: error_message(status, &body),
                }
            }
            ureq::Error::Transport(transport) => {
                let io_err = std::error::Error::source(&transport)
                    .and_then(|src| src.downcast_ref::<io::Error>());
                match io_err {
                    Some(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                        FetchError::Timeout(self.timeout_ms())
                    }
                    _ => FetchError::Transport(transport.to_string()),
                }
            }
        }
    }
}

impl Gateway for HttpGateway {
    fn fetch(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.config.resource_url(resource);
        log::debug!("{} {url}", method.as_str());

        let mut request = self
            .agent
            .request(method.as_str(), &url)
            .set("Content-Type", "application/json");
        if let Some(token) = token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let result = match body {
            Some(body) if method.sends_body() => request.send_json(body),
            _ => request.call(),
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let err = self.classify(err);
                log::warn!("{} {url} failed: {err}", method.as_str());
                return Err(err);
            }
        };

        let status = response.status();
        let text = response.into_string().map_err(|e| self.classify_io(&e))?;
        // Writes may answer 201/204 with nothing to parse.
        if text.trim().is_empty() {
            log::debug!("{} {url} answered {status} with an empty body", method.as_str());
            return Ok(Vec::new());
        }
        let json: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::Format(format!("response is not JSON: {e}")))?;
        normalize_records(json)
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread;

    /// Local server that answers one request with a canned response.
    fn serve_once(response: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            thread::sleep(Duration::from_millis(200));
        });
        addr
    }

    fn gateway_at(addr: SocketAddr, timeout_ms: u64) -> HttpGateway {
        HttpGateway::new(GatewayConfig::new(
            &format!("http://{addr}/api"),
            Duration::from_millis(timeout_ms),
        ))
    }

    #[test]
    fn base_url_is_trimmed() {
        let config = GatewayConfig::new(" https://farm.example/api/ ", Duration::from_secs(5));
        assert_eq!(config.base_url, "https://farm.example/api");
        assert_eq!(
            config.resource_url("Sensors/GetAllSensors"),
            "https://farm.example/api/Sensors/GetAllSensors"
        );
    }

    #[test]
    fn with_base_url_keeps_timeout() {
        let config = GatewayConfig::new("http://a.local/api", Duration::from_millis(1500));
        let moved = HttpGateway::new(config.with_base_url("http://b.local/api/"));
        assert_eq!(config.base_url, "http://a.local/api");
        assert_eq!(moved.base_url(), "http://b.local/api");
        assert_eq!(moved.config().timeout, Duration::from_millis(1500));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            // Accept and hold the connection without ever answering.
            let (_stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(2));
        });

        let err = gateway_at(addr, 400)
            .fetch("Sensors/GetAllSensors", Method::Get, None, None)
            .unwrap_err();
        assert!(err.is_timeout(), "expected a timeout, got {err:?}");
        assert_eq!(err, FetchError::Timeout(400));
    }

    #[test]
    fn created_with_empty_body_is_ok() {
        let addr = serve_once("HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");
        let body = serde_json::json!({"SensorId": 1, "Value": 6.9});
        let records = gateway_at(addr, 2000)
            .fetch("SensorReadings/CreateReading", Method::Post, Some(&body), None)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn non_json_body_is_a_format_error() {
        let addr = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 15\r\n\r\n<html>hi</html>",
        );
        let err = gateway_at(addr, 2000)
            .fetch("SensorReadings/CreateReading", Method::Get, None, None)
            .unwrap_err();
        assert!(matches!(err, FetchError::Format(_)), "got {err:?}");
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Port 9 on localhost is discard; nothing listens there in test sandboxes.
        let gateway = HttpGateway::new(GatewayConfig::new(
            "http://127.0.0.1:9/api",
            Duration::from_millis(500),
        ));
        let err = gateway
            .fetch("Sensors/GetAllSensors", Method::Get, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Transport(_) | FetchError::Timeout(_)
        ));
    }
}
