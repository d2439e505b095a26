//! HTTP implementation of [`TrafficApi`] using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{FetchError, TrafficApi};
use crate::data::{CongestionSnapshot, HealthReport, HistoryResponse, SignalPhase, SignalState};

/// Traffic backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTrafficApi {
    client: Client,
    endpoint: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct ForceSignalRequest {
    signal: SignalPhase,
}

impl HttpTrafficApi {
    /// Create a client for the backend at `endpoint` (e.g. `http://localhost:5000`).
    ///
    /// `timeout` bounds every request, including the override POST.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let description = format!("http: {}", endpoint);
        Ok(Self {
            client,
            endpoint,
            description,
        })
    }

    /// Base URL of the backend.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self.client.get(self.url(path)).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl TrafficApi for HttpTrafficApi {
    async fn health(&self) -> Result<HealthReport, FetchError> {
        self.get_json("/api/health").await
    }

    async fn signal_status(&self) -> Result<SignalState, FetchError> {
        self.get_json("/api/signal-status").await
    }

    async fn congestion(&self) -> Result<CongestionSnapshot, FetchError> {
        self.get_json("/api/congestion").await
    }

    async fn history(&self) -> Result<HistoryResponse, FetchError> {
        self.get_json("/api/history").await
    }

    async fn force_signal(&self, phase: SignalPhase) -> Result<(), FetchError> {
        let response = self
            .client
            .post(self.url("/api/force-signal"))
            .json(&ForceSignalRequest { signal: phase })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    fn live_feed_url(&self) -> Option<String> {
        Some(self.url("/api/live-feed"))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });
        (format!("http://{}", addr), handle)
    }

    /// Read headers plus a `content-length` body, which may arrive in separate segments.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let body_len = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    #[test]
    fn test_endpoint_normalized() {
        let api = HttpTrafficApi::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.endpoint(), "http://localhost:5000");
        assert_eq!(api.description(), "http: http://localhost:5000");
        assert_eq!(
            api.live_feed_url().as_deref(),
            Some("http://localhost:5000/api/live-feed")
        );
    }

    #[tokio::test]
    async fn test_health_decodes() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"status":"healthy","camera_active":true,"signal_controller_active":true}"#,
        )
        .await;
        let api = HttpTrafficApi::new(&url, Duration::from_secs(2)).unwrap();

        let report = api.health().await.unwrap();
        assert!(report.is_healthy());
        assert!(report.camera_active);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/health"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (url, _server) = serve_once("503 Service Unavailable", "{}").await;
        let api = HttpTrafficApi::new(&url, Duration::from_secs(2)).unwrap();

        assert_eq!(api.congestion().await.unwrap_err(), FetchError::Status(503));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (url, _server) = serve_once("200 OK", r#"{"current_signal":"BLUE"}"#).await;
        let api = HttpTrafficApi::new(&url, Duration::from_secs(2)).unwrap();

        assert!(matches!(api.signal_status().await, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_force_signal_posts_phase() {
        let (url, server) = serve_once("200 OK", r#"{"success":true}"#).await;
        let api = HttpTrafficApi::new(&url, Duration::from_secs(2)).unwrap();

        api.force_signal(SignalPhase::Yellow).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/force-signal"));
        assert!(request.contains(r#"{"signal":"YELLOW"}"#));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpTrafficApi::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        assert!(matches!(api.health().await, Err(FetchError::Connection(_))));
    }
}
