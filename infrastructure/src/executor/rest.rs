//! REST executor
//!
//! Drives an application that is exposed as a plain HTTP API. Each action
//! becomes one request; the response is folded into a one-line observation
//! (`"<status> <reason> :: <body preview>"`). Transport failures are not
//! errors here: they come back as `HTTP_ERROR: ...` observations so the
//! session's failure-marker scan picks them up.

use async_trait::async_trait;
use committee_application::{Execution, ExecutionError, ExecutorPort, Snapshot};
use committee_domain::{Action, ActionPayload, ActionType};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Characters of response body kept in an observation
const BODY_PREVIEW_CHARS: usize = 500;

/// Payload keys forwarded as request options rather than body fields
const HEADERS_KEY: &str = "headers";
const PARAMS_KEY: &str = "params";
const JSON_KEY: &str = "json";

#[derive(Debug, Default)]
struct PageState {
    url: String,
    last_observation: Option<String>,
}

pub struct RestExecutor {
    client: Client,
    base_url: String,
    page: Mutex<PageState>,
}

impl RestExecutor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExecutionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("beta-committee/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExecutionError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page: Mutex::new(PageState {
                url: "/".to_string(),
                last_observation: None,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method_for(action_type: ActionType) -> Method {
        match action_type {
            ActionType::Navigate | ActionType::Scroll => Method::GET,
            _ => Method::POST,
        }
    }

    fn build_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        if target.starts_with('/') {
            format!("{}{}", self.base_url, target)
        } else {
            format!("{}/{}", self.base_url, target)
        }
    }

    /// Location relative to the base URL, as shown in snapshots
    fn location_of(&self, target: &str) -> String {
        if let Some(rest) = target.strip_prefix(&self.base_url) {
            return if rest.is_empty() { "/".to_string() } else { rest.to_string() };
        }
        if target.starts_with("http://") || target.starts_with("https://") || target.starts_with('/') {
            target.to_string()
        } else {
            format!("/{}", target)
        }
    }

    async fn prepare(&self, action: &Action, method: Method, url: &str) -> RequestBuilder {
        let payload = action.wire_payload().unwrap_or_default();
        let mut request = self.client.request(method.clone(), url);

        if let Some(Value::Object(headers)) = payload.get(HEADERS_KEY) {
            for (name, value) in headers {
                request = request.header(name.as_str(), scalar_to_string(value));
            }
        }

        if let Some(Value::Object(params)) = payload.get(PARAMS_KEY) {
            let query: Vec<(String, String)> = params
                .iter()
                .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                .collect();
            request = request.query(&query);
        }

        if let ActionPayload::Upload {
            file_path: Some(file_path),
            field,
        } = action.payload()
        {
            let field = field.clone().unwrap_or_else(|| "file".to_string());
            match tokio::fs::read(file_path).await {
                Ok(bytes) => {
                    let file_name = Path::new(file_path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| field.clone());
                    let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                    return request.multipart(reqwest::multipart::Form::new().part(field, part));
                }
                Err(_) => {
                    let mut body = json_body(&payload).unwrap_or_default();
                    body.insert(
                        "error".to_string(),
                        Value::String(format!("File not found: {}", file_path)),
                    );
                    return request.json(&Value::Object(body));
                }
            }
        }

        if method == Method::POST
            && let Some(body) = json_body(&payload)
        {
            request = request.json(&Value::Object(body));
        }
        request
    }

    async fn format_response(response: Response) -> String {
        let status = response.status();
        let status_line = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        let text = response.text().await.unwrap_or_default();
        let preview = match serde_json::from_str::<Value>(&text) {
            Ok(body) => serde_json::to_string_pretty(&body).unwrap_or(text),
            Err(_) => text,
        };
        format!(
            "{} :: {}",
            status_line.trim_end(),
            preview.chars().take(BODY_PREVIEW_CHARS).collect::<String>()
        )
    }

    fn remember(&self, observation: &str, location: Option<&str>) -> String {
        match self.page.lock() {
            Ok(mut page) => {
                if let Some(location) = location {
                    page.url = location.to_string();
                }
                page.last_observation = Some(observation.to_string());
                page.url.clone()
            }
            Err(_) => location.unwrap_or("/").to_string(),
        }
    }
}

/// The request body: an explicit `json` entry, otherwise the payload itself
/// minus request options
fn json_body(payload: &Map<String, Value>) -> Option<Map<String, Value>> {
    if let Some(json) = payload.get(JSON_KEY) {
        return match json {
            Value::Object(map) => Some(map.clone()),
            other => {
                let mut wrapped = Map::new();
                wrapped.insert(JSON_KEY.to_string(), other.clone());
                Some(wrapped)
            }
        };
    }
    let body: Map<String, Value> = payload
        .iter()
        .filter(|(k, _)| k.as_str() != HEADERS_KEY && k.as_str() != PARAMS_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if body.is_empty() { None } else { Some(body) }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ExecutorPort for RestExecutor {
    async fn snapshot(&self) -> Result<Snapshot, ExecutionError> {
        let page = self
            .page
            .lock()
            .map_err(|_| ExecutionError::Other("page state lock poisoned".to_string()))?;
        Ok(Snapshot {
            url: page.url.clone(),
            page_state: page
                .last_observation
                .clone()
                .unwrap_or_else(|| "No requests made yet.".to_string()),
            image: None,
        })
    }

    async fn execute(&self, action: &Action) -> Result<Execution, ExecutionError> {
        if let ActionPayload::Report { issue } = action.payload() {
            let observation = format!("Report submitted: {}", issue.as_deref().unwrap_or(""));
            let url = self.remember(&observation, None);
            return Ok(Execution::new(observation, Duration::ZERO).with_location(url));
        }

        let method = Self::method_for(action.action_type());
        let url = self.build_url(action.target());
        debug!("{} {}", method, url);

        let request = self.prepare(action, method.clone(), &url).await;
        let start = Instant::now();
        let observation = match request.send().await {
            Ok(response) => Self::format_response(response).await,
            Err(e) => format!("HTTP_ERROR: {}", e),
        };
        let latency = start.elapsed();

        let location = (action.action_type() == ActionType::Navigate).then(|| self.location_of(action.target()));
        let current = self.remember(&observation, location.as_deref());
        Ok(Execution::new(observation, latency).with_location(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and hand back the raw request text
    async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let mut request = Vec::new();
            // Read until the headers (and any declared body) have arrived
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });
        (format!("http://{}", addr), rx)
    }

    fn executor(base_url: &str) -> RestExecutor {
        RestExecutor::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_url() {
        let exec = executor("http://shop.test/");
        assert_eq!(exec.base_url(), "http://shop.test");
        assert_eq!(exec.build_url("/products"), "http://shop.test/products");
        assert_eq!(exec.build_url("cart"), "http://shop.test/cart");
        assert_eq!(exec.build_url("https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn test_method_map() {
        assert_eq!(RestExecutor::method_for(ActionType::Navigate), Method::GET);
        assert_eq!(RestExecutor::method_for(ActionType::Scroll), Method::GET);
        assert_eq!(RestExecutor::method_for(ActionType::Click), Method::POST);
        assert_eq!(RestExecutor::method_for(ActionType::Fill), Method::POST);
        assert_eq!(RestExecutor::method_for(ActionType::Upload), Method::POST);
    }

    #[test]
    fn test_json_body_excludes_request_options() {
        let action = Action::fill("/api/search", "shoes")
            .with_extra("headers", serde_json::json!({"X-Test": "1"}))
            .with_extra("params", serde_json::json!({"page": 2}));
        let body = json_body(&action.wire_payload().unwrap()).unwrap();
        assert_eq!(body.get("value"), Some(&Value::String("shoes".into())));
        assert!(!body.contains_key("headers"));
        assert!(!body.contains_key("params"));

        let explicit = Action::click("/api/cart").with_extra("json", serde_json::json!({"qty": 1}));
        let body = json_body(&explicit.wire_payload().unwrap()).unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body.get("qty"), Some(&Value::from(1)));
    }

    #[tokio::test]
    async fn test_report_short_circuits() {
        let exec = executor("http://127.0.0.1:9");
        let result = exec
            .execute(&Action::report("task_complete", Some("checkout works".into())))
            .await
            .unwrap();
        assert_eq!(result.observation, "Report submitted: checkout works");
        assert_eq!(result.latency, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_navigate_formats_response_and_tracks_location() {
        let (base, request) = serve_once("200 OK", r#"{"items": [1, 2]}"#).await;
        let exec = executor(&base);

        let result = exec.execute(&Action::navigate("/products")).await.unwrap();
        assert!(result.observation.starts_with("200 OK :: {"));
        assert!(result.observation.contains("\"items\""));
        assert_eq!(result.location.as_deref(), Some("/products"));

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /products HTTP/1.1"));

        let snapshot = exec.snapshot().await.unwrap();
        assert_eq!(snapshot.url, "/products");
        assert_eq!(snapshot.page_state, result.observation);
    }

    #[tokio::test]
    async fn test_post_forwards_headers_params_and_body() {
        let (base, request) = serve_once("201 Created", r#"{"ok": true}"#).await;
        let exec = executor(&base);

        let action = Action::click("/api/cart")
            .with_extra("headers", serde_json::json!({"X-Session": "abc"}))
            .with_extra("params", serde_json::json!({"variant": "red"}))
            .with_extra("json", serde_json::json!({"product_id": 7}));
        let result = exec.execute(&action).await.unwrap();
        assert!(result.observation.starts_with("201 Created :: "));
        // Clicks do not move the current location
        assert_eq!(result.location.as_deref(), Some("/"));

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /api/cart?variant=red HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("x-session: abc"));
        assert!(request.contains(r#"{"product_id":7}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_an_observation() {
        let (base, _request) = serve_once("404 Not Found", "missing").await;
        let exec = executor(&base);

        let result = exec.execute(&Action::navigate("/nope")).await.unwrap();
        assert_eq!(result.observation, "404 Not Found :: missing");
    }

    #[tokio::test]
    async fn test_transport_error_becomes_http_error_marker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let exec = executor(&format!("http://{}", addr));
        let result = exec.execute(&Action::navigate("/")).await.unwrap();
        assert!(result.observation.starts_with("HTTP_ERROR: "));
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let exec = executor("http://shop.test");
        let snapshot = exec.snapshot().await.unwrap();
        assert_eq!(snapshot.url, "/");
        assert_eq!(snapshot.page_state, "No requests made yet.");
        assert!(snapshot.image.is_none());
    }
}
