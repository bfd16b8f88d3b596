//! Shared HTTP transport.
//!
//! Every external REST call (backends, YouTube, ListenBrainz) goes through
//! [`HttpClient`]. A non-2xx response always becomes [`TransportError::Status`];
//! callers never look at raw status codes beyond that.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// User agent sent with every request
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors produced by the transport layer
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Got {code} from {url}")]
    Status { code: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// True for a 404 response
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404, .. })
    }

    /// True for 401/403 responses
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { code: 401 | 403, .. })
    }

    /// True when the server answered but refused the request for a reason
    /// other than credentials
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { .. }) && !self.is_unauthorized()
    }
}

/// Thin wrapper over a `reqwest::Client` bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for `base_url` that sends `headers` on every request.
    pub fn new(base_url: impl Into<String>, mut headers: HeaderMap) -> Result<Self, TransportError> {
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against `path` (relative to the base URL) or an absolute URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        };
        self.http_client.request(method, url)
    }

    /// Send a request and return the body of a 2xx response.
    pub async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, TransportError> {
        let request = request
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        // Query strings carry credentials for some services; keep them out of errors
        let mut display_url = request.url().clone();
        display_url.set_query(None);
        let display_url = display_url.to_string();

        tracing::debug!("{} {}", request.method(), display_url);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(
                "Response body: {}",
                String::from_utf8_lossy(&body).chars().take(200).collect::<String>()
            );
            return Err(TransportError::Status {
                code: status.as_u16(),
                url: display_url,
            });
        }

        Ok(body.to_vec())
    }

    /// Send a request and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let body = self.send(request).await?;
        parse_json(&body)
    }
}

/// Decode a JSON body, logging the raw payload on failure.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Full response: {}", String::from_utf8_lossy(body));
        TransportError::Parse(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpClient::new("http://localhost:8096/", HeaderMap::new()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8096");
    }

    #[test]
    fn test_request_joins_path() {
        let client = HttpClient::new("http://localhost:8096", HeaderMap::new()).unwrap();
        let request = client.request(Method::GET, "/Items").build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8096/Items");
    }

    #[test]
    fn test_request_accepts_absolute_url() {
        let client = HttpClient::new("http://localhost:8096", HeaderMap::new()).unwrap();
        let request = client
            .request(Method::POST, "https://plex.tv/users/sign_in.json")
            .build()
            .unwrap();
        assert_eq!(request.url().host_str(), Some("plex.tv"));
    }

    #[test]
    fn test_status_classification() {
        let not_found = TransportError::Status {
            code: 404,
            url: "x".to_string(),
        };
        let forbidden = TransportError::Status {
            code: 403,
            url: "x".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_unauthorized());
        assert!(forbidden.is_unauthorized());
    }

    #[test]
    fn test_rejection_excludes_auth_and_network() {
        let status = |code| TransportError::Status {
            code,
            url: "x".to_string(),
        };
        assert!(status(400).is_rejection());
        assert!(status(500).is_rejection());
        assert!(status(404).is_rejection());
        assert!(!status(401).is_rejection());
        assert!(!status(403).is_rejection());
        assert!(!TransportError::Network("reset".to_string()).is_rejection());
    }

    #[test]
    fn test_parse_json_error() {
        let result: Result<serde_json::Value, _> = parse_json(b"not json");
        assert!(matches!(result, Err(TransportError::Parse(_))));
    }
}
