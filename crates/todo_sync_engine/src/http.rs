//! HTTP transport implementation.
//!
//! Talks JSON to the user's backend with `reqwest`: `GET <url>` for the
//! snapshot and `POST <url>` for each event.

use crate::error::{SyncError, SyncResult};
use crate::transport::{Endpoint, SyncTransport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use todo_sync_protocol::{RemoteSnapshot, SyncEvent, CONTENT_TYPE_JSON};
use tracing::debug;

/// HTTP-based sync transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> SyncResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("todo-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn check(response: Response) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::http_status(status.as_u16(), body))
    }
}

/// Builds the request headers: JSON content type first, then the user's
/// headers, which may override it.
pub(crate) fn header_map(endpoint: &Endpoint) -> SyncResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));

    for (name, value) in &endpoint.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SyncError::InvalidConfig(format!("header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| SyncError::InvalidConfig(format!("header {name:?}: {e}")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn fetch_snapshot(&self, endpoint: &Endpoint) -> SyncResult<RemoteSnapshot> {
        debug!(url = %endpoint.url, "fetching remote snapshot");
        let response = self
            .client
            .get(&endpoint.url)
            .headers(header_map(endpoint)?)
            .send()
            .await?;
        let body = Self::check(response).await?.bytes().await?;
        Ok(RemoteSnapshot::from_json(&body)?)
    }

    async fn send_event(&self, endpoint: &Endpoint, event: &SyncEvent) -> SyncResult<()> {
        let body = event.to_json()?;
        debug!(url = %endpoint.url, event = %event.event_type(), bytes = body.len(), "posting event");
        let response = self
            .client
            .post(&endpoint.url)
            .headers(header_map(endpoint)?)
            .body(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_include_json_content_type() {
        let endpoint = Endpoint::new("http://localhost:3001/api");
        let headers = header_map(&endpoint).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn user_headers_are_added() {
        let mut endpoint = Endpoint::new("http://localhost:3001/api");
        endpoint
            .headers
            .insert("Authorization".into(), "Bearer abc".into());
        endpoint
            .headers
            .insert("Content-Type".into(), "application/json; charset=utf-8".into());

        let headers = header_map(&endpoint).unwrap();
        assert_eq!(headers.get("authorization").unwrap(), "Bearer abc");
        assert_eq!(
            headers.get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn invalid_header_is_config_error() {
        let mut endpoint = Endpoint::new("http://localhost:3001/api");
        endpoint.headers.insert("Bad Name".into(), "x".into());
        assert!(matches!(
            header_map(&endpoint),
            Err(SyncError::InvalidConfig(_))
        ));

        let mut endpoint = Endpoint::new("http://localhost:3001/api");
        endpoint.headers.insert("X-Key".into(), "line\nbreak".into());
        assert!(matches!(
            header_map(&endpoint),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let transport = HttpTransport::new().unwrap();
        // Port 9 (discard) on localhost is almost never listening.
        let endpoint = Endpoint::new("http://127.0.0.1:9/api");
        let result = transport.fetch_snapshot(&endpoint).await;
        assert!(matches!(result, Err(SyncError::Network { status: None, .. })));
    }
}
