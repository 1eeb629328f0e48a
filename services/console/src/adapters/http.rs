//! services/console/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, the concrete implementation of the
//! `HttpTransport` port from the core crate, backed by `reqwest`.

use async_trait::async_trait;
use bookstore_core::ports::{ApiRequest, HttpMethod, HttpTransport, RawResponse, TransportError};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `HttpTransport` port over a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(15)))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

//=========================================================================================
// `HttpTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), &request.url)
            .header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("{} {} timed out", request.method, request.url)
            } else {
                format!("{} {}: {e}", request.method, request.url)
            };
            TransportError(reason)
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("reading response body: {e}")))?;
        debug!(status, bytes = body.len(), url = %request.url, "response received");

        Ok(RawResponse { status, body })
    }
}
