use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::request::{RawResponse, RequestDescriptor};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// DNS failure, refused connection, timeout, dropped body
    #[error("{0}")]
    Unreachable(String),

    /// The request could not be built (bad URL, bad header)
    #[error("{0}")]
    Invalid(String),
}

/// Moves a resolved request over the wire
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            content_type,
            body,
        })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::Invalid(error.to_string())
    } else {
        TransportError::Unreachable(error.to_string())
    }
}
