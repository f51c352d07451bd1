use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::request::{set_header, ApiRequest, RawResponse, RequestDescriptor};
use super::transport::{HttpTransport, Transport, TransportError};
use crate::app::Config;
use crate::constants::{
    AUTHORIZATION_HEADER, AUTH_REQUIRED_MESSAGE, CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE,
    NETWORK_UNREACHABLE_MESSAGE, REQUEST_FAILED_MESSAGE,
};
use crate::session::SessionContext;
use crate::utils::ApiError;

/// Single chokepoint for every backend call.
///
/// Attaches the bearer token from the session, encodes the body, and turns
/// every response into either a JSON value or an [`ApiError`]. A 401 from
/// any endpoint clears the session and fires the login navigation before
/// the error reaches the caller.
pub struct ApiGateway {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
}

impl ApiGateway {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: Arc<SessionContext>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            session,
        }
    }

    /// Gateway over the reqwest transport, configured from `[api]`
    pub fn from_config(config: &Config, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let timeout = config.api.request_timeout_secs.map(Duration::from_secs);
        let transport = HttpTransport::new(timeout).map_err(|e| ApiError::Unexpected {
            message: format!("Failed to build HTTP client: {}", e),
        })?;
        Ok(Self::new(&config.api.base_url, Arc::new(transport), session))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// The request primitive: send and classify, returning the raw JSON payload.
    /// Empty and non-JSON success bodies come back as an empty object.
    pub async fn request_value(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let descriptor = self.describe(request)?;
        debug!(method = %descriptor.method, url = %descriptor.url, "Sending request");

        let response = self
            .transport
            .send(descriptor)
            .await
            .map_err(|e| match e {
                TransportError::Unreachable(cause) => {
                    warn!("Backend unreachable: {}", cause);
                    ApiError::NetworkUnreachable {
                        message: format!("{} ({})", NETWORK_UNREACHABLE_MESSAGE, cause),
                    }
                }
                TransportError::Invalid(cause) => ApiError::Unexpected { message: cause },
            })?;

        self.classify(response)
    }

    /// Send and decode the payload into `T`. A payload of the wrong shape is an
    /// [`ApiError::InvalidResponse`], never a partially filled value.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let value = self.request_value(request).await?;
        decode(value)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(with_body(ApiRequest::post(path), body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(with_body(ApiRequest::put(path), body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(with_body(ApiRequest::patch(path), body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::delete(path)).await
    }

    /// Resolve the URL and headers. Caller headers override the JSON default;
    /// the bearer header is attached only when the session holds a token.
    fn describe(&self, request: ApiRequest) -> Result<RequestDescriptor, ApiError> {
        let mut headers = vec![(CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string())];
        for (name, value) in request.headers {
            set_header(&mut headers, &name, value);
        }
        if let Some(token) = self.session.token() {
            set_header(&mut headers, AUTHORIZATION_HEADER, format!("Bearer {}", token));
        }

        let body = request
            .body
            .map(|value| serde_json::to_vec(&value).map(Bytes::from))
            .transpose()
            .map_err(|e| ApiError::Unexpected {
                message: format!("Failed to encode request body: {}", e),
            })?;

        let path = if request.path.starts_with('/') {
            request.path
        } else {
            format!("/{}", request.path)
        };

        Ok(RequestDescriptor {
            url: format!("{}{}", self.base_url, path),
            method: request.method,
            headers,
            body,
        })
    }

    fn classify(&self, response: RawResponse) -> Result<Value, ApiError> {
        if response.status == 401 {
            let message = serde_json::from_slice::<Value>(&response.body)
                .ok()
                .as_ref()
                .and_then(extract_detail)
                .unwrap_or_else(|| AUTH_REQUIRED_MESSAGE.to_string());
            self.session.expire();
            return Err(ApiError::AuthRequired { message });
        }

        if !response.is_success() {
            let details = serde_json::from_slice::<Value>(&response.body).unwrap_or_else(|_| {
                let mut fallback = Map::new();
                if let Some(reason) = &response.reason {
                    fallback.insert("detail".to_string(), Value::String(reason.clone()));
                }
                Value::Object(fallback)
            });
            let message = extract_detail(&details)
                .or_else(|| response.reason.clone())
                .unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string());
            debug!(status = response.status, "Request failed: {}", message);

            return Err(if response.status >= 500 {
                ApiError::Server {
                    status: response.status,
                    message,
                    details: Some(details),
                }
            } else {
                ApiError::ValidationFailed {
                    status: Some(response.status),
                    message,
                    details: Some(details),
                }
            });
        }

        if response.status == 204 || !response.is_json() || response.body.is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_slice(&response.body).map_err(|e| ApiError::InvalidResponse {
            message: e.to_string(),
            details: None,
        })
    }
}

fn with_body<B: Serialize + ?Sized>(
    request: ApiRequest,
    body: Option<&B>,
) -> Result<ApiRequest, ApiError> {
    match body {
        Some(body) => request.json(body),
        None => Ok(request),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    T::deserialize(&value).map_err(|e| ApiError::InvalidResponse {
        message: e.to_string(),
        details: Some(value.clone()),
    })
}

/// Human-readable message from an error body: `detail` as a string, or the
/// first `msg` of a validation error list
fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
