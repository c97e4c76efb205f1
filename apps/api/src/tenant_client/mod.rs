//! Tenant backend client: the single point of entry for every call to the
//! tenant service (configuration, partial updates, usage, analytics, health).
//!
//! Callers depend on the `TenantBackend` trait; `HttpTenantBackend` is the
//! production implementation. No call is retried here: retrying is always an
//! explicit action of whoever called the manager or a view.
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::tenant::{Branding, SecurityPolicy, TenantConfiguration, TenantUsage};

#[cfg(test)]
pub mod fake;

#[derive(Debug, Error)]
pub enum TenantClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tenant API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tenant API rejected the request: {0}")]
    Rejected(String),

    #[error("Tenant API response is missing `{0}`")]
    MissingData(&'static str),
}

/// Response envelope shared by every tenant API endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigPayload {
    config: TenantConfiguration,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    usage: TenantUsage,
}

#[derive(Debug, Serialize)]
struct TransformRequest<'a> {
    component: &'a Value,
    #[serde(rename = "transformationType")]
    transformation_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TransformPayload {
    component: Value,
}

/// Backend contract consumed by the tenant context manager and the management views.
#[async_trait]
pub trait TenantBackend: Send + Sync {
    async fn fetch_config(&self, slug: &str) -> Result<TenantConfiguration, TenantClientError>;

    /// Partial configuration update (`{updates: {...}}`).
    async fn update_config(&self, slug: &str, updates: &Value) -> Result<(), TenantClientError>;

    async fn update_features(
        &self,
        slug: &str,
        features: &BTreeMap<String, bool>,
    ) -> Result<(), TenantClientError>;

    async fn update_branding(&self, slug: &str, branding: &Branding)
        -> Result<(), TenantClientError>;

    async fn update_security(
        &self,
        slug: &str,
        security: &SecurityPolicy,
    ) -> Result<(), TenantClientError>;

    async fn fetch_usage(&self, slug: &str) -> Result<TenantUsage, TenantClientError>;

    async fn fetch_analytics(&self, slug: &str) -> Result<Value, TenantClientError>;

    async fn fetch_health(&self, slug: &str) -> Result<Value, TenantClientError>;

    /// Server-side transformation variant. The local engine stays authoritative.
    async fn transform_remote(
        &self,
        slug: &str,
        component: &Value,
        transformation_type: &str,
    ) -> Result<Value, TenantClientError>;
}

/// reqwest-backed implementation of [`TenantBackend`].
#[derive(Clone)]
pub struct HttpTenantBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpTenantBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TenantClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn request(&self, method: Method, path: &str, slug: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}/{}", self.base_url, path))
            .query(&[("tenant", slug)]);
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and unwraps the `{success, data, message}` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, TenantClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the envelope's message over the raw body
            let message = serde_json::from_str::<ApiEnvelope<Value>>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(TenantClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(TenantClientError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "no message provided".to_string()),
            ));
        }

        Ok(envelope.data)
    }

    async fn acknowledge(&self, request: RequestBuilder) -> Result<(), TenantClientError> {
        self.send::<Value>(request).await.map(|_| ())
    }
}

#[async_trait]
impl TenantBackend for HttpTenantBackend {
    async fn fetch_config(&self, slug: &str) -> Result<TenantConfiguration, TenantClientError> {
        debug!(tenant = %slug, "Fetching tenant configuration");
        let payload: ConfigPayload = self
            .send(self.request(Method::GET, "tenant-config", slug))
            .await?
            .ok_or(TenantClientError::MissingData("config"))?;
        Ok(payload.config)
    }

    async fn update_config(&self, slug: &str, updates: &Value) -> Result<(), TenantClientError> {
        debug!(tenant = %slug, "Updating tenant configuration");
        self.acknowledge(
            self.request(Method::PUT, "tenant-config", slug)
                .json(&json!({ "updates": updates })),
        )
        .await
    }

    async fn update_features(
        &self,
        slug: &str,
        features: &BTreeMap<String, bool>,
    ) -> Result<(), TenantClientError> {
        self.acknowledge(
            self.request(Method::PUT, "tenant-features", slug)
                .json(&json!({ "features": features })),
        )
        .await
    }

    async fn update_branding(
        &self,
        slug: &str,
        branding: &Branding,
    ) -> Result<(), TenantClientError> {
        self.acknowledge(
            self.request(Method::PUT, "tenant-branding", slug)
                .json(&json!({ "branding": branding })),
        )
        .await
    }

    async fn update_security(
        &self,
        slug: &str,
        security: &SecurityPolicy,
    ) -> Result<(), TenantClientError> {
        self.acknowledge(
            self.request(Method::PUT, "tenant-security", slug)
                .json(&json!({ "security": security })),
        )
        .await
    }

    async fn fetch_usage(&self, slug: &str) -> Result<TenantUsage, TenantClientError> {
        let payload: UsagePayload = self
            .send(self.request(Method::GET, "tenant-limits", slug))
            .await?
            .ok_or(TenantClientError::MissingData("usage"))?;
        Ok(payload.usage)
    }

    async fn fetch_analytics(&self, slug: &str) -> Result<Value, TenantClientError> {
        self.send(self.request(Method::GET, "tenant-analytics", slug))
            .await?
            .ok_or(TenantClientError::MissingData("data"))
    }

    async fn fetch_health(&self, slug: &str) -> Result<Value, TenantClientError> {
        self.send(self.request(Method::GET, "tenant-health", slug))
            .await?
            .ok_or(TenantClientError::MissingData("data"))
    }

    async fn transform_remote(
        &self,
        slug: &str,
        component: &Value,
        transformation_type: &str,
    ) -> Result<Value, TenantClientError> {
        let payload: TransformPayload = self
            .send(
                self.request(Method::POST, "tenants/transform", slug)
                    .json(&TransformRequest {
                        component,
                        transformation_type,
                    }),
            )
            .await?
            .ok_or(TenantClientError::MissingData("component"))?;
        Ok(payload.component)
    }
}
