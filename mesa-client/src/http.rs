//! HTTP client for the remote store's REST API

use crate::{ClientConfig, ClientError, ClientResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{ErrorBody, TenantId};

/// Thin reqwest wrapper: URL joining, tenant header, status mapping
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    tenant_header: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::RemoteUnavailable(format!("HTTP client setup: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tenant_header: config.tenant_header.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, tenant: Option<&TenantId>) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request = self.client.request(method, url);
        match tenant {
            Some(tenant) => request.header(self.tenant_header.as_str(), tenant.as_str()),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        tenant: Option<&TenantId>,
    ) -> ClientResult<T> {
        let response = self.request(Method::GET, path, tenant).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        tenant: Option<&TenantId>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::POST, path, tenant)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Make a PATCH request with JSON body
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        tenant: Option<&TenantId>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::PATCH, path, tenant)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        tenant: Option<&TenantId>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::PUT, path, tenant)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        tenant: Option<&TenantId>,
    ) -> ClientResult<T> {
        let response = self.request(Method::DELETE, path, tenant).send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status(status, &text));
        }

        response.json().await.map_err(Into::into)
    }
}

/// Maps a non-success status and its body onto the error taxonomy
fn map_status(status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.summary())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::NotAuthorized(detail),
        StatusCode::NOT_FOUND => ClientError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::ValidationFailure(detail)
        }
        _ => ClientError::RemoteUnavailable(format!("{status}: {detail}")),
    }
}
