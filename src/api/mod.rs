//! Remote API client: one request helper that attaches bearer auth and
//! parses JSON success/error bodies, plus typed wrappers per resource.

use std::{path::Path, sync::RwLock};

use anyhow::{Context, Result};
use log::error;
use reqwest::{multipart, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::ClientConfig;

mod auth;
mod error;
mod goals;
mod notifications;
mod posts;
mod social;

pub use auth::{AuthPayload, PasswordResetChallenge};
pub use error::ApiError;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Replaces the bearer token attached to subsequent requests. Owned by
    /// the auth service; `None` clears it on logout.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn require_token(&self) -> Result<String, ApiError> {
        self.token().ok_or(ApiError::NotAuthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.builder(Method::GET, path)).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        self.execute(self.builder(method, path).json(body)).await
    }

    pub(crate) async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ApiError> {
        self.execute(self.builder(method, path)).await
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ApiError> {
        self.execute(self.builder(Method::POST, path).multipart(form))
            .await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error::rejection_message(status.as_u16(), &body);
            error!("API request rejected ({}): {}", status, message);
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Reads a local image and builds the multipart part the upload routes
    /// expect. The backend only sniffs the extension for the content type.
    pub(crate) async fn image_part(path: &Path) -> Result<multipart::Part, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            error!("failed to read image {}: {err}", path.display());
            ApiError::Rejected {
                status: 400,
                message: format!("could not read image {}", path.display()),
            }
        })?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo.jpg")
            .to_string();
        let mime = match path.extension().and_then(|ext| ext.to_str()) {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        };

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|err| ApiError::Rejected {
                status: 400,
                message: format!("invalid image mime type: {err}"),
            })?;
        Ok(part)
    }
}
