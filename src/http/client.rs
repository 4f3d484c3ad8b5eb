//! Request Client
//!
//! Thin wrapper over `reqwest` bound to the backend base URL. JSON in, JSON
//! out; no retries, no timeout policy beyond the transport default.

use std::fmt;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::http::error::RequestError;

/// HTTP verbs the backend API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

/// Successful response: status plus decoded JSON body (`Null` when empty)
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

/// Anything able to carry a request to the backend.
///
/// `RequestClient` is the production implementation; tests script their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError>;
}

#[derive(Clone)]
pub struct RequestClient {
    http: Client,
    base_url: String,
}

impl RequestClient {
    /// Create a client for `base_url`, which must not end with a slash
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, RequestError> {
        let http = Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RequestError> {
        Self::new(config.api_base_url.clone(), &config.user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, headers: &HeaderMap) -> Result<ApiResponse, RequestError> {
        self.execute(Verb::Get, path, None, headers).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError> {
        self.execute(Verb::Post, path, Some(body), headers).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: &Value,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError> {
        self.execute(Verb::Put, path, Some(body), headers).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: &Value,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError> {
        self.execute(Verb::Patch, path, Some(body), headers).await
    }

    pub async fn delete(&self, path: &str, headers: &HeaderMap) -> Result<ApiResponse, RequestError> {
        self.execute(Verb::Delete, path, None, headers).await
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError> {
        let url = self.url(path);
        debug!("{} {}", verb, url);

        let mut request = self.http.request(verb.as_method(), &url).headers(headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = RequestError::from_response(status.as_u16(), &text);
            debug!("{} {} failed: {}", verb, url, err);
            return Err(err);
        }

        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| RequestError::Decode(e.to_string()))?
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            data,
        })
    }
}

#[async_trait]
impl Transport for RequestClient {
    async fn send(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, RequestError> {
        self.execute(verb, path, body, headers).await
    }
}
