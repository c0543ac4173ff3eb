//! Transport for the cloudscale.ch REST API

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use cloudscale_common::{ApiConfig, ApiToken, Error, Record, Result};

/// Authenticated JSON transport.
///
/// `path` is either relative to the configured base URL or an absolute
/// `href` returned by the server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// 200 yields the body, 404 yields `None`.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// 200/201 yield the body, 204 yields `None`.
    async fn post(&self, path: &str, body: Option<Record>) -> Result<Option<Value>>;

    /// 200/201 yield the body, 204 yields `None`.
    async fn patch(&self, path: &str, body: Option<Record>) -> Result<Option<Value>>;

    /// Only 204 is a success.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Drop keys without a value so "no opinion" is never sent. Clearing a field
/// needs an explicit empty container instead.
pub fn sanitize(body: Record) -> Record {
    body.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// reqwest-backed transport
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: ApiToken,
}

impl ApiClient {
    /// Build a client from validated configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let token = config
            .api_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidConfig("api_token is required".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url()?,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a bare resource path or an absolute `href`
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Record>,
    ) -> Result<(StatusCode, String)> {
        let url = self.endpoint(path)?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(self.token.expose());
        if let Some(body) = body {
            request = request.json(&sanitize(body));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{} {} -> {}", method, url, status.as_u16());

        Ok((status, text))
    }

    async fn send_with_body(
        &self,
        method: Method,
        path: &str,
        body: Option<Record>,
    ) -> Result<Option<Value>> {
        let (status, text) = self.send(method.clone(), path, body).await?;
        match status {
            StatusCode::OK | StatusCode::CREATED => parse_body(&text),
            StatusCode::NO_CONTENT => Ok(None),
            _ => Err(failure(&method, path, status, text)),
        }
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let (status, text) = self.send(Method::GET, path, None).await?;
        match status {
            StatusCode::OK => parse_body(&text),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(failure(&Method::GET, path, status, text)),
        }
    }

    async fn post(&self, path: &str, body: Option<Record>) -> Result<Option<Value>> {
        self.send_with_body(Method::POST, path, body).await
    }

    async fn patch(&self, path: &str, body: Option<Record>) -> Result<Option<Value>> {
        self.send_with_body(Method::PATCH, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let (status, text) = self.send(Method::DELETE, path, None).await?;
        match status {
            StatusCode::NO_CONTENT => Ok(()),
            _ => Err(failure(&Method::DELETE, path, status, text)),
        }
    }
}

fn parse_body(text: &str) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

fn failure(method: &Method, path: &str, status: StatusCode, detail: String) -> Error {
    Error::Api {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
        detail,
    }
}
