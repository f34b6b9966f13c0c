//! Authenticated request pipeline shared by every API wrapper.
//!
//! # Design
//! A call goes through three steps:
//! 1. `build_request` turns (method, path segments, query, body) into an
//!    `HttpRequest` carrying the bearer token. Pure, no I/O.
//! 2. `execute` waits on the rate limiter and hands the request to the
//!    `Transport`.
//! 3. `parse_response` maps 2xx bodies to the caller's type and anything
//!    else to `ApiError::Http`. Pure, no I/O.
//!
//! The verb helpers (`get`, `post`, ...) chain the three steps for the
//! wrappers in `table.rs`, `record.rs`, `base.rs` and `attachment.rs`.
//! `Client` is cheap to clone; clones share the transport and the limiter.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, HttpError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, QueryParams};
use crate::rate_limit::RateLimiter;
use crate::table::Table;
use crate::transport::{Transport, UreqTransport};

pub const DEFAULT_BASE_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://content.airtable.com/v0";

/// Which configured host a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Records, bases and schema.
    Api,
    /// Attachment uploads.
    Upload,
}

/// Blocking client for the API.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    base_url: String,
    upload_base_url: String,
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    request_timeout: Option<Duration>,
}

impl Client {
    /// Create a client with the default hosts, rate limit and transport.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            transport: Arc::new(UreqTransport::new()),
            limiter: Arc::new(RateLimiter::default()),
            request_timeout: None,
        }
    }

    /// Create a client from a declarative configuration, validating every
    /// value the same way the setters do.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let mut client = Client::new(config.api_key);
        if let Some(url) = config.base_url.as_deref() {
            client.set_base_url(url)?;
        }
        if let Some(url) = config.upload_base_url.as_deref() {
            client.set_upload_base_url(url)?;
        }
        if let Some(rps) = config.requests_per_second {
            client.set_rate_limit(rps)?;
        }
        if let Some(secs) = config.timeout_secs {
            if secs == 0 {
                return Err(ApiError::InvalidConfig {
                    key: "timeout_secs",
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            client.set_transport(UreqTransport::with_timeout(Duration::from_secs(secs)));
        }
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_base_url(&self) -> &str {
        &self.upload_base_url
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Point record, base and schema requests at another host.
    ///
    /// On error the previous base URL stays in effect.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.base_url = validate_base_url(base_url)?;
        Ok(())
    }

    /// Point attachment uploads at another host.
    pub fn set_upload_base_url(&mut self, upload_base_url: &str) -> Result<()> {
        self.upload_base_url = validate_base_url(upload_base_url)?;
        Ok(())
    }

    /// Replace this client's limiter with a fresh one pacing `requests_per_second`.
    ///
    /// Clones taken before the call keep the old limiter.
    pub fn set_rate_limit(&mut self, requests_per_second: u32) -> Result<()> {
        self.limiter = Arc::new(RateLimiter::new(requests_per_second)?);
        Ok(())
    }

    /// Share an existing limiter, e.g. between clients hitting the same base.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Arc::new(transport);
    }

    /// A clone whose requests each give up after `timeout`.
    ///
    /// The clone shares this client's transport and limiter; only the
    /// deadline differs.
    pub fn with_timeout(&self, timeout: Duration) -> Client {
        Client {
            request_timeout: Some(timeout),
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Scope record operations to one table of one base.
    pub fn table(&self, db_name: &str, table_name: &str) -> Table {
        Table::new(self.clone(), db_name, table_name)
    }

    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        segments: &[&str],
        params: &QueryParams,
        body: Option<&B>,
    ) -> Result<HttpRequest> {
        let url = self.endpoint_url(endpoint, segments, params)?;
        let body = body
            .map(|b| serde_json::to_string(b).map_err(|e| ApiError::Serialization(e.to_string())))
            .transpose()?;

        Ok(HttpRequest {
            method,
            url,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
            ],
            body,
            timeout: self.request_timeout,
        })
    }

    /// `{base}/{segments...}?{params}` with empty segments skipped.
    pub(crate) fn endpoint_url(&self, endpoint: Endpoint, segments: &[&str], params: &QueryParams) -> Result<String> {
        let base = match endpoint {
            Endpoint::Api => &self.base_url,
            Endpoint::Upload => &self.upload_base_url,
        };
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidRequest(format!("cannot create request: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidRequest(format!("cannot create request: {base} cannot be a base")))?
            .pop_if_empty()
            .extend(segments.iter().filter(|s| !s.is_empty()));
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url.into())
    }

    /// Wait for a rate-limit slot, then send `request` through the transport.
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if request.url.is_empty() {
            return Err(ApiError::InvalidRequest("nil request".to_string()));
        }
        self.limiter.acquire();
        debug!("{} {}", request.method.as_str(), request.url);
        self.transport.execute(request)
    }

    /// Decode a 2xx body into `T`; map anything else to `ApiError::Http`.
    pub fn parse_response<T: DeserializeOwned>(&self, url: &str, response: HttpResponse) -> Result<T> {
        if !response.is_success() {
            warn!("{url} answered with status {}", response.status);
            return Err(HttpError::new(response.status, url, response.body).into());
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization {
            url: url.to_string(),
            body: response.body,
            message: e.to_string(),
        })
    }

    fn send<B, T>(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        segments: &[&str],
        params: &QueryParams,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_request(method, endpoint, segments, params, body)?;
        let response = self.execute(&request)?;
        self.parse_response(&request.url, response)
    }

    /// GET `{base_url}/{segments...}`; empty segments are skipped.
    pub(crate) fn get<T: DeserializeOwned>(&self, segments: &[&str], params: &QueryParams) -> Result<T> {
        self.send::<(), T>(HttpMethod::Get, Endpoint::Api, segments, params, None)
    }

    pub(crate) fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, db: &str, table: &str, data: &B) -> Result<T> {
        self.send(HttpMethod::Post, Endpoint::Api, &[db, table], &QueryParams::new(), Some(data))
    }

    pub(crate) fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, db: &str, table: &str, data: &B) -> Result<T> {
        self.send(HttpMethod::Put, Endpoint::Api, &[db, table], &QueryParams::new(), Some(data))
    }

    pub(crate) fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, db: &str, table: &str, data: &B) -> Result<T> {
        self.send(HttpMethod::Patch, Endpoint::Api, &[db, table], &QueryParams::new(), Some(data))
    }

    pub(crate) fn delete<T: DeserializeOwned>(&self, db: &str, table: &str, record_ids: &[&str]) -> Result<T> {
        let mut params = QueryParams::new();
        for id in record_ids {
            params.add("records[]", *id);
        }
        self.send::<(), T>(HttpMethod::Delete, Endpoint::Api, &[db, table], &params, None)
    }

    pub(crate) fn post_attachment<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        db: &str,
        record_id: &str,
        field_id_or_name: &str,
        data: &B,
    ) -> Result<T> {
        self.send(
            HttpMethod::Post,
            Endpoint::Upload,
            &[db, record_id, field_id_or_name, "uploadAttachment"],
            &QueryParams::new(),
            Some(data),
        )
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("upload_base_url", &self.upload_base_url)
            .field("limiter", &self.limiter)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Accept only absolute http/https URLs; strip any trailing slash.
fn validate_base_url(raw: &str) -> Result<String> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(invalid("scheme of http or https must be specified".to_string()))
        }
        Err(e) => return Err(invalid(format!("failed to parse base URL: {e}"))),
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("http or https base URL must be used".to_string()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
