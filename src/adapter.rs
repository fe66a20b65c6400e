use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use sonic_rs::to_vec;
use thiserror::Error;

pub type RestBytes = Bytes;
pub type RestFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type RestResult<T> = Result<T, RestError>;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Transport state exposed by the mock; the reqwest transport does not track it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestTransportState {
    Idle,
    Busy,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestErrorKind {
    Connect,
    Send,
    Receive,
    Timeout,
    Parse,
    Internal,
}

#[derive(Clone, Debug, Error)]
#[error("rest error {kind:?} status={status:?} {message}")]
pub struct RestError {
    pub kind: RestErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl RestError {
    pub fn new(kind: RestErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::new(RestErrorKind::Connect, status, message)
    }

    pub fn send(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::new(RestErrorKind::Send, status, message)
    }

    pub fn receive(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::new(RestErrorKind::Receive, status, message)
    }

    pub fn timeout(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::new(RestErrorKind::Timeout, status, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RestErrorKind::Internal, None, message)
    }

    pub fn kind(&self) -> RestErrorKind {
        self.kind
    }

    /// `fallback` is used for failures reqwest cannot classify further.
    fn from_reqwest(fallback: RestErrorKind, err: reqwest::Error) -> Self {
        let kind = if err.is_connect() {
            RestErrorKind::Connect
        } else if err.is_timeout() {
            RestErrorKind::Timeout
        } else {
            fallback
        };
        Self::new(kind, err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl From<sonic_rs::Error> for RestError {
    fn from(err: sonic_rs::Error) -> Self {
        Self::new(RestErrorKind::Parse, None, err.to_string())
    }
}

impl From<std::io::Error> for RestError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("io: {err}"))
    }
}

#[derive(Clone, Debug)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, RestBytes)>,
    pub body: Option<RestBytes>,
}

impl RestRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<RestBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<RestBytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_ref())
    }
}

#[derive(Clone, Debug)]
pub struct RestResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
    pub elapsed: Duration,
}

impl RestResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Client or server error: 4xx or 5xx. Codes of 600 and above are not errors.
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.status)
    }
}

pub trait RestTransport: Send + Sync {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>>;
}

pub type SharedRestTransport = dyn RestTransport + Send + Sync;

#[derive(Clone)]
pub struct Client {
    transport: Arc<SharedRestTransport>,
}

impl Client {
    pub fn new() -> RestResult<Self> {
        Ok(Self::with_transport(ReqwestTransport::new()?))
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: RestTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub async fn execute(&self, request: RestRequest) -> RestResult<RestResponse> {
        self.transport.execute(request).await
    }

    pub async fn post_json<T: Serialize>(
        &self,
        url: impl Into<String>,
        payload: &T,
    ) -> RestResult<RestResponse> {
        let body = to_vec(payload)?;
        let request = RestRequest::post(url)
            .with_header(CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE)
            .with_body(body);
        self.execute(request).await
    }
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Redirects are returned to the caller as-is; a 3xx is never followed
    /// with a second request.
    pub fn new() -> RestResult<Self> {
        let client = ReqwestClient::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|err| RestError::internal(format!("building http client: {err}")))?;
        Ok(Self { client })
    }
}

impl RestTransport for ReqwestTransport {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut req = client.request(request.method.clone(), &request.url);

            for (key, value) in request.headers {
                let value = HeaderValue::from_bytes(value.as_ref())
                    .map_err(|err| RestError::internal(err.to_string()))?;
                req = req.header(key, value);
            }

            if let Some(body) = request.body {
                req = req.body(body);
            }

            let resp = req
                .send()
                .await
                .map_err(|err| RestError::from_reqwest(RestErrorKind::Send, err))?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_ref())))
                .collect();
            let body = resp
                .bytes()
                .await
                .map_err(|err| RestError::from_reqwest(RestErrorKind::Receive, err))?;

            Ok(RestResponse {
                status,
                headers,
                body,
                elapsed: start.elapsed(),
            })
        })
    }
}
