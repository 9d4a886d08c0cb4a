//! The transport seam: sessions hand out tasks, tasks report a raw outcome.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};

use crate::error::BoxError;

/// Status-bearing response metadata of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl HttpResponse {
    pub fn new(url: Url, status: StatusCode) -> Self {
        Self {
            url,
            status,
            headers: HeaderMap::new(),
        }
    }
}

/// Response object handed over by a transport.
///
/// Only [`TransportResponse::Http`] carries a status code; anything else is
/// treated as a mismatched response by the HTTP client.
#[derive(Debug, Clone)]
pub enum TransportResponse {
    Http(HttpResponse),
    Other { url: Url },
}

impl TransportResponse {
    pub fn as_http(&self) -> Option<&HttpResponse> {
        match self {
            TransportResponse::Http(resp) => Some(resp),
            TransportResponse::Other { .. } => None,
        }
    }
}

impl From<HttpResponse> for TransportResponse {
    fn from(resp: HttpResponse) -> Self {
        TransportResponse::Http(resp)
    }
}

/// Everything a transport reports when a task finishes. Any combination of
/// the three fields may be present.
#[derive(Debug, Default)]
pub struct RawOutcome {
    pub data: Option<Bytes>,
    pub response: Option<TransportResponse>,
    pub error: Option<BoxError>,
}

impl RawOutcome {
    pub fn new(
        data: Option<Bytes>,
        response: Option<TransportResponse>,
        error: Option<BoxError>,
    ) -> Self {
        Self {
            data,
            response,
            error,
        }
    }

    /// A clean payload/response pair.
    pub fn success(data: impl Into<Bytes>, response: HttpResponse) -> Self {
        Self::new(Some(data.into()), Some(response.into()), None)
    }

    /// An error with no payload and no response.
    pub fn failure(error: impl Into<BoxError>) -> Self {
        Self::new(None, None, Some(error.into()))
    }
}

/// Called once by the transport with the raw outcome of a task.
pub type CompletionHandler = Box<dyn FnOnce(RawOutcome) + Send + 'static>;

/// A unit of transport work that does nothing until resumed.
pub trait NetworkTask: Send {
    /// Starts the task. Resuming an already started task has no effect.
    fn resume(&self);
}

/// Factory for [`NetworkTask`]s.
pub trait NetworkSession: Send + Sync {
    /// Prepares a GET of `url`. `handler` must be invoked exactly once after
    /// the returned task is resumed, and never before.
    fn data_task(&self, url: &Url, handler: CompletionHandler) -> Box<dyn NetworkTask>;
}

impl<S: NetworkSession + ?Sized> NetworkSession for std::sync::Arc<S> {
    fn data_task(&self, url: &Url, handler: CompletionHandler) -> Box<dyn NetworkTask> {
        (**self).data_task(url, handler)
    }
}
