use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use tokio::sync::oneshot;

use super::session::HttpResponse;
use crate::error::ClientError;

/// Normalized outcome of a single GET.
pub type HttpResult = Result<(Bytes, HttpResponse), ClientError>;

/// Callback receiving a value exactly once.
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

pub trait HttpClient: Send + Sync {
    /// Issues a GET of `url` and calls `completion` exactly once with the
    /// normalized result, on whatever thread the transport finishes on.
    fn get(&self, url: &Url, completion: Completion<HttpResult>);
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn get(&self, url: &Url, completion: Completion<HttpResult>) {
        (**self).get(url, completion)
    }
}

/// Awaitable form of [`HttpClient::get`].
#[async_trait]
pub trait HttpClientExt {
    async fn fetch(&self, url: &Url) -> HttpResult;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClientExt for C {
    #[tracing::instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> HttpResult {
        let (tx, rx) = oneshot::channel();
        self.get(
            url,
            Box::new(move |result| {
                // The receiver may have been dropped by a caller that gave up.
                let _ = tx.send(result);
            }),
        );
        rx.await.unwrap_or(Err(ClientError::Dropped))
    }
}
