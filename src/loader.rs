//! Loads a URL through an [`HttpClient`] and decodes the payload.
//!
//! The loader has no error channel: transport failures and undecodable
//! payloads are logged and the caller's callback is never invoked.

use std::sync::Arc;

use image::DynamicImage;
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::fetch::HttpClient;

/// Turns a downloaded payload into a typed value.
pub trait PayloadDecoder: Send + Sync + 'static {
    type Output: Send + 'static;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError>;
}

/// Decodes any format the `image` crate recognizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl PayloadDecoder for ImageDecoder {
    type Output = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        Ok(image::load_from_memory(bytes)?)
    }
}

pub struct PayloadLoader<C, D> {
    client: C,
    decoder: Arc<D>,
}

pub type ImageLoader<C> = PayloadLoader<C, ImageDecoder>;

impl<C: HttpClient> PayloadLoader<C, ImageDecoder> {
    pub fn new(client: C) -> Self {
        Self::with_decoder(client, ImageDecoder)
    }
}

impl<C: HttpClient, D: PayloadDecoder> PayloadLoader<C, D> {
    pub fn with_decoder(client: C, decoder: D) -> Self {
        Self {
            client,
            decoder: Arc::new(decoder),
        }
    }

    /// Fetches `url` and calls `on_ready` with the decoded value.
    ///
    /// `on_ready` is called at most once, and only when both the request and
    /// decoding succeed.
    pub fn load<F>(&self, url: &Url, on_ready: F)
    where
        F: FnOnce(D::Output) + Send + 'static,
    {
        let decoder = self.decoder.clone();
        let target = url.clone();
        self.client.get(
            url,
            Box::new(move |result| match result {
                Ok((payload, response)) => match decoder.decode(&payload) {
                    Ok(value) => {
                        debug!(url = %target, bytes = payload.len(), "Payload decoded");
                        on_ready(value);
                    }
                    Err(e) => {
                        warn!(url = %target, status = %response.status, error = %e, "Dropping undecodable payload");
                    }
                },
                Err(e) => {
                    warn!(url = %target, error = %e, "Dropping failed load");
                }
            }),
        );
    }
}
