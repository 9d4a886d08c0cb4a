use std::sync::Mutex;

use reqwest::Url;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::session::{
    CompletionHandler, HttpResponse, NetworkSession, NetworkTask, RawOutcome, TransportResponse,
};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// [`NetworkSession`] backed by `reqwest`, running requests on the tokio
/// runtime that was current when the session was built.
#[derive(Clone)]
pub struct ReqwestSession {
    client: reqwest::Client,
    runtime: Handle,
}

impl ReqwestSession {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        Self::with_client(config.build_client()?)
    }

    pub fn with_client(client: reqwest::Client) -> Result<Self, SessionError> {
        Ok(Self {
            client,
            runtime: Handle::try_current()?,
        })
    }
}

impl NetworkSession for ReqwestSession {
    fn data_task(&self, url: &Url, handler: CompletionHandler) -> Box<dyn NetworkTask> {
        Box::new(ReqwestTask {
            client: self.client.clone(),
            runtime: self.runtime.clone(),
            url: url.clone(),
            handler: Mutex::new(Some(handler)),
        })
    }
}

struct ReqwestTask {
    client: reqwest::Client,
    runtime: Handle,
    url: Url,
    handler: Mutex<Option<CompletionHandler>>,
}

impl NetworkTask for ReqwestTask {
    fn resume(&self) {
        let handler = match self.handler.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handler) = handler else {
            debug!(url = %self.url, "Task already resumed");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        self.runtime.spawn(async move {
            let outcome = perform(&client, url).await;
            handler(outcome);
        });
    }
}

async fn perform(client: &reqwest::Client, url: Url) -> RawOutcome {
    let started = std::time::Instant::now();
    let resp = match client.get(url.clone()).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(url = %url, error = %e, "GET failed before a response arrived");
            return RawOutcome::failure(e);
        }
    };

    let response = HttpResponse {
        url: resp.url().clone(),
        status: resp.status(),
        headers: resp.headers().clone(),
    };

    match resp.bytes().await {
        Ok(bytes) => {
            debug!(
                url = %url,
                status = %response.status,
                bytes = bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "GET finished"
            );
            RawOutcome::success(bytes, response)
        }
        Err(e) => {
            warn!(url = %url, status = %response.status, error = %e, "Reading body failed");
            RawOutcome::new(None, Some(TransportResponse::Http(response)), Some(e.into()))
        }
    }
}
