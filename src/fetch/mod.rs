mod basic;
mod client;
mod session;
pub mod stub;

pub use basic::ReqwestSession;
pub use client::{Completion, HttpClient, HttpClientExt, HttpResult};
pub use session::{
    CompletionHandler, HttpResponse, NetworkSession, NetworkTask, RawOutcome, TransportResponse,
};

use reqwest::Url;
use tracing::debug;

use crate::error::ClientError;

/// Collapses a raw transport outcome into a two-case result.
///
/// A reported error always wins, even when a payload and response came with
/// it. Without an error, both a payload and an HTTP response are required.
pub fn normalize(outcome: RawOutcome) -> HttpResult {
    match outcome {
        RawOutcome {
            error: Some(err), ..
        } => Err(ClientError::Transport(err)),
        RawOutcome {
            data: Some(data),
            response: Some(TransportResponse::Http(response)),
            error: None,
        } => Ok((data, response)),
        _ => Err(ClientError::UnexpectedArguments),
    }
}

/// [`HttpClient`] on top of any [`NetworkSession`].
pub struct UrlHttpClient<S> {
    session: S,
}

impl<S: NetworkSession> UrlHttpClient<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: NetworkSession> HttpClient for UrlHttpClient<S> {
    fn get(&self, url: &Url, completion: Completion<HttpResult>) {
        let task = self.session.data_task(
            url,
            Box::new(move |outcome| completion(normalize(outcome))),
        );
        debug!(url = %url, "Resuming GET task");
        task.resume();
    }
}

#[cfg(test)]
mod tests {
    use super::stub::{ManualSession, StubSession};
    use super::*;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("some error")]
    struct SomeError;

    fn url() -> Url {
        "http://example.com/".parse().unwrap()
    }

    fn ok_response() -> HttpResponse {
        HttpResponse::new(url(), StatusCode::OK)
    }

    /// Runs one GET against a stub scripted with `outcome` and returns every
    /// result the completion saw.
    fn get_once(outcome: RawOutcome) -> (Vec<HttpResult>, Arc<StubSession>) {
        let session = Arc::new(StubSession::new([outcome]));
        let sut = UrlHttpClient::new(session.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        sut.get(&url(), Box::new(move |r| sink.lock().unwrap().push(r)));

        let results = std::mem::take(&mut *seen.lock().unwrap());
        (results, session)
    }

    #[test]
    fn test_get_returns_error_when_only_error_present() {
        let (results, session) = get_once(RawOutcome::failure(SomeError));

        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert_eq!(err.transport_error::<SomeError>(), Some(&SomeError));
        assert_eq!(session.resume_count(), 1);
    }

    #[test]
    fn test_get_returns_data_and_response_when_no_error() {
        let body = Bytes::from_static(b"hello");
        let (results, session) = get_once(RawOutcome::success(body.clone(), ok_response()));

        assert_eq!(results.len(), 1);
        let (data, response) = results[0].as_ref().unwrap();
        assert_eq!(data, &body);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(session.resume_count(), 1);
    }

    #[test]
    fn test_get_returns_unexpected_arguments_when_everything_missing() {
        let (results, _) = get_once(RawOutcome::default());

        assert!(matches!(
            results.as_slice(),
            [Err(ClientError::UnexpectedArguments)]
        ));
    }

    #[test]
    fn test_error_takes_precedence_over_partial_payload() {
        let outcome = RawOutcome::new(Some(Bytes::from_static(b"x")), None, Some(SomeError.into()));
        let (results, _) = get_once(outcome);

        assert_eq!(results.len(), 1);
        assert!(results[0].as_ref().unwrap_err().transport_error::<SomeError>().is_some());
    }

    #[test]
    fn test_error_takes_precedence_over_complete_pair() {
        let outcome = RawOutcome::new(
            Some(Bytes::from_static(b"x")),
            Some(ok_response().into()),
            Some(SomeError.into()),
        );

        let err = normalize(outcome).unwrap_err();
        assert_eq!(err.transport_error::<SomeError>(), Some(&SomeError));
    }

    #[test]
    fn test_missing_response_is_unexpected() {
        let outcome = RawOutcome::new(Some(Bytes::from_static(b"x")), None, None);
        assert!(matches!(
            normalize(outcome),
            Err(ClientError::UnexpectedArguments)
        ));
    }

    #[test]
    fn test_missing_payload_is_unexpected() {
        let outcome = RawOutcome::new(None, Some(ok_response().into()), None);
        assert!(matches!(
            normalize(outcome),
            Err(ClientError::UnexpectedArguments)
        ));
    }

    #[test]
    fn test_non_http_response_is_unexpected() {
        let outcome = RawOutcome::new(
            Some(Bytes::from_static(b"x")),
            Some(TransportResponse::Other { url: url() }),
            None,
        );
        assert!(matches!(
            normalize(outcome),
            Err(ClientError::UnexpectedArguments)
        ));
    }

    #[test]
    fn test_body_read_failure_keeps_transport_error() {
        let outcome = RawOutcome::new(None, Some(ok_response().into()), Some(SomeError.into()));

        let err = normalize(outcome).unwrap_err();
        assert_eq!(err.transport_error::<SomeError>(), Some(&SomeError));
    }

    #[test]
    fn test_normalize_every_combination() {
        #[derive(Clone, Copy, Debug)]
        enum Kind {
            Missing,
            Http,
            Other,
        }

        for has_data in [false, true] {
            for kind in [Kind::Missing, Kind::Http, Kind::Other] {
                for has_error in [false, true] {
                    let data = has_data.then(|| Bytes::from_static(b"payload"));
                    let response = match kind {
                        Kind::Missing => None,
                        Kind::Http => Some(ok_response().into()),
                        Kind::Other => Some(TransportResponse::Other { url: url() }),
                    };
                    let error = has_error.then(|| SomeError.into());
                    let case = format!("data={has_data} response={kind:?} error={has_error}");

                    match normalize(RawOutcome::new(data, response, error)) {
                        Err(err) if has_error => {
                            assert_eq!(err.transport_error::<SomeError>(), Some(&SomeError), "{case}")
                        }
                        Ok((data, response)) if has_data && matches!(kind, Kind::Http) => {
                            assert!(!has_error, "{case}");
                            assert_eq!(data, Bytes::from_static(b"payload"), "{case}");
                            assert_eq!(response.status, StatusCode::OK, "{case}");
                        }
                        Err(ClientError::UnexpectedArguments)
                            if !has_error && !(has_data && matches!(kind, Kind::Http)) => {}
                        other => panic!("{case}: unexpected {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_error_status_is_still_success() {
        let response = HttpResponse::new(url(), StatusCode::NOT_FOUND);
        let (_, response) = normalize(RawOutcome::success(Bytes::new(), response)).unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_get_resumes_before_returning_even_without_completion() {
        let session = Arc::new(ManualSession::new());
        let sut = UrlHttpClient::new(session.clone());
        let called = Arc::new(Mutex::new(false));

        let flag = called.clone();
        sut.get(&url(), Box::new(move |_| *flag.lock().unwrap() = true));

        assert_eq!(session.resume_count(), 1);
        assert_eq!(session.pending(), 1);
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn test_concurrent_gets_do_not_share_results() {
        let session = Arc::new(ManualSession::new());
        let sut = UrlHttpClient::new(session.clone());
        let (tx, rx) = mpsc::channel();

        for tag in ["first", "second"] {
            let tx = tx.clone();
            sut.get(&url(), Box::new(move |r| tx.send((tag, r)).unwrap()));
        }

        assert!(session.complete(1, RawOutcome::failure(SomeError)));
        assert!(session.complete(
            0,
            RawOutcome::success(Bytes::from_static(b"one"), ok_response())
        ));

        let (tag, result) = rx.recv().unwrap();
        assert_eq!(tag, "second");
        assert!(result.unwrap_err().transport_error::<SomeError>().is_some());

        let (tag, result) = rx.recv().unwrap();
        assert_eq!(tag, "first");
        assert_eq!(result.unwrap().0, Bytes::from_static(b"one"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_completion_runs_on_transport_thread() {
        let session = Arc::new(ManualSession::new());
        let sut = UrlHttpClient::new(session.clone());
        let (tx, rx) = mpsc::channel();

        sut.get(
            &url(),
            Box::new(move |_| tx.send(std::thread::current().id()).unwrap()),
        );

        let worker = std::thread::spawn(move || {
            session.complete(0, RawOutcome::default());
            std::thread::current().id()
        });
        let worker_id = worker.join().unwrap();

        assert_eq!(rx.recv().unwrap(), worker_id);
        assert_ne!(worker_id, std::thread::current().id());
    }

    #[tokio::test]
    async fn test_fetch_awaits_the_normalized_result() {
        let session = StubSession::new([RawOutcome::success(
            Bytes::from_static(b"async"),
            ok_response(),
        )]);
        let sut = UrlHttpClient::new(session);

        let (data, response) = sut.fetch(&url()).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"async"));
        assert_eq!(response.status, StatusCode::OK);
    }

    struct DroppingSession;
    struct DroppingTask;

    impl NetworkTask for DroppingTask {
        fn resume(&self) {}
    }

    impl NetworkSession for DroppingSession {
        fn data_task(&self, _url: &Url, _handler: CompletionHandler) -> Box<dyn NetworkTask> {
            Box::new(DroppingTask)
        }
    }

    #[tokio::test]
    async fn test_fetch_reports_dropped_handler() {
        let sut = UrlHttpClient::new(DroppingSession);

        let result = sut.fetch(&url()).await;
        assert!(matches!(result, Err(ClientError::Dropped)));
    }
}
