//! Scripted transport for tests.
//!
//! Queue responses before running the code under test; each `send()`
//! consumes one entry and records the request it was given.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::{Error, Result};

enum Scripted {
    Response(HttpResponse),
    Failure(String),
}

/// Mock implementation of [`HttpTransport`].
///
/// An unscripted `send()` fails with `Error::Request`, which makes an
/// unexpected network call visible in assertions.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to keep a request in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response.
    pub fn push_response(&self, response: HttpResponse) -> &Self {
        self.lock_script().push_back(Scripted::Response(response));
        self
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.push_response(HttpResponse::json_body(status, &body))
    }

    /// Queue a network-level failure.
    pub fn push_failure(&self, message: &str) -> &Self {
        self.lock_script()
            .push_back(Scripted::Failure(message.to_string()));
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Number of scripted entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_script().len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self.lock_script().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure(message)) => Err(Error::Request(message)),
            None => Err(Error::Request(
                "no scripted response in MockTransport".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_are_consumed_in_order() {
        let mock = MockTransport::new();
        mock.push_response(HttpResponse::new(200, "first"))
            .push_response(HttpResponse::new(500, "second"));

        let a = mock.send(HttpRequest::get("https://a")).await.unwrap();
        let b = mock.send(HttpRequest::get("https://b")).await.unwrap();

        assert_eq!(a.text(), "first");
        assert_eq!(b.status, 500);
        assert_eq!(mock.remaining(), 0);
        let urls: Vec<_> = mock.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://a", "https://b"]);
    }

    #[tokio::test]
    async fn unscripted_send_fails() {
        let mock = MockTransport::new();
        let result = mock.send(HttpRequest::head("https://a")).await;
        assert!(matches!(result, Err(Error::Request(_))));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn scripted_failure_is_request_error() {
        let mock = MockTransport::new();
        mock.push_failure("connection reset");
        let err = mock.send(HttpRequest::head("https://a")).await.unwrap_err();
        assert_eq!(err.to_string(), "request failed: connection reset");
    }
}
