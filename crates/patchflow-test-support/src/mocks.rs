//! Fake collaborators: a scripted HTTP transport and a manual poll timer.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use patchflow_ui::core::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use patchflow_ui::features::lists::checker::{AutoCheckHandle, Sleeper};
use serde_json::Value;
use tokio::sync::oneshot;

enum Scripted {
    Respond(HttpResponse),
    Fail(TransportError),
    Held(HttpResponse, oneshot::Receiver<()>),
}

impl Scripted {
    fn repeatable(&self) -> Option<Self> {
        match self {
            Self::Respond(response) => Some(Self::Respond(response.clone())),
            Self::Fail(err) => Some(Self::Fail(err.clone())),
            Self::Held(..) => None,
        }
    }
}

/// A request observed by [`FakeTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    /// Action path.
    pub path: String,
    /// Request as sent.
    pub request: HttpRequest,
}

impl RecordedRequest {
    /// `request_data` of the body, or `Null`.
    #[must_use]
    pub fn request_data(&self) -> Value {
        self.request
            .body
            .as_ref()
            .and_then(|body| body.get("request_data"))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Releases a response scripted with [`FakeTransport::hold`].
#[derive(Debug)]
pub struct Release(oneshot::Sender<()>);

impl Release {
    /// Let the held response through.
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

/// Transport answering from per-path scripts.
///
/// Responses queue per path. The last queued response repeats for later requests;
/// a path with no script answers `404`.
#[derive(Default)]
pub struct FakeTransport {
    scripts: RefCell<BTreeMap<String, VecDeque<Scripted>>>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl FakeTransport {
    /// Empty transport.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.scripts
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Queue a JSON response for `path`.
    pub fn respond(&self, path: &str, status: u16, json: Value) -> &Self {
        self.push(path, Scripted::Respond(HttpResponse { status, json }));
        self
    }

    /// Queue a `200` JSON response for `path`.
    pub fn ok(&self, path: &str, json: Value) -> &Self {
        self.respond(path, 200, json)
    }

    /// Queue a connection failure for `path`.
    pub fn fail(&self, path: &str) -> &Self {
        self.push(
            path,
            Scripted::Fail(TransportError::Request {
                path: path.to_string(),
                message: "connection refused".to_string(),
            }),
        );
        self
    }

    /// Queue a `200` response for `path` that is only delivered once released.
    #[must_use]
    pub fn hold(&self, path: &str, json: Value) -> Release {
        let (sender, receiver) = oneshot::channel();
        self.push(
            path,
            Scripted::Held(HttpResponse { status: 200, json }, receiver),
        );
        Release(sender)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|recorded| recorded.path == path)
            .cloned()
            .collect()
    }

    fn next(&self, path: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.borrow_mut();
        let queue = scripts.get_mut(path)?;
        if queue.len() == 1
            && let Some(repeat) = queue.front().and_then(Scripted::repeatable)
        {
            return Some(repeat);
        }
        queue.pop_front()
    }
}

#[async_trait(?Send)]
impl HttpTransport for FakeTransport {
    async fn request(
        &self,
        path: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(RecordedRequest {
            path: path.to_string(),
            request,
        });
        match self.next(path) {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Held(response, gate)) => {
                let _ = gate.await;
                Ok(response)
            }
            None => Ok(HttpResponse {
                status: 404,
                json: Value::Null,
            }),
        }
    }
}

/// Poll timer that returns immediately and stops its poller after a fixed number of ticks.
#[derive(Debug, Default)]
pub struct TickSleeper {
    limit: u32,
    ticks: Cell<u32>,
    durations: RefCell<Vec<Duration>>,
    handle: RefCell<Option<AutoCheckHandle>>,
}

impl TickSleeper {
    /// Timer allowing `limit` checks before stopping the attached poller.
    #[must_use]
    pub fn new(limit: u32) -> Rc<Self> {
        Rc::new(Self {
            limit,
            ..Self::default()
        })
    }

    /// Poller to stop once the limit is exceeded.
    pub fn attach(&self, handle: AutoCheckHandle) {
        *self.handle.borrow_mut() = Some(handle);
    }

    /// Number of sleeps so far.
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks.get()
    }

    /// Requested sleep durations.
    #[must_use]
    pub fn durations(&self) -> Vec<Duration> {
        self.durations.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Sleeper for TickSleeper {
    async fn sleep(&self, duration: Duration) {
        let tick = self.ticks.get() + 1;
        self.ticks.set(tick);
        self.durations.borrow_mut().push(duration);
        if tick > self.limit
            && let Some(handle) = self.handle.borrow().as_ref()
        {
            handle.stop();
        }
    }
}
