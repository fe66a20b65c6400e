//! In-memory transport for tests. Not meant for production use: it panics if
//! its state mutex is poisoned.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;

use super::adapter::{
    RestBytes, RestError, RestFuture, RestRequest, RestResponse, RestResult, RestTransport,
    RestTransportState,
};

/// How the mock treats the next request. Anything but `Pass` fails the
/// request before a response is picked.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    ConnectError(String),
    SendError(String),
    ReceiveError(String),
    TimeoutError(String),
}

impl MockBehavior {
    fn into_error(self) -> Option<RestError> {
        match self {
            Self::Pass => None,
            Self::ConnectError(reason) => Some(RestError::connect(reason, None)),
            Self::SendError(reason) => Some(RestError::send(reason, None)),
            Self::ReceiveError(reason) => Some(RestError::receive(reason, None)),
            Self::TimeoutError(reason) => Some(RestError::timeout(reason, None)),
        }
    }
}

/// Behaviors consumed one per request, in order. An exhausted plan passes.
#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    fn take_next(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::new(status, Bytes::new())
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> RestResult<Self> {
        Ok(Self::new(status, sonic_rs::to_vec(payload)?))
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub state: RestTransportState,
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct MockState {
    state: RestTransportState,
    last_status: Option<u16>,
    last_error: Option<String>,
    plan: MockBehaviorPlan,
    fallback: VecDeque<MockResponse>,
    routes: HashMap<(Method, String), VecDeque<MockResponse>>,
    requests: Vec<RestRequest>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            state: RestTransportState::Idle,
            last_status: None,
            last_error: None,
            plan: MockBehaviorPlan::default(),
            fallback: VecDeque::new(),
            routes: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

impl MockState {
    /// Route queue first, then the shared queue, then an empty 200.
    fn next_response(&mut self, request: &RestRequest) -> MockResponse {
        let key = (request.method.clone(), request.url.clone());
        self.routes
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.fallback.pop_front())
            .unwrap_or_else(|| MockResponse::empty(200))
    }
}

/// Test double for [`RestTransport`]: records every request and answers from
/// queued responses.
#[derive(Clone, Debug, Default)]
pub struct MockRestAdapter {
    inner: Arc<Mutex<MockState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior_plan(plan: MockBehaviorPlan) -> Self {
        let state = MockState {
            plan,
            ..MockState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().expect("mock transport mutex poisoned")
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        let state = self.lock();
        MockRestStateSnapshot {
            state: state.state,
            request_count: state.requests.len(),
            last_url: state.requests.last().map(|request| request.url.clone()),
            last_status: state.last_status,
            last_error: state.last_error.clone(),
        }
    }

    /// Answers any request that has no route-specific response queued.
    pub fn queue_response(&self, response: MockResponse) {
        self.lock().fallback.push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.lock()
            .routes
            .entry((Method::POST, url.into()))
            .or_default()
            .push_back(response);
    }

    /// Every request seen so far, oldest first.
    pub fn outbound_requests(&self) -> Vec<RestRequest> {
        self.lock().requests.clone()
    }
}

impl RestTransport for MockRestAdapter {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut state = adapter.lock();
            state.requests.push(request.clone());
            state.state = RestTransportState::Busy;
            state.last_error = None;

            if let Some(error) = state.plan.take_next().into_error() {
                state.state = RestTransportState::Error;
                state.last_error = Some(error.message.clone());
                state.last_status = error.status;
                return Err(error);
            }

            let response = state.next_response(&request);
            state.last_status = Some(response.status);
            state.state = RestTransportState::Idle;
            Ok(RestResponse {
                status: response.status,
                headers: Vec::new(),
                body: response.body,
                elapsed: start.elapsed(),
            })
        })
    }
}
