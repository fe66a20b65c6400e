//! Posts a fixed diary record to the local records API and reports the
//! outcome, over a small reqwest wrapper with an in-memory mock transport for
//! deterministic tests.

pub mod adapter;
pub mod config;
pub mod mock;
pub mod poster;
pub mod record;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest,
    RestResponse, RestResult, RestTransport, RestTransportState,
};
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot,
};
pub use poster::{PostOutcome, RecordPoster};
pub use record::Record;
