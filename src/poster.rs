use std::io::Write;

use sonic_rs::Value;
use tracing::{debug, info, warn};

use crate::adapter::{Client, RestBytes, RestResult};
use crate::config::default_endpoint;
use crate::record::Record;

/// What came back from one post. The body stays raw until it is reported.
#[derive(Clone, Debug, PartialEq)]
pub struct PostOutcome {
    pub status: u16,
    pub is_error: bool,
    pub body: RestBytes,
}

impl PostOutcome {
    /// The body as JSON, or `None` for an error status, whose body is never read.
    pub fn decoded_body(&self) -> RestResult<Option<Value>> {
        if self.is_error {
            return Ok(None);
        }
        Ok(Some(sonic_rs::from_slice(&self.body)?))
    }

    /// Writes the status and the error flag, then decodes and writes the body.
    ///
    /// A body that fails to decode surfaces as an error after the first two
    /// lines are already out.
    pub fn write_report<W: Write>(&self, out: &mut W) -> RestResult<()> {
        writeln!(out, "{}", self.status)?;
        writeln!(out, "{}", self.is_error)?;
        out.flush()?;

        if let Some(body) = self.decoded_body()? {
            writeln!(out, "{}", sonic_rs::to_string(&body)?)?;
            out.flush()?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct RecordPoster {
    client: Client,
    endpoint: String,
}

impl RecordPoster {
    pub fn new() -> RestResult<Self> {
        Ok(Self::with_client(Client::new()?, default_endpoint()))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `record` once and classifies the status.
    pub async fn post(&self, record: &Record) -> RestResult<PostOutcome> {
        debug!(endpoint = %self.endpoint, "posting record");
        let response = self.client.post_json(&self.endpoint, record).await?;
        let status = response.status();
        let is_error = response.is_error();

        if is_error {
            warn!(status, "records endpoint returned an error status");
        } else {
            info!(status, elapsed = ?response.elapsed, "record posted");
        }

        Ok(PostOutcome {
            status,
            is_error,
            body: response.body,
        })
    }

    /// Posts the sample record and writes the report to `out`.
    pub async fn run<W: Write>(&self, out: &mut W) -> RestResult<PostOutcome> {
        let outcome = self.post(&Record::sample()).await?;
        outcome.write_report(out)?;
        Ok(outcome)
    }
}
