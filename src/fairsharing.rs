use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::MetricJsonPath;
use crate::domain::{MetricName, MetricRecordId};
use crate::error::{HarvestError, LookupError};
use crate::fetch::build_client;
use crate::record::record_endpoint;

pub trait MetricClient {
    /// Fetches the raw JSON record. Non-200 responses are reported as
    /// [`LookupError::HttpStatus`], never as transport failures.
    fn fetch_record(&self, id: &MetricRecordId) -> Result<Value, LookupError>;
}

#[derive(Clone)]
pub struct FairsharingHttpClient {
    client: Client,
    base: String,
}

impl FairsharingHttpClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_client(timeout)?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn record_url(&self, id: &MetricRecordId) -> String {
        record_endpoint(&self.base, id)
    }
}

impl MetricClient for FairsharingHttpClient {
    fn fetch_record(&self, id: &MetricRecordId) -> Result<Value, LookupError> {
        let url = self.record_url(id);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| LookupError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(LookupError::HttpStatus(status));
        }
        response
            .json::<Value>()
            .map_err(|err| LookupError::Transport(err.to_string()))
    }
}

/// Resolves the configured field of a metric record to display text.
pub fn lookup<M: MetricClient + ?Sized>(
    client: &M,
    id: &MetricRecordId,
    path: &MetricJsonPath,
) -> MetricName {
    let result = client.fetch_record(id).and_then(|record| {
        get_nested_value(&record, path)
            .map(value_to_text)
            .ok_or(LookupError::PathMissing)
    });
    if let Err(err) = &result {
        tracing::warn!(record = %id, path = %path.as_dotted(), "metric lookup failed: {err}");
    }
    MetricName::from(result)
}

/// Walks nested objects by key. A missing key, a non-object along the way, or
/// a JSON `null` leaf all yield `None`.
pub fn get_nested_value<'a>(value: &'a Value, path: &MetricJsonPath) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
