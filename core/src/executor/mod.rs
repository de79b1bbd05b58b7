//! Federated query execution: one query, one or many endpoints,
//! merged and deduplicated bindings.
//!
//! Failure policy: a single endpoint failing never fails the federation;
//! its contribution is dropped and logged. When every endpoint fails,
//! the result is an empty set, never an error surfaced to the caller.

pub mod results;

pub use results::ResultSet;

use crate::config::Endpoint;
use crate::errors::{FederationError, Result};
use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Hard per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Attempts on the single-endpoint path (initial try + one retry).
const SINGLE_ENDPOINT_ATTEMPTS: u32 = 2;

/// Pause before a retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Dispatches SPARQL queries over HTTP POST and assembles tabular
/// results. "Federated" is a configuration mode, not a separate code
/// path: one endpoint means a single dispatch, several mean a
/// concurrent fan-out.
#[derive(Debug, Clone)]
pub struct FederatedExecutor {
    client: Client,
    endpoints: Vec<Endpoint>,
}

impl FederatedExecutor {
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sematheque-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Run a query against one endpoint, or against every configured
    /// endpoint when none is given. Never fails: unrecoverable errors
    /// yield an empty result set.
    pub async fn execute(&self, query: &str, endpoint: Option<&Endpoint>) -> ResultSet {
        match endpoint {
            Some(ep) => self.execute_single(query, ep).await,
            None => self.execute_federated(query).await,
        }
    }

    /// Concurrent fan-out to all configured endpoints; each endpoint's
    /// result is collected independently, then unioned and deduplicated.
    async fn execute_federated(&self, query: &str) -> ResultSet {
        if self.endpoints.is_empty() {
            debug!("No endpoint configured, returning empty result");
            return ResultSet::empty();
        }

        let futures = self
            .endpoints
            .iter()
            .map(|ep| async move { (ep, self.query_endpoint(query, ep).await) });

        let mut merged = ResultSet::empty();
        let mut successes = 0usize;
        for (endpoint, outcome) in join_all(futures).await {
            match outcome {
                Ok(set) => {
                    debug!(endpoint = %endpoint.name, rows = set.len(), "Endpoint answered");
                    merged.merge(set);
                    successes += 1;
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.name, "Endpoint dropped from federation: {}", e);
                }
            }
        }

        if successes == 0 {
            warn!("All {} endpoints failed for query", self.endpoints.len());
            return ResultSet::empty();
        }

        merged.dedup_rows();
        merged
    }

    /// Single-endpoint path with a bounded retry. Rejected queries and
    /// malformed responses indicate a builder defect and fail fast.
    async fn execute_single(&self, query: &str, endpoint: &Endpoint) -> ResultSet {
        for attempt in 1..=SINGLE_ENDPOINT_ATTEMPTS {
            match self.query_endpoint(query, endpoint).await {
                Ok(mut set) => {
                    set.dedup_rows();
                    return set;
                }
                Err(e) if e.is_retryable() && attempt < SINGLE_ENDPOINT_ATTEMPTS => {
                    warn!(
                        endpoint = %endpoint.name,
                        attempt,
                        "Transient failure, retrying: {}",
                        e
                    );
                    sleep(RETRY_BACKOFF).await;
                }
                Err(e @ FederationError::QueryRejected(..))
                | Err(e @ FederationError::InvalidResponse(..)) => {
                    error!(endpoint = %endpoint.name, "Query defect, not retrying: {}", e);
                    return ResultSet::empty();
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.name, "Query failed: {}", e);
                    return ResultSet::empty();
                }
            }
        }
        ResultSet::empty()
    }

    /// One POST to one endpoint, SPARQL 1.1 protocol, JSON results.
    async fn query_endpoint(&self, query: &str, endpoint: &Endpoint) -> Result<ResultSet> {
        let response = self
            .client
            .post(&endpoint.url)
            .header(ACCEPT, "application/sparql-results+json")
            .form(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(FederationError::QueryRejected(
                endpoint.url.clone(),
                truncate(&body, 200),
            ));
        }
        if !status.is_success() {
            return Err(FederationError::EndpointStatus {
                endpoint: endpoint.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        ResultSet::from_sparql_json(&endpoint.url, &body)
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}
