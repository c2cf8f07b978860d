//! HTTP-backed reasoning service client.
//!
//! Posts JSON to a configured base URL (`/route`, `/purpose`, `/help`) and
//! retries transient failures with exponential backoff. Callers still wrap
//! these in their own timeout and fall back locally on error.

use crate::{HelpAssessment, HelpInterpreter, PlannedRoute, PurposeInterpreter, RoutePlanner, RouteRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use syncytium_data::CellId;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct RemoteReasoner {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PurposeRequest<'a> {
    purpose: &'a str,
}

#[derive(Deserialize)]
struct PurposeResponse {
    guidance: String,
}

#[derive(Serialize)]
struct HelpRequest<'a> {
    cell: &'a CellId,
    request: &'a str,
    neighbor_expertise: &'a [String],
}

impl RemoteReasoner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..MAX_RETRIES {
            let response = self
                .client
                .post(&url)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .json(body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if resp.status().is_success() {
                        return Ok(resp.json::<T>().await?);
                    }

                    let status = resp.status();
                    let is_transient = status.is_server_error() || status == 429;
                    if !is_transient || attempt == MAX_RETRIES - 1 {
                        return Err(anyhow::anyhow!("reasoning service returned {status}"));
                    }
                    last_error = Some(anyhow::anyhow!("reasoning service returned {status}"));
                }
                Err(e) => {
                    let is_transient = e.is_timeout() || e.is_connect();
                    if !is_transient || attempt == MAX_RETRIES - 1 {
                        return Err(anyhow::anyhow!("reasoning request failed: {e}"));
                    }
                    last_error = Some(anyhow::anyhow!("reasoning request failed: {e}"));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("reasoning request failed")))
    }
}

#[async_trait]
impl RoutePlanner for RemoteReasoner {
    async fn plan(&self, request: &RouteRequest) -> anyhow::Result<PlannedRoute> {
        self.post_json("route", request).await
    }
}

#[async_trait]
impl PurposeInterpreter for RemoteReasoner {
    async fn interpret(&self, purpose: &str) -> anyhow::Result<String> {
        let response: PurposeResponse = self.post_json("purpose", &PurposeRequest { purpose }).await?;
        Ok(response.guidance)
    }
}

#[async_trait]
impl HelpInterpreter for RemoteReasoner {
    async fn interpret(
        &self,
        cell: &CellId,
        request: &str,
        neighbor_expertise: &[String],
    ) -> anyhow::Result<HelpAssessment> {
        self.post_json(
            "help",
            &HelpRequest {
                cell,
                request,
                neighbor_expertise,
            },
        )
        .await
    }
}
