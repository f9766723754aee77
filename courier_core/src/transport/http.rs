/*!
 * HTTP transport layer for delivering event batches to the collector.
 *
 * Uses `ureq` — a pure-Rust blocking HTTP client with no async runtime.
 * Every delivery runs on a dedicated background thread, so blocking I/O
 * is fine here.
 *
 * Contract with the coordinator:
 * - **Single attempt** — exactly one POST per flush. Retry is the
 *   coordinator's business (it requeues the batch).
 * - **Explicit status check** — the agent is configured so that non-2xx
 *   responses come back as `Ok(response)`; `post` turns them into
 *   `DeliveryError::Status` so the caller can tell "collector said no"
 *   apart from "never reached the collector".
 */

use std::time::Duration;

use thiserror::Error;
use ureq::Agent;

use crate::config::Config;

/**
 * Why a batch delivery failed. Both variants are handled the same way by
 * the coordinator (log + requeue); the split exists for the logs.
 */
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The collector answered with a non-2xx status.
    #[error("collector responded with HTTP {0}")]
    Status(u16),

    /// The request never completed (connect failure, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),
}

/**
 * Thin wrapper around a shared `ureq::Agent` that posts serialized batches
 * to the configured collector endpoint.
 *
 * One `Transport` is created per `Client` and shared (via `Arc`) by all
 * concurrently running delivery threads.
 */
pub struct Transport {
    agent: Agent,
    endpoint: String,
    token: String,
}

impl Transport {
    /**
     * Creates a `Transport` for the configured endpoint.
     *
     * Timeouts:
     * - 10 s connect
     * - 30 s total per request
     *
     * Connection pooling and keep-alive are handled by the agent internally.
     */
    pub fn new(config: &Config) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(10)))
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        }
    }

    /**
     * POSTs one serialized batch (a JSON array of events) to the collector.
     *
     * The access token travels in the `X-Collector-Token` header. Any 2xx
     * response counts as delivered; everything else is a `DeliveryError`.
     */
    pub fn post(&self, payload: &[u8]) -> Result<(), DeliveryError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("X-Collector-Token", self.token.as_str())
            .send(payload)?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(DeliveryError::Status(status))
        }
    }
}
