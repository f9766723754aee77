/*!
 * Error taxonomy for the courier SDK.
 *
 * Every variant is a construction-time failure: configuration is rejected
 * before the coordinator thread starts, and registry setup is rejected
 * before it can disturb an existing instance. Runtime delivery failures
 * never surface here — they are logged and the affected batch is requeued
 * (see `transport::worker`).
 */

use thiserror::Error;

/**
 * Errors returned by `Client::new` and `Registry::setup`.
 *
 * Each invalid configuration field maps to its own variant so callers can
 * tell exactly which check failed.
 */
#[derive(Debug, Error)]
pub enum Error {
    /// The collector endpoint URL is empty (or whitespace-only).
    #[error("no collector endpoint configured")]
    MissingEndpoint,

    /// The collector access token is empty (or whitespace-only).
    #[error("no collector token configured")]
    MissingToken,

    /// `max_batch_size` must allow at least one event per batch.
    #[error("max_batch_size must be 1 or larger")]
    BatchSizeTooSmall,

    /// `max_batch_delay` must be at least one second.
    #[error("max_batch_delay must be 1 second or longer")]
    BatchDelayTooShort,

    /// `Registry::setup` was called more than once for the same registry.
    #[error("registry is already configured")]
    AlreadyConfigured,

    /// The coordinator thread could not be spawned.
    #[error("failed to spawn coordinator thread: {0}")]
    Spawn(String),
}
