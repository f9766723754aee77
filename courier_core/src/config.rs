/*!
 * Dispatcher configuration.
 *
 * `Config` is read-only after construction — it is validated once by
 * `Client::new` and then shared with the coordinator and the transport
 * without further synchronization.
 */

use std::time::Duration;

use crate::error::Error;

/// Smallest accepted `max_batch_delay`.
pub const MIN_BATCH_DELAY: Duration = Duration::from_secs(1);

/**
 * Configuration for a courier client.
 *
 * `Default` supplies the stock batching parameters (100 events / 60 s) with
 * empty endpoint and token — useful as a base for the flags surface, but
 * invalid until both are filled in.
 */
#[derive(Debug, Clone)]
pub struct Config {
    /// Collector URL that batches are POSTed to.
    pub endpoint: String,

    /// Access token, attached to every delivery as the `X-Collector-Token`
    /// header.
    pub token: String,

    /// Maximum number of events per batch. Must be at least 1.
    pub max_batch_size: usize,

    /// Maximum time a partial batch may wait before it is flushed.
    /// Must be at least `MIN_BATCH_DELAY`.
    pub max_batch_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            max_batch_size: 100,
            max_batch_delay: Duration::from_secs(60),
        }
    }
}

impl Config {
    /**
     * Checks every field, returning the first violation.
     *
     * Whitespace-only endpoint or token counts as missing.
     */
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::MissingEndpoint);
        }
        if self.token.trim().is_empty() {
            return Err(Error::MissingToken);
        }
        if self.max_batch_size < 1 {
            return Err(Error::BatchSizeTooSmall);
        }
        if self.max_batch_delay < MIN_BATCH_DELAY {
            return Err(Error::BatchDelayTooShort);
        }
        Ok(())
    }
}
