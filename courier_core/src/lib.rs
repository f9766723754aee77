/*!
 * Courier Core — the event-batching engine.
 *
 * Application code hands the client discrete telemetry events; a single
 * coordinator thread accumulates them and flushes bounded batches to a
 * remote collection endpoint, whichever comes first of "the batch filled
 * up" and "the flush timer elapsed". Failed batches are requeued once per
 * attempt; nothing is persisted across process restarts.
 *
 * End users should normally depend on the `courier` facade crate, which
 * re-exports this API together with the flags surface.
 *
 * # Module structure
 *
 * - `config` — configuration struct, defaults, validation
 * - `error` — construction-time error taxonomy
 * - `client` — public dispatcher surface: send, close, disabled fallback
 * - `registry` — configure-once process-wide instance
 * - `transport/` — HTTP delivery and the coordinator thread
 *
 * # Delivery guarantees
 *
 * Order is preserved within a batch; nothing is guaranteed across
 * batches. Delivery is best-effort: one attempt plus one requeue cycle
 * per flush, and events still being requeued when shutdown completes are
 * dropped. Runtime failures are reported through the `log` facade only.
 */

mod client;
mod config;
mod error;
mod registry;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::Client;
pub use config::{Config, MIN_BATCH_DELAY};
pub use error::Error;
pub use registry::Registry;
