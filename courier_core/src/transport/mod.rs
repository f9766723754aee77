/**
 * Transport layer — HTTP delivery and the batching coordinator.
 *
 * Everything related to *how* events reach the collector:
 * - `http` — ureq-based HTTP client wrapper, one POST per batch
 * - `worker` — coordinator thread, flush triggers, drain protocol, requeue
 */

pub mod http;
pub mod worker;

pub use http::Transport;
pub use worker::Coordinator;
