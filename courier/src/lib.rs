/*!
 * Courier — batched telemetry event delivery.
 *
 * This is the crate applications should depend on. It re-exports the core
 * engine and the command-line configuration surface.
 *
 * # Quick start
 *
 * ```ignore
 * use std::time::Duration;
 * use serde::Serialize;
 *
 * #[derive(Serialize)]
 * #[serde(rename_all = "camelCase")]
 * struct AppEvent {
 *     event_type: String,
 *     event_name: String,
 *     timestamp: i64,
 * }
 *
 * fn main() {
 *     let client = courier::Client::new(courier::Config {
 *         endpoint: "https://collector.example.com/events".into(),
 *         token: "TOKEN".into(),
 *         max_batch_size: 100,
 *         max_batch_delay: Duration::from_secs(60),
 *     })
 *     .unwrap_or_else(|err| {
 *         eprintln!("telemetry disabled: {err}");
 *         courier::Client::disabled()
 *     });
 *
 *     client.send(AppEvent { /* ... */ });
 *
 *     // Blocks until every buffered event has been delivered (or given up on).
 *     client.close();
 * }
 * ```
 *
 * # Process-wide instance
 *
 * ```ignore
 * static TELEMETRY: courier::Registry<AppEvent> = courier::Registry::new();
 *
 * fn main() {
 *     if let Err(err) = TELEMETRY.setup(config) {
 *         eprintln!("telemetry disabled: {err}");
 *     }
 *     TELEMETRY.send(AppEvent { /* ... */ });
 *     TELEMETRY.close();
 * }
 * ```
 */

// ---------------------------------------------------------------------------
// Re-exports — the public surface area
// ---------------------------------------------------------------------------

pub use courier_core::{Client, Config, Error, Registry, MIN_BATCH_DELAY};
pub use courier_flags::CollectorArgs;
