/**
 * The courier client — the public face of the dispatcher.
 *
 * Lifecycle:
 * 1. `Client::new(config)` validates the configuration, wires the channels
 *    and spawns the coordinator thread. Nothing runs in the background if
 *    validation fails.
 * 2. `send()` hands events to the coordinator from any thread.
 * 3. `close()` requests shutdown and blocks until the coordinator has
 *    drained: every in-flight delivery finished and the final partial
 *    batch delivered.
 *
 * The client is a cheap handle (`Clone` shares the same pipeline) and a
 * disabled variant exists so call sites never need a "was construction
 * ok?" branch — see `Client::disabled`.
 */
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::debug;
use serde::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::transport::{Coordinator, Transport};

// ---------------------------------------------------------------------------
// Channels — the shared half of a running pipeline
// ---------------------------------------------------------------------------

/**
 * Channel ends shared by every clone of a running client.
 *
 * All three channels are rendezvous channels:
 * - `events` — inbound path to the coordinator. `send` blocks until the
 *   coordinator receives, which is the only producer/coordinator
 *   synchronization point.
 * - `quit` — carries no messages; shutdown is its disconnect. The sender
 *   sits in a `Mutex<Option<…>>` so the first `close` takes it and later
 *   calls find it gone.
 * - `done` — carries no messages; the coordinator drops its end once the
 *   drain is complete, which is what `close` waits for.
 */
struct Channels<E> {
    events: Sender<E>,
    quit: Receiver<()>,
    quit_tx: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/**
 * Handle to a batching dispatcher.
 *
 * `E` is whatever the application considers an event — the only
 * requirement is that it serializes to the wire format.
 *
 * Failures past `new` never reach the caller: delivery errors are logged
 * and the affected batch is requeued internally.
 */
pub struct Client<E> {
    /// `None` marks the disabled no-op client.
    inner: Option<Arc<Channels<E>>>,
}

impl<E> Clone for Client<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E> Client<E>
where
    E: Serialize + Send + 'static,
{
    /**
     * Validates `config` and starts the batching pipeline.
     *
     * Validation failures come back as the named `Error` variant before
     * any background activity starts. See `Client::disabled` for the
     * no-op fallback to pair this with.
     */
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let transport = Arc::new(Transport::new(&config));
        let (events_tx, events_rx) = bounded::<E>(0);
        let (quit_tx, quit_rx) = bounded::<()>(0);
        let (done_tx, done_rx) = bounded::<()>(0);

        let coordinator = Coordinator::new(
            config,
            transport,
            events_rx,
            events_tx.clone(),
            quit_rx.clone(),
        );
        coordinator.spawn(done_tx)?;

        Ok(Self {
            inner: Some(Arc::new(Channels {
                events: events_tx,
                quit: quit_rx,
                quit_tx: Mutex::new(Some(quit_tx)),
                done: done_rx,
            })),
        })
    }

    /**
     * A client whose `send` and `close` do nothing.
     *
     * This is what the registry stores when setup fails, so code that
     * reports events never has to care whether configuration succeeded.
     */
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether this client actually delivers events.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /**
     * Enqueues one event for batching.
     *
     * Blocks briefly until the coordinator is ready to receive. Once
     * shutdown has been requested the event is dropped without blocking —
     * including when shutdown lands while this call is already waiting.
     * Downstream delivery failures are never surfaced here.
     */
    pub fn send(&self, event: E) {
        let Some(inner) = &self.inner else { return };

        select! {
            recv(inner.quit) -> _ => {
                debug!("shutdown in progress, event dropped");
            }
            send(inner.events, event) -> result => {
                if result.is_err() {
                    debug!("pipeline closed, event dropped");
                }
            }
        }
    }

    /**
     * Requests shutdown and blocks until the coordinator has fully
     * drained: buffered events flushed, every in-flight delivery finished.
     *
     * Idempotent and safe to call from several threads at once — every
     * caller blocks until the drain completes, then returns. Never panics,
     * never errors.
     */
    pub fn close(&self) {
        let Some(inner) = &self.inner else { return };

        /*
         * First close takes the quit sender and drops it, disconnecting
         * the quit channel for the coordinator and every blocked sender.
         * Later (or concurrent) calls find the slot empty.
         */
        if let Ok(mut slot) = inner.quit_tx.lock() {
            slot.take();
        }

        /* Resolves once the coordinator drops its end of `done`. */
        let _ = inner.done.recv();
        debug!("close complete");
    }
}
