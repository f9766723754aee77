/**
 * The batching coordinator — a single background thread that owns the
 * batch buffer and decides when batches leave the process.
 *
 * Architecture overview:
 *
 * ```text
 *  ┌──────────────┐   rendezvous channel   ┌──────────────────┐
 *  │  User code    │ ────── event ────────► │ Coordinator       │
 *  │  (any thread) │                        │ thread (single)   │
 *  └──────────────┘                        └────────┬─────────┘
 *                                         batch full │ or ticker
 *                                                    ▼
 *                                          ┌──────────────────┐
 *                                          │ Delivery threads  │──► Collector
 *                                          │ (one per batch)   │
 *                                          └────────┬─────────┘
 *                                        on failure │ requeue, in order
 *                                                    ▼
 *                                           inbound channel
 * ```
 *
 * The coordinator is the only code that mutates the batch buffer, so the
 * buffer needs no locking. A batch is handed to a delivery thread by value
 * and never touched again.
 *
 * Shutdown drain: once the quit channel disconnects, the coordinator stops
 * starting flush cycles, waits until the in-flight tracker reads zero, then
 * delivers whatever is left in the buffer synchronously and drops the done
 * channel — which is what unblocks `Client::close`.
 */
use std::mem;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crossbeam_channel::{select, tick, Receiver, Sender};
use log::{debug, error, warn};
use serde::Serialize;

use super::http::Transport;
use crate::config::Config;
use crate::error::Error;

// ---------------------------------------------------------------------------
// FlightTracker — counts deliveries that are still in the air
// ---------------------------------------------------------------------------

/**
 * Synchronization primitive the drain protocol blocks on: an in-flight
 * delivery counter with a "wait until zero" operation.
 *
 * Uses a `Mutex<usize>` + `Condvar` pair:
 * - `depart()` increments the counter and returns an RAII `Flight` guard.
 * - Dropping the guard decrements and notifies when the count hits zero —
 *   including when the delivery thread unwinds from a panic.
 * - `wait_idle()` blocks the coordinator until the count reads zero.
 *
 * The counter only moves through `depart` on the coordinator thread, so a
 * delivery can never slip in between `wait_idle` returning and the final
 * flush.
 */
pub(crate) struct FlightTracker {
    /// Number of delivery threads currently running.
    active: Mutex<usize>,

    /// Condition variable the coordinator waits on during drain.
    idle: Condvar,
}

impl FlightTracker {
    pub(crate) fn new() -> Self {
        Self {
            active: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    /**
     * Registers one departing delivery. Call before spawning the delivery
     * thread; move the returned guard into it.
     */
    fn depart(self: &Arc<Self>) -> Flight {
        if let Ok(mut active) = self.active.lock() {
            *active += 1;
        }
        Flight(Arc::clone(self))
    }

    /**
     * Blocks the calling thread until no deliveries are in flight.
     * Returns immediately when the counter already reads zero.
     */
    fn wait_idle(&self) {
        if let Ok(guard) = self.active.lock() {
            let _guard = self.idle.wait_while(guard, |active| *active > 0);
        }
    }
}

/**
 * RAII handle for one in-flight delivery. Dropping it lands the flight.
 */
struct Flight(Arc<FlightTracker>);

impl Drop for Flight {
    fn drop(&mut self) {
        if let Ok(mut active) = self.0.active.lock() {
            *active -= 1;
            if *active == 0 {
                self.0.idle.notify_all();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator — the background thread
// ---------------------------------------------------------------------------

/**
 * Owns the batch buffer, the flush timer, and the shutdown drain.
 *
 * Built by `Client::new`, which moves it onto a named thread via `spawn`.
 */
pub struct Coordinator<E> {
    config: Config,
    transport: Arc<Transport>,

    /// Receiving end of the inbound event channel.
    inbound_rx: Receiver<E>,

    /// Sender clone handed to delivery threads so failed batches can
    /// re-enter the pipeline.
    inbound_tx: Sender<E>,

    /// Disconnects when shutdown is requested (or the client is dropped).
    quit: Receiver<()>,

    flights: Arc<FlightTracker>,
}

impl<E> Coordinator<E>
where
    E: Serialize + Send + 'static,
{
    pub fn new(
        config: Config,
        transport: Arc<Transport>,
        inbound_rx: Receiver<E>,
        inbound_tx: Sender<E>,
        quit: Receiver<()>,
    ) -> Self {
        Self {
            config,
            transport,
            inbound_rx,
            inbound_tx,
            quit,
            flights: Arc::new(FlightTracker::new()),
        }
    }

    /**
     * Starts the coordinator thread.
     *
     * `done` is moved onto the thread and dropped when `run` returns —
     * after the drain, including the final flush. `Client::close` blocks
     * on that disconnect.
     */
    pub fn spawn(self, done: Sender<()>) -> Result<(), Error> {
        thread::Builder::new()
            .name("courier-coordinator".into())
            .spawn(move || {
                let _done = done;
                self.run();
            })
            .map(|_| ())
            .map_err(|err| Error::Spawn(err.to_string()))
    }

    /**
     * The coordinator event loop.
     *
     * Each iteration first flushes a buffer that filled up during the
     * previous iteration, then waits for whichever comes first: shutdown,
     * a new event, or the flush timer.
     */
    fn run(self) {
        debug!("coordinator started");

        let ticker = tick(self.config.max_batch_delay);
        let mut batch: Vec<E> = Vec::with_capacity(self.config.max_batch_size);

        loop {
            /*
             * Size check before waiting for input: a buffer that filled
             * during the previous iteration goes out now, not when the
             * next event or tick happens to arrive.
             */
            if batch.len() >= self.config.max_batch_size {
                let full = self.take(&mut batch);
                self.flush_async(full);
            }

            select! {
                recv(self.quit) -> _ => break,
                recv(self.inbound_rx) -> event => match event {
                    Ok(event) => batch.push(event),
                    /* inbound disconnect is treated like a shutdown request */
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    let due = self.take(&mut batch);
                    self.flush_async(due);
                }
            }
        }

        /*
         * Drain. No new flush cycles start past this point. Deliveries
         * still in flight may requeue into `inbound_tx`; those sends
         * observe the disconnected quit channel and drop instead.
         */
        debug!("coordinator draining, waiting for in-flight deliveries");
        self.flights.wait_idle();
        deliver(&self.transport, &self.inbound_tx, &self.quit, batch);
        debug!("coordinator terminated");
    }

    /// Swaps the current buffer for a fresh one at full capacity.
    fn take(&self, batch: &mut Vec<E>) -> Vec<E> {
        mem::replace(batch, Vec::with_capacity(self.config.max_batch_size))
    }

    /**
     * Hands a batch to its own delivery thread and returns immediately.
     *
     * No-op on an empty batch, so an idle dispatcher pays nothing for
     * timer ticks.
     */
    fn flush_async(&self, batch: Vec<E>) {
        if batch.is_empty() {
            return;
        }

        let flight = self.flights.depart();
        let transport = Arc::clone(&self.transport);
        let inbound = self.inbound_tx.clone();
        let quit = self.quit.clone();

        let spawned = thread::Builder::new()
            .name("courier-delivery".into())
            .spawn(move || {
                let _flight = flight;
                deliver(&transport, &inbound, &quit, batch);
            });

        if let Err(err) = spawned {
            /* The batch went down with the closure; nothing left to send. */
            error!("failed to spawn delivery thread, batch dropped: {err}");
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery — runs on its own thread, one per batch
// ---------------------------------------------------------------------------

/**
 * Delivers one batch: serialize to a JSON array, one POST, requeue the
 * whole batch on any failure. No-op on an empty batch.
 *
 * Serialization failure is treated as retryable — the events re-enter the
 * pipeline rather than being declared lost here.
 */
fn deliver<E: Serialize>(
    transport: &Transport,
    inbound: &Sender<E>,
    quit: &Receiver<()>,
    batch: Vec<E>,
) {
    if batch.is_empty() {
        return;
    }

    debug!("delivering batch of {} events", batch.len());

    let payload = match serde_json::to_vec(&batch) {
        Ok(payload) => payload,
        Err(err) => {
            error!("failed to encode batch of {} events: {err}", batch.len());
            requeue(inbound, quit, batch);
            return;
        }
    };

    match transport.post(&payload) {
        Ok(()) => debug!("delivered {} events", batch.len()),
        Err(err) => {
            error!("failed to deliver batch of {} events: {err}", batch.len());
            requeue(inbound, quit, batch);
        }
    }
}

/**
 * Resubmits the events of a failed batch to the inbound channel, one at a
 * time and in their original order.
 *
 * Once shutdown has been signaled — or the inbound channel is gone — the
 * remaining events are dropped so the drain can finish. Bounded shutdown
 * latency wins over exhaustive redelivery here.
 */
fn requeue<E>(inbound: &Sender<E>, quit: &Receiver<()>, batch: Vec<E>) {
    let total = batch.len();

    for (sent, event) in batch.into_iter().enumerate() {
        select! {
            recv(quit) -> _ => {
                warn!("shutdown while requeuing, dropping {} of {total} events", total - sent);
                return;
            }
            send(inbound, event) -> result => {
                if result.is_err() {
                    warn!("inbound channel closed while requeuing, dropping {} of {total} events", total - sent);
                    return;
                }
            }
        }
    }

    debug!("requeued {total} events");
}
