/*!
 * End-to-end tests for the batching pipeline, driven through a loopback
 * HTTP collector stub.
 *
 * The stub accepts one request per connection, replies with a scripted
 * status (200 once the script runs out), and hands every parsed request
 * to the test over a channel.
 */

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use courier_core::{Client, Config};

// ---------------------------------------------------------------------------
// Event type used throughout the suite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryEvent {
    event_type: String,
    event_name: String,
    timestamp: i64,
}

impl TelemetryEvent {
    fn named(name: &str, timestamp: i64) -> Self {
        Self {
            event_type: "test".into(),
            event_name: name.into(),
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Collector stub
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CollectorRequest {
    content_type: Option<String>,
    token: Option<String>,
    body: String,
}

impl CollectorRequest {
    /// Event names from the JSON array body, in wire order.
    fn event_names(&self) -> Vec<String> {
        let events: Vec<serde_json::Value> = serde_json::from_str(&self.body).unwrap();
        events
            .iter()
            .map(|event| event["eventName"].as_str().unwrap().to_string())
            .collect()
    }
}

struct Collector {
    url: String,
    requests: crossbeam_channel::Receiver<CollectorRequest>,
}

impl Collector {
    /**
     * Starts a loopback collector on an ephemeral port.
     *
     * `statuses` scripts the reply status per request, in order; once
     * exhausted every request is answered with 200.
     */
    fn start(statuses: &[u16]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/events", listener.local_addr().unwrap());
        let statuses = statuses.to_vec();
        let (requests_tx, requests_rx) = crossbeam_channel::unbounded();

        thread::spawn(move || {
            let mut served = 0usize;
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some(request) = read_request(&mut stream) else {
                    continue;
                };

                let status = statuses.get(served).copied().unwrap_or(200);
                served += 1;
                let reason = if status < 400 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                );
                let _ = stream.write_all(response.as_bytes());

                if requests_tx.send(request).is_err() {
                    break;
                }
            }
        });

        Self {
            url,
            requests: requests_rx,
        }
    }

    fn config(&self, max_batch_size: usize, max_batch_delay: Duration) -> Config {
        Config {
            endpoint: self.url.clone(),
            token: "test-token".into(),
            max_batch_size,
            max_batch_delay,
        }
    }

    fn expect_request(&self) -> CollectorRequest {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("expected a delivery to reach the collector")
    }

    fn expect_quiet(&self, wait: Duration) {
        assert!(
            self.requests.recv_timeout(wait).is_err(),
            "unexpected delivery reached the collector"
        );
    }
}

/// Reads one HTTP request (headers + content-length body) off the stream.
fn read_request(stream: &mut TcpStream) -> Option<CollectorRequest> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok()?;

    let mut buffered = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(end) = buffered.windows(4).position(|w| w == b"\r\n\r\n") {
            break end;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buffered.extend_from_slice(&chunk[..n]);
    };

    let headers = String::from_utf8_lossy(&buffered[..header_end]).to_string();
    let content_length: usize = header_value(&headers, "content-length")?.parse().ok()?;

    let mut body = buffered[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Some(CollectorRequest {
        content_type: header_value(&headers, "content-type"),
        token: header_value(&headers, "x-collector-token"),
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn header_value(headers: &str, name: &str) -> Option<String> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Flush triggers
// ---------------------------------------------------------------------------

#[test]
fn test_full_batch_flushes_immediately() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(3, Duration::from_secs(60))).unwrap();

    client.send(TelemetryEvent::named("a", 1));
    client.send(TelemetryEvent::named("b", 2));
    client.send(TelemetryEvent::named("c", 3));

    let request = collector.expect_request();
    assert_eq!(request.event_names(), vec!["a", "b", "c"]);

    /* The batch went out on the size trigger alone — nothing else is due. */
    collector.expect_quiet(Duration::from_millis(300));
    client.close();
}

#[test]
fn test_timer_flushes_partial_batch() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(100, Duration::from_secs(1))).unwrap();

    client.send(TelemetryEvent::named("first", 1));
    client.send(TelemetryEvent::named("second", 2));

    /* Well under the batch size; only the timer can push these out. */
    let request = collector.expect_request();
    assert_eq!(request.event_names(), vec!["first", "second"]);

    client.close();
}

#[test]
fn test_idle_ticks_deliver_nothing() {
    let collector = Collector::start(&[]);
    let client: Client<TelemetryEvent> = Client::new(collector.config(100, Duration::from_secs(1))).unwrap();

    /* Two-plus timer periods with an empty buffer: no POSTs. */
    collector.expect_quiet(Duration::from_millis(2500));
    client.close();
}

// ---------------------------------------------------------------------------
// Shutdown drain
// ---------------------------------------------------------------------------

#[test]
fn test_close_delivers_remaining_events() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(100, Duration::from_secs(60))).unwrap();

    client.send(TelemetryEvent::named("x", 1));
    client.send(TelemetryEvent::named("y", 2));
    client.close();

    /* close() returns only after the final flush completed. */
    let request = collector.expect_request();
    assert_eq!(request.event_names(), vec!["x", "y"]);
}

#[test]
fn test_single_event_payload_and_headers() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(1, Duration::from_secs(1))).unwrap();

    client.send(TelemetryEvent {
        event_type: "X".into(),
        event_name: "Y".into(),
        timestamp: 123,
    });
    client.close();

    let request = collector.expect_request();
    assert_eq!(
        request.body,
        r#"[{"eventType":"X","eventName":"Y","timestamp":123}]"#
    );
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(request.token.as_deref(), Some("test-token"));
}

#[test]
fn test_close_is_idempotent() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(100, Duration::from_secs(60))).unwrap();

    client.send(TelemetryEvent::named("only", 1));
    client.close();
    client.close();

    let request = collector.expect_request();
    assert_eq!(request.event_names(), vec!["only"]);
    collector.expect_quiet(Duration::from_millis(300));
}

#[test]
fn test_concurrent_close_does_not_panic() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(100, Duration::from_secs(60))).unwrap();

    client.send(TelemetryEvent::named("shared", 1));

    let first = {
        let client = client.clone();
        thread::spawn(move || client.close())
    };
    let second = {
        let client = client.clone();
        thread::spawn(move || client.close())
    };
    first.join().unwrap();
    second.join().unwrap();

    let request = collector.expect_request();
    assert_eq!(request.event_names(), vec!["shared"]);
}

#[test]
fn test_send_after_close_is_dropped() {
    let collector = Collector::start(&[]);
    let client = Client::new(collector.config(1, Duration::from_secs(1))).unwrap();

    client.send(TelemetryEvent::named("before", 1));
    client.close();
    let request = collector.expect_request();
    assert_eq!(request.event_names(), vec!["before"]);

    /* Returns immediately and the event goes nowhere. */
    client.send(TelemetryEvent::named("after", 2));
    collector.expect_quiet(Duration::from_millis(300));
}

#[test]
fn test_close_with_empty_buffer_sends_nothing() {
    let collector = Collector::start(&[]);
    let client: Client<TelemetryEvent> = Client::new(collector.config(10, Duration::from_secs(60))).unwrap();

    client.close();
    collector.expect_quiet(Duration::from_millis(300));
}

// ---------------------------------------------------------------------------
// Requeue
// ---------------------------------------------------------------------------

#[test]
fn test_failed_batch_is_requeued_in_order() {
    /* First delivery is rejected, everything after succeeds. */
    let collector = Collector::start(&[500]);
    let client = Client::new(collector.config(3, Duration::from_secs(60))).unwrap();

    client.send(TelemetryEvent::named("a", 1));
    client.send(TelemetryEvent::named("b", 2));
    client.send(TelemetryEvent::named("c", 3));

    let rejected = collector.expect_request();
    assert_eq!(rejected.event_names(), vec!["a", "b", "c"]);

    /*
     * The requeued events refill the buffer to the batch size, so the
     * retry goes out on the size trigger — same events, same order.
     */
    let retried = collector.expect_request();
    assert_eq!(retried.event_names(), vec!["a", "b", "c"]);
    assert_eq!(retried.body, rejected.body);

    client.close();
}

#[test]
fn test_requeued_events_keep_relative_order_among_new_arrivals() {
    let collector = Collector::start(&[500]);
    let client = Client::new(collector.config(2, Duration::from_secs(1))).unwrap();

    client.send(TelemetryEvent::named("a", 1));
    client.send(TelemetryEvent::named("b", 2));

    let rejected = collector.expect_request();
    assert_eq!(rejected.event_names(), vec!["a", "b"]);

    /* Race a fresh event against the in-progress requeue of a and b. */
    client.send(TelemetryEvent::named("c", 3));

    /*
     * Where c lands relative to the requeued pair is unspecified; a must
     * still precede b once everything has been redelivered.
     */
    let mut delivered = Vec::new();
    while delivered.len() < 3 {
        delivered.extend(collector.expect_request().event_names());
    }
    let mut sorted = delivered.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["a", "b", "c"]);

    let position = |name: &str| delivered.iter().position(|n| n == name).unwrap();
    assert!(position("a") < position("b"));

    client.close();
}
