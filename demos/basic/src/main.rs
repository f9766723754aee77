/**
 * Minimal demonstration binary for the courier SDK.
 *
 * Point it at a collector and watch batches go out as the size and delay
 * triggers fire:
 *
 *   cargo run -p courier_demo -- \
 *     --courier-endpoint http://localhost:8080/events \
 *     --courier-token demo-token \
 *     --courier-batch-size 5 \
 *     --courier-batch-delay 2s
 */
use clap::Parser;
use serde::Serialize;

#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    courier: courier::CollectorArgs,

    /// How many demo events to send.
    #[arg(long, default_value_t = 12)]
    count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoEvent {
    event_type: String,
    event_name: String,
    sequence: u32,
}

static TELEMETRY: courier::Registry<DemoEvent> = courier::Registry::new();

fn main() {
    let cli = Cli::parse();

    /*
     * A failed setup leaves a no-op client behind, so the send loop below
     * runs unconditionally either way.
     */
    if let Err(err) = TELEMETRY.setup(cli.courier.to_config()) {
        eprintln!("[demo] telemetry disabled: {err}");
    }

    for sequence in 0..cli.count {
        TELEMETRY.send(DemoEvent {
            event_type: "demo".into(),
            event_name: format!("tick-{sequence}"),
            sequence,
        });
        println!("[demo] queued event {sequence}");
        std::thread::sleep(std::time::Duration::from_millis(250));
    }

    println!("[demo] closing, buffered events are flushed now");
    TELEMETRY.close();
    println!("[demo] done");
}
