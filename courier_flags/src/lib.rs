/*!
 * Command-line and environment configuration surface for courier.
 *
 * `CollectorArgs` is a `clap::Args` group that downstream binaries flatten
 * into their own parser:
 *
 * ```ignore
 * #[derive(clap::Parser)]
 * struct Cli {
 *     #[command(flatten)]
 *     courier: courier_flags::CollectorArgs,
 * }
 *
 * let cli = Cli::parse();
 * let client = courier_core::Client::new(cli.courier.to_config())?;
 * ```
 *
 * Every flag also reads from an environment variable, so deployments can
 * configure the dispatcher without touching the command line. Defaults
 * match `Config::default()`; endpoint and token default to empty and fail
 * validation until provided.
 */

use std::time::Duration;

use clap::Args;

use courier_core::Config;

/**
 * Collector connection and batching flags.
 *
 * Delay values use humantime syntax: `30s`, `1m`, `1m30s`.
 */
#[derive(Debug, Clone, Args)]
pub struct CollectorArgs {
    /// Collector endpoint URL that event batches are POSTed to.
    #[arg(long = "courier-endpoint", env = "COURIER_ENDPOINT", default_value = "")]
    pub endpoint: String,

    /// Access token attached to every delivery.
    #[arg(long = "courier-token", env = "COURIER_TOKEN", default_value = "")]
    pub token: String,

    /// Maximum number of events per delivered batch.
    #[arg(
        long = "courier-batch-size",
        env = "COURIER_BATCH_SIZE",
        default_value_t = 100
    )]
    pub max_batch_size: usize,

    /// Maximum time a partial batch may wait before delivery.
    #[arg(
        long = "courier-batch-delay",
        env = "COURIER_BATCH_DELAY",
        default_value = "1m",
        value_parser = humantime::parse_duration
    )]
    pub max_batch_delay: Duration,
}

impl CollectorArgs {
    /**
     * Builds a `Config` from the parsed flags.
     *
     * Validation still happens in `Client::new` — empty endpoint or token
     * parse fine here and are rejected there.
     */
    pub fn to_config(&self) -> Config {
        Config {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            max_batch_size: self.max_batch_size,
            max_batch_delay: self.max_batch_delay,
        }
    }
}

impl From<CollectorArgs> for Config {
    fn from(args: CollectorArgs) -> Self {
        args.to_config()
    }
}
