use std::time::Duration;

use clap::Parser;
use pgiam::{ConnectionAttempt, Connector, ConnectorOptions, TokenStatus};
use pgiam_clock::DurationSecs;
use tokio::time;

#[derive(Debug, Parser)]
struct Opts {
    /// The database host, e.g. `db.cluster.us-east-1.rds.amazonaws.com`
    #[clap(long, env = "PGHOST")]
    host: String,

    /// The database port
    #[clap(short, long, env = "PGPORT", default_value_t = pgiam::DEFAULT_PORT)]
    port: u16,

    /// The database user to issue tokens for
    #[clap(short, long, env = "PGUSER")]
    user: String,

    /// The AWS region, overriding the ambient configuration
    #[clap(short, long, env = "AWS_REGION")]
    region: Option<String>,

    /// Seconds between background token refreshes
    #[clap(long, default_value_t = pgiam::DEFAULT_REFRESH_INTERVAL.0)]
    refresh_interval: u64,

    /// Seconds between simulated connection attempts
    #[clap(long, default_value_t = 5)]
    every: u64,

    /// Number of connection attempts to simulate before shutting down
    #[clap(short = 'n', long, default_value_t = 10)]
    attempts: u32,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let options = ConnectorOptions {
        region: opts.region,
        refresh_interval: DurationSecs(opts.refresh_interval),
        ..ConnectorOptions::default()
    };

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let connector = Connector::builder()
        .with_sdk_config(&sdk_config)
        .with_options(options)
        .build();

    let mut interval = time::interval(Duration::from_secs(opts.every));
    for _ in 0..opts.attempts {
        interval.tick().await;

        let mut attempt = ConnectionAttempt::new(opts.host.as_str(), opts.port, opts.user.as_str());
        connector.before_connect(&mut attempt).await?;

        let Some(token) = connector.cached_token() else {
            tracing::warn!("no token was issued; is a region configured?");
            continue;
        };

        let status = token.token_status();
        match status {
            TokenStatus::Valid => tracing::info!(
                ?status,
                token = format_args!("{:#?}", token.auth_token()),
                issued = token.issued().0,
                expiry = token.expiry().0,
                "prepared connection attempt"
            ),
            TokenStatus::Expired => tracing::error!(
                ?status,
                issued = token.issued().0,
                expiry = token.expiry().0,
                "prepared connection attempt with an expired token"
            ),
        }
    }

    connector.shutdown().await;

    Ok(())
}
