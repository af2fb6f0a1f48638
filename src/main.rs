//! Lancet binary entry point.

use clap::Parser;
use lancet::cli::{self, Cli};
use lancet::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = cli::execute(&cli).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over the level flags.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.debug {
        "lancet=debug"
    } else if cli.info {
        "lancet=info"
    } else {
        "lancet=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
