use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engrave::cli::{split_filter_chain, Cli, Command};
use engrave::models::EngraveConfig;
use engrave::pipeline::Orchestrator;

fn main() -> anyhow::Result<()> {
    // `-f NAME [options]` groups are not expressible in clap; cut them out first.
    let (args, chain) = split_filter_chain(std::env::args().collect())?;
    let cli = Cli::parse_from(args);

    let verbose = match &cli.command {
        Command::Run(args) => args.verbose,
        Command::Filter(filter) => filter.stage().verbose,
        Command::Inspect(_) => 0,
    };
    init_logging(verbose);

    match cli.command {
        Command::Run(args) => {
            let config = EngraveConfig::from_args(&args, chain)?;
            Orchestrator::new(config).run()?;
        }
        Command::Filter(filter) => engrave::stage::run(&filter)?,
        Command::Inspect(args) => engrave::inspect::run(&args)?,
    }
    Ok(())
}

/// Logs go to stderr: stdout of a stage is the scanline pipe.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "engrave=warn",
        1 => "engrave=info",
        _ => "engrave=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}
