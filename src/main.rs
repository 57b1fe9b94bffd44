use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use colored::*;
use std::process;
use std::sync::Arc;

use findilo::{
    config::ScanConfig,
    output::{ConsoleReporter, OutputConfig, Reporter},
    scanner::engine::ScanEngine,
    utils::{expand_ranges, Logger},
};

fn build_cli() -> Command {
    Command::new("findilo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Find HP iLO management controllers in IPv4 networks")
        .override_usage("findilo <networks>..., Format 10.0.0.0/24")
        .after_help(
            "Settings are read from $FINDILO_CONFIG or ~/.findilo.toml.\n\
             Set RUST_LOG=debug to see why hosts were skipped.",
        )
        .arg(
            Arg::new("networks")
                .value_name("NETWORK")
                .help("Networks to scan in CIDR notation")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append),
        )
}

async fn run(ranges: Vec<String>) -> anyhow::Result<()> {
    let config = ScanConfig::load_default_config();

    let addresses = expand_ranges(&ranges)?;
    let engine = ScanEngine::new(config.clone(), addresses)?;

    let reporter = Arc::new(ConsoleReporter::new(OutputConfig {
        format: config.output_format,
        progress: config.progress,
        colored: true,
    }));

    Logger::log_scan_start(&ranges, engine.total_hosts(), config.workers);
    reporter.begin(engine.total_hosts());

    let summary = engine.scan(reporter.clone()).await;

    Logger::log_scan_complete(summary.duration, summary.records.len(), summary.hosts_scanned);
    reporter.report(&summary.records)?;

    Ok(())
}

#[tokio::main]
async fn main() {
    Logger::init(log::LevelFilter::Warn);

    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let ranges: Vec<String> = matches
        .get_many::<String>("networks")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if let Err(e) = run(ranges).await {
        eprintln!("{} {}", "[!]".bright_red(), e);
        process::exit(1);
    }
}
