use clap::Parser;
use log::info;

mod core;
mod error;
mod filter;
mod network;
mod report;
mod setup_logger;

use crate::core::{Configuration, Rejector};
use crate::error::InitProcessError;
use crate::filter::build_filter;
use crate::report::ConsoleReporter;
use crate::setup_logger::setup_logger;

/// フィルタに一致したパケットを迂回し、TCP には RST、UDP には ICMP Port Unreachable を返す
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// 迂回ドライバのフィルタ式 (引数は空白で連結される)
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
    filter: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), InitProcessError> {
    let config = Configuration::from_env()?;
    setup_logger(&config.logging)?;

    let filter = build_filter(&cli.filter)?;
    info!("フィルタ: {}", filter);

    // 迂回デバイスのオープン
    let diverter = network::open(&filter, &config.divert)?;
    info!("迂回デバイスのオープンに成功しました (priority={})", config.divert.priority);

    let reporter = ConsoleReporter::new(config.logging.color);
    let mut rejector = Rejector::new(diverter, reporter, config.divert.buffer_size)
        .map_err(|e| InitProcessError::Template(e.to_string()))?;

    rejector.run()
}
