use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod menu;
mod output;
mod selection;
mod terminal;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = commands::clean::execute(cli).await;

    std::process::exit(exit_code);
}
