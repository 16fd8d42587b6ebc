pub mod logger;

use client_cli::cli::Cli;

fn main() {
    logger::setup_logger();

    Cli::execute()
}
