pub mod cli;
pub mod commands;
pub mod utils;

use clap::Parser;
use cli::Snipq;
use commands::handle_command;
use std::process;
use utils::init_logging;

/// Run the snipq CLI application
pub fn run_main() {
    init_logging();

    let args = Snipq::parse();
    if let Err(e) = handle_command(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
