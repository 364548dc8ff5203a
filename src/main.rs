use anyhow::Result;

use swiss_pairing::cli::Command;
use swiss_pairing::{handle_completions, handle_player, handle_tournament, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Player(player) => handle_player(player),
        Command::Tournament(tournament) => handle_tournament(tournament),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
