pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod pairing;
pub mod services;

use std::io;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use log::info;

use crate::cli::{Cli, Command, PlayerCommand, PlayerOrder, PolicyArgs, TournamentCommand};
use crate::config::settings::{AppConfig, TournamentSettings};
use crate::database::{PlayerRecord, SqliteStore, TournamentRecord, TournamentStatus, tournaments};
use crate::errors::{store_context, tournament_context};
use crate::pairing::{ByePolicy, Standing};
use crate::services::{ConsoleCollector, PlayerRegistry, TournamentCoordinator, TournamentDraft};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.database.path)
        .with_context(|| format!("Failed to open database at {}", config.database.path))
}

fn tournament_settings(config: &AppConfig, policy: PolicyArgs) -> TournamentSettings {
    let settings = config.tournament.with_repeats(policy.allow_repeats);
    if policy.no_bye_score {
        settings.with_bye_policy(ByePolicy::NoScore)
    } else {
        settings
    }
}

pub fn handle_player(command: &PlayerCommand) -> Result<()> {
    let config = AppConfig::new();
    let registry = PlayerRegistry::new(open_store(&config)?);

    match command {
        PlayerCommand::Add {
            first_name,
            last_name,
            ranking,
            birth_date,
        } => {
            let player = registry.add_player(first_name, last_name, *birth_date, *ranking)?;
            println!("{} {}", "Added".green(), format_player(&player));
        }
        PlayerCommand::Rank { id, ranking } => {
            let player = registry.update_ranking(*id, *ranking)?;
            println!("{} {}", "Updated".green(), format_player(&player));
        }
        PlayerCommand::List { by } => {
            let players = match by {
                PlayerOrder::Name => registry.list_by_name()?,
                PlayerOrder::Ranking => registry.list_by_ranking()?,
            };
            if players.is_empty() {
                println!("{}", "No players registered".dimmed());
            }
            for player in &players {
                println!("{}", format_player(player));
            }
        }
    }
    Ok(())
}

pub fn handle_tournament(command: &TournamentCommand) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;

    match command {
        TournamentCommand::Create {
            name,
            location,
            date,
            rounds,
            time_control,
            description,
            players,
            policy,
        } => {
            let roster = PlayerRegistry::new(store.clone()).roster_for(players)?;
            let draft = TournamentDraft {
                name: name.clone(),
                location: location.clone(),
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                time_control: (*time_control).into(),
                description: description.clone(),
                total_rounds: rounds.unwrap_or(config.tournament.default_rounds),
            };
            let coordinator = TournamentCoordinator::create(store, draft, roster, tournament_settings(&config, *policy))
                .context("Failed to create tournament")?;
            println!(
                "{} tournament {}",
                "Created".green(),
                coordinator.tournament_id().to_string().bold()
            );
            play(coordinator)
        }
        TournamentCommand::Resume { id, allow_repeats } => {
            let settings = config.tournament.with_repeats(*allow_repeats);
            let coordinator = TournamentCoordinator::resume(store, *id, settings)
                .with_context(|| tournament_context(*id))?;
            info!("Resuming tournament {} at round {}", id, coordinator.current_round());
            play(coordinator)
        }
        TournamentCommand::List => {
            let all = tournaments::list_all(&store).with_context(|| store_context("list", "tournaments"))?;
            if all.is_empty() {
                println!("{}", "No tournaments stored".dimmed());
            }
            for tournament in &all {
                println!("{}", format_tournament(tournament));
            }
            Ok(())
        }
        TournamentCommand::Standings { id } => {
            let tournament = tournaments::find_by_id(&store, *id)
                .with_context(|| store_context("load", "tournament"))?
                .with_context(|| format!("Tournament {} does not exist", id))?;
            println!("{}", format_tournament(&tournament));
            print_standings(&tournament.standings());
            Ok(())
        }
    }
}

fn play(mut coordinator: TournamentCoordinator<SqliteStore>) -> Result<()> {
    let stdin = io::stdin();
    let mut collector = ConsoleCollector::new(stdin.lock(), io::stdout());
    let id = coordinator.tournament_id();
    let standings = coordinator
        .run(&mut collector)
        .with_context(|| tournament_context(id))?;
    println!("{}", "Final standings".bold());
    print_standings(&standings);
    Ok(())
}

pub fn handle_completions(shell: clap_complete::Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
    Ok(())
}

fn format_player(player: &PlayerRecord) -> String {
    let birth = player
        .birth_date
        .map(|d| format!(", born {}", d))
        .unwrap_or_default();
    format!(
        "{:>4}  {:<30} ranking {}{}",
        player.id,
        player.display_name(),
        player.ranking,
        birth
    )
}

fn format_tournament(tournament: &TournamentRecord) -> String {
    let status = match tournament.status {
        TournamentStatus::Created => "created".normal(),
        TournamentStatus::InProgress => "in progress".yellow(),
        TournamentStatus::Finished => "finished".green(),
    };
    format!(
        "{:>4}  {} ({}, {}) {:?}, {} rounds, {}",
        tournament.id,
        tournament.name.bold(),
        tournament.location,
        tournament.date,
        tournament.time_control,
        tournament.total_rounds,
        status
    )
}

fn print_standings(standings: &[Standing]) {
    for (place, standing) in standings.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {:>4.1}  (ranking {})",
            place + 1,
            standing.name,
            standing.score,
            standing.ranking
        );
    }
}
