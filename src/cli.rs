use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::database::TimeControl;

#[derive(Parser, Debug)]
#[command(author, version, about = "Swiss tournament pairing and resume engine")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Manage the player registry
    #[clap(subcommand)]
    Player(PlayerCommand),
    /// Create, resume and inspect tournaments
    #[clap(subcommand)]
    Tournament(TournamentCommand),
    /// Print shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum PlayerCommand {
    /// Register a new player
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Ranking, 1 is the strongest
        #[arg(long)]
        ranking: u32,
        /// Birth date as YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<NaiveDate>,
    },
    /// Change a player's ranking
    Rank { id: i64, ranking: u32 },
    /// List registered players
    List {
        #[arg(long, value_enum, default_value_t = PlayerOrder::Name)]
        by: PlayerOrder,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerOrder {
    Name,
    Ranking,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum TournamentCommand {
    /// Create a tournament and play it round by round
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Defaults to the configured round count
        #[arg(long)]
        rounds: Option<u32>,
        #[arg(long, value_enum, default_value_t = TimeControlArg::Blitz)]
        time_control: TimeControlArg,
        #[arg(long, default_value = "")]
        description: String,
        /// Registered player ids taking part
        #[arg(long, num_args = 2.., required = true)]
        players: Vec<i64>,
        #[clap(flatten)]
        policy: PolicyArgs,
    },
    /// Continue a tournament where the last session stopped; bye scoring
    /// stays as chosen at creation
    Resume {
        id: i64,
        /// Pair entrants again once no new opponent is left
        #[arg(long)]
        allow_repeats: bool,
    },
    /// List stored tournaments
    List,
    /// Show the standings of a tournament
    Standings { id: i64 },
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyArgs {
    /// Pair entrants again once no new opponent is left
    #[arg(long)]
    pub allow_repeats: bool,
    /// Give no point for a bye
    #[arg(long)]
    pub no_bye_score: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlArg {
    Bullet,
    Blitz,
    Rapid,
}

impl From<TimeControlArg> for TimeControl {
    fn from(value: TimeControlArg) -> Self {
        match value {
            TimeControlArg::Bullet => TimeControl::Bullet,
            TimeControlArg::Blitz => TimeControl::Blitz,
            TimeControlArg::Rapid => TimeControl::Rapid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_takes_player_list_and_policy_flags() {
        let cli = Cli::try_parse_from([
            "swiss_pairing",
            "tournament",
            "create",
            "--name",
            "Open",
            "--location",
            "Hall",
            "--players",
            "1",
            "2",
            "3",
            "--allow-repeats",
        ])
        .unwrap();

        match cli.command {
            Command::Tournament(TournamentCommand::Create { players, policy, rounds, .. }) => {
                assert_eq!(players, vec![1, 2, 3]);
                assert!(policy.allow_repeats);
                assert!(!policy.no_bye_score);
                assert_eq!(rounds, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn resume_refuses_bye_policy_flag() {
        let cli = Cli::try_parse_from(["swiss_pairing", "tournament", "resume", "3", "--allow-repeats"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Tournament(TournamentCommand::Resume {
                id: 3,
                allow_repeats: true
            })
        );
        assert!(Cli::try_parse_from(["swiss_pairing", "tournament", "resume", "3", "--no-bye-score"]).is_err());
    }

    #[test]
    fn player_list_defaults_to_name_order() {
        let cli = Cli::try_parse_from(["swiss_pairing", "player", "list"]).unwrap();
        assert_eq!(cli.command, Command::Player(PlayerCommand::List { by: PlayerOrder::Name }));
    }
}
