use crate::pairing::{ByePolicy, RepeatPolicy};

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "swiss_pairing.db".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSettings {
    pub default_rounds: u32,
    pub repeat_policy: RepeatPolicy,
    pub bye_policy: ByePolicy,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            default_rounds: 4,
            repeat_policy: RepeatPolicy::Reject,
            bye_policy: ByePolicy::FullPoint,
        }
    }
}

impl TournamentSettings {
    pub fn with_repeats(mut self, allow: bool) -> Self {
        if allow {
            self.repeat_policy = RepeatPolicy::ForceRepeat;
        }
        self
    }

    pub fn with_bye_policy(mut self, policy: ByePolicy) -> Self {
        self.bye_policy = policy;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub tournament: TournamentSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
