use std::io::{self, BufRead, Write};

use chrono::{DateTime, NaiveDateTime, Utc};
use colored::Colorize;

use super::coordinator::OutcomeCollector;
use crate::errors::EngineError;
use crate::pairing::{Match, Outcome, PlayerId, RoundNumber, ScoreBoard};

const END_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Asks an operator for each result on a line based terminal
pub struct ConsoleCollector<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleCollector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    fn describe(board: &ScoreBoard, player_id: PlayerId) -> String {
        match (board.entrant(player_id), board.score(player_id)) {
            (Some(entrant), Some(score)) => format!("{} [{}] ({})", entrant.name, entrant.id, score),
            _ => player_id.to_string(),
        }
    }
}

impl<R: BufRead, W: Write> OutcomeCollector for ConsoleCollector<R, W> {
    fn round_started(&mut self, round: RoundNumber, matches: &[Match], board: &ScoreBoard) -> io::Result<()> {
        writeln!(self.output, "{}", format!("Round {}", round).bold())?;
        for m in matches {
            let status = if m.is_recorded() { " (recorded)" } else { "" };
            writeln!(
                self.output,
                "  Board {}: {} vs {}{}",
                m.position + 1,
                Self::describe(board, m.pairing.first),
                Self::describe(board, m.pairing.second),
                status.dimmed()
            )?;
        }
        Ok(())
    }

    fn collect(&mut self, pending: &Match, board: &ScoreBoard) -> io::Result<Outcome> {
        loop {
            write!(
                self.output,
                "Board {}: {} vs {}. Winner id, or both ids for a draw: ",
                pending.position + 1,
                Self::describe(board, pending.pairing.first),
                Self::describe(board, pending.pairing.second)
            )?;
            self.output.flush()?;

            match parse_outcome(&self.read_line()?) {
                Some(outcome) => return Ok(outcome),
                None => writeln!(self.output, "{}", "Enter one id or two ids separated by a space".yellow())?,
            }
        }
    }

    fn rejected(&mut self, _pending: &Match, error: &EngineError) {
        writeln!(self.output, "{}", error.to_string().red()).ok();
    }

    fn round_ended(&mut self, round: RoundNumber) -> io::Result<DateTime<Utc>> {
        loop {
            write!(
                self.output,
                "Round {} ended at ({}, empty for now): ",
                round, END_TIME_FORMAT
            )?;
            self.output.flush()?;

            let line = self.read_line()?;
            if line.is_empty() {
                return Ok(Utc::now());
            }
            match NaiveDateTime::parse_from_str(&line, END_TIME_FORMAT) {
                Ok(ended) => return Ok(ended.and_utc()),
                Err(e) => writeln!(self.output, "{}", format!("Invalid time: {}", e).yellow())?,
            }
        }
    }
}

/// `"12"` is a win for player 12, `"12 7"` a draw between 12 and 7
pub fn parse_outcome(line: &str) -> Option<Outcome> {
    let ids: Vec<PlayerId> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match ids.as_slice() {
        [winner] => Some(Outcome::Win(*winner)),
        [a, b] => Some(Outcome::Draw(*a, *b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::{Datelike, Timelike};

    use super::*;
    use crate::pairing::{ByePolicy, Entrant, Pairing};

    fn board() -> ScoreBoard {
        ScoreBoard::new(
            &[Entrant::new(4, "Lopez Ana", 1), Entrant::new(9, "Smith Ben", 2)],
            ByePolicy::FullPoint,
        )
    }

    #[test]
    fn parses_wins_and_draws() {
        assert_eq!(parse_outcome("4"), Some(Outcome::Win(4)));
        assert_eq!(parse_outcome(" 4   9 "), Some(Outcome::Draw(4, 9)));
        assert_eq!(parse_outcome(""), None);
        assert_eq!(parse_outcome("four"), None);
        assert_eq!(parse_outcome("1 2 3"), None);
    }

    #[test]
    fn collect_reprompts_until_input_parses() {
        let pending = Match::new(1, 1, 0, Pairing::new(4, 9));
        let mut output = Vec::new();
        let mut collector = ConsoleCollector::new(Cursor::new("x\n9\n"), &mut output);

        let outcome = collector.collect(&pending, &board()).unwrap();
        assert_eq!(outcome, Outcome::Win(9));
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Lopez Ana [4]"));
        assert_eq!(shown.matches("Board 1").count(), 2);
    }

    #[test]
    fn closed_input_is_an_error() {
        let pending = Match::new(1, 1, 0, Pairing::new(4, 9));
        let mut collector = ConsoleCollector::new(Cursor::new(""), Vec::new());
        let err = collector.collect(&pending, &board()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn round_end_time_is_parsed() {
        let mut collector = ConsoleCollector::new(Cursor::new("yesterday\n2026-10-03 18:45\n"), Vec::new());
        let ended = collector.round_ended(2).unwrap();
        assert_eq!((ended.month(), ended.day()), (10, 3));
        assert_eq!((ended.hour(), ended.minute()), (18, 45));
    }
}
