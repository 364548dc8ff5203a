use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use log::info;

use crate::database::{DocId, DocumentStore, PlayerRecord, players};
use crate::errors::store_context;
use crate::pairing::Entrant;

/// Player bookkeeping outside of any tournament
pub struct PlayerRegistry<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> PlayerRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn add_player(
        &self,
        first_name: &str,
        last_name: &str,
        birth_date: Option<NaiveDate>,
        ranking: u32,
    ) -> Result<PlayerRecord> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            bail!("Player names cannot be empty");
        }
        if ranking == 0 {
            bail!("Ranking must be a positive number");
        }
        let player = players::insert_player(&self.store, first_name.trim(), last_name.trim(), birth_date, ranking)
            .with_context(|| store_context("insert", "player"))?;
        info!("Added player {} ({})", player.display_name(), player.id);
        Ok(player)
    }

    pub fn update_ranking(&self, id: DocId, ranking: u32) -> Result<PlayerRecord> {
        if ranking == 0 {
            bail!("Ranking must be a positive number");
        }
        let player = players::update_ranking(&self.store, id, ranking)
            .with_context(|| store_context("update ranking of", "player"))?;
        info!("Player {} now ranked {}", player.display_name(), ranking);
        Ok(player)
    }

    /// Alphabetical by last name, then first name
    pub fn list_by_name(&self) -> Result<Vec<PlayerRecord>> {
        let mut all = self.list()?;
        all.sort_by(|a, b| {
            (a.last_name.to_lowercase(), a.first_name.to_lowercase())
                .cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase()))
        });
        Ok(all)
    }

    pub fn list_by_ranking(&self) -> Result<Vec<PlayerRecord>> {
        let mut all = self.list()?;
        all.sort_by_key(|p| p.ranking);
        Ok(all)
    }

    fn list(&self) -> Result<Vec<PlayerRecord>> {
        players::list_all(&self.store).with_context(|| store_context("list", "players"))
    }

    /// Snapshot the selected players as tournament entrants
    pub fn roster_for(&self, ids: &[DocId]) -> Result<Vec<Entrant>> {
        ids.iter()
            .map(|&id| {
                players::find_by_id(&self.store, id)
                    .with_context(|| store_context("load", "player"))?
                    .map(|p| p.to_entrant())
                    .with_context(|| format!("Player {} does not exist", id))
            })
            .collect()
    }
}
