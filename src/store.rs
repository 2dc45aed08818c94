use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::error::ApiError;
use crate::types::*;

// ── Tables ─────────────────────────────────────────────────────────────

/// All rows the engine reads and writes. The whole thing is `Clone` so a
/// transaction can work on a snapshot and commit by swapping it back.
#[derive(Debug, Clone, Default)]
pub struct StoreData {
    pub tournaments: HashMap<u32, Tournament>,
    pub players: HashMap<u32, Player>,
    pub teams: HashMap<u32, Team>,
    pub groups: HashMap<u32, Group>,
    pub group_matches: HashMap<u32, GroupMatch>,
    pub matches: HashMap<u32, PlayoffMatch>,
    pub ranking: HashMap<u32, RankingEntry>,
    pub standings: Vec<Standing>,
    next_match_id: u32,
    next_ranking_id: u32,
}

impl StoreData {
    pub fn insert_match(&mut self, mut row: PlayoffMatch) -> u32 {
        self.next_match_id += 1;
        row.id = self.next_match_id;
        self.matches.insert(row.id, row);
        self.next_match_id
    }

    pub fn insert_ranking_entry(&mut self, mut row: RankingEntry) -> u32 {
        self.next_ranking_id += 1;
        row.id = self.next_ranking_id;
        self.ranking.insert(row.id, row);
        self.next_ranking_id
    }

    /// Groups of a tournament, sorted lexicographically by name — the order
    /// cross-group pairing consumes them in.
    pub fn groups_of(&self, tournament_id: u32) -> Vec<Group> {
        let mut groups: Vec<Group> = self
            .groups
            .values()
            .filter(|g| g.tournament_id == tournament_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    pub fn pending_group_matches(&self, group_ids: &HashSet<u32>) -> usize {
        self.group_matches
            .values()
            .filter(|m| group_ids.contains(&m.group_id) && !is_finalized(&m.status))
            .count()
    }

    /// Play-off matches of a tournament, ordered by (round, position).
    pub fn matches_of(&self, tournament_id: u32) -> Vec<PlayoffMatch> {
        let mut matches: Vec<PlayoffMatch> = self
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.position));
        matches
    }

    /// Participating teams: the union of teams drawn into the tournament's
    /// groups and teams inscribed directly, deduplicated.
    pub fn participants_of(&self, tournament_id: u32) -> Vec<u32> {
        let group_ids: HashSet<u32> = self
            .groups
            .values()
            .filter(|g| g.tournament_id == tournament_id)
            .map(|g| g.id)
            .collect();
        let mut ids: Vec<u32> = self
            .teams
            .values()
            .filter(|t| {
                t.tournament_id == Some(tournament_id)
                    || t.group_id.map(|g| group_ids.contains(&g)).unwrap_or(false)
            })
            .map(|t| t.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Display name for a team: partner surnames, or a plain id fallback
    /// when the player rows are not on file.
    pub fn team_label(&self, team_id: u32) -> String {
        let Some(team) = self.teams.get(&team_id) else {
            return format!("Team {team_id}");
        };
        match (
            self.players.get(&team.player1_id),
            self.players.get(&team.player2_id),
        ) {
            (Some(p1), Some(p2)) => format!("{} / {}", p1.surname, p2.surname),
            _ => format!("Team {team_id}"),
        }
    }
}

// ── Store ──────────────────────────────────────────────────────────────

/// Transactional wrapper: every multi-step mutation runs against a snapshot
/// that only replaces the live data when the closure succeeds. Holding the
/// mutex for the whole closure serializes writers, which also covers the
/// per-match lock that result recording needs.
#[derive(Default)]
pub struct Store {
    inner: Mutex<StoreData>,
}

impl Store {
    pub fn new(data: StoreData) -> Self {
        Store {
            inner: Mutex::new(data),
        }
    }

    pub fn transaction<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut StoreData) -> Result<T, ApiError>,
    {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }

    pub fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&StoreData) -> T,
    {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }
}

// ── Fixtures ───────────────────────────────────────────────────────────

/// Seed data for test mode: the rows the (out-of-scope) registration and
/// group-stage machinery would otherwise have written.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    pub tournaments: Vec<Tournament>,
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub groups: Vec<Group>,
    pub group_matches: Vec<GroupMatch>,
    pub standings: Vec<Standing>,
}

impl StoreData {
    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut data = StoreData::default();
        for row in fixture.tournaments {
            data.tournaments.insert(row.id, row);
        }
        for row in fixture.players {
            data.players.insert(row.id, row);
        }
        for row in fixture.teams {
            data.teams.insert(row.id, row);
        }
        for row in fixture.groups {
            data.groups.insert(row.id, row);
        }
        for row in fixture.group_matches {
            data.group_matches.insert(row.id, row);
        }
        data.standings = fixture.standings;
        data
    }
}

pub fn load_fixture(path: &Path) -> Result<Fixture, String> {
    let data =
        fs::read_to_string(path).map_err(|e| format!("read fixture {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("parse fixture {}: {e}", path.display()))
}
