use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::Store;

// ── Constants ──────────────────────────────────────────────────────────

pub const STATUS_NOT_STARTED: &str = "not_started";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_FINALIZED: &str = "finalized";

pub const SETS_PER_MATCH: usize = 3;

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedStore = Arc<Store>;

/// The one finalization predicate used by every completeness gate. Group
/// matches are written by the fixture generator and their status strings are
/// not trustworthy, so the comparison ignores case and surrounding
/// whitespace.
pub fn is_finalized(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case(STATUS_FINALIZED)
}

// ── Rounds ─────────────────────────────────────────────────────────────

/// Play-off rounds in bracket order. The ordering is total, so "rounds after
/// X" is a plain slice of `ALL`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Round {
    Octavos,
    Cuartos,
    Semis,
    Final,
}

impl Round {
    pub const ALL: [Round; 4] = [Round::Octavos, Round::Cuartos, Round::Semis, Round::Final];

    pub fn label(self) -> &'static str {
        match self {
            Round::Octavos => "OCTAVOS",
            Round::Cuartos => "CUARTOS",
            Round::Semis => "SEMIS",
            Round::Final => "FINAL",
        }
    }

    /// Depth index used by the ranking walk: OCTAVOS=1 .. FINAL=4.
    pub fn index(self) -> u8 {
        match self {
            Round::Octavos => 1,
            Round::Cuartos => 2,
            Round::Semis => 3,
            Round::Final => 4,
        }
    }

    /// Initial round for a bracket with `slots` total qualifier slots.
    pub fn from_slots(slots: usize) -> Round {
        match slots {
            16 => Round::Octavos,
            8 => Round::Cuartos,
            4 => Round::Semis,
            _ => Round::Final,
        }
    }

    /// The rounds from this one through the final, inclusive.
    pub fn sequence(self) -> &'static [Round] {
        let start = Round::ALL.iter().position(|r| *r == self).unwrap_or(0);
        &Round::ALL[start..]
    }

    pub fn next(self) -> Option<Round> {
        let pos = Round::ALL.iter().position(|r| *r == self)?;
        Round::ALL.get(pos + 1).copied()
    }
}

// ── Ranking phases ─────────────────────────────────────────────────────

/// How far a team got. Champion and runner-up come from the final match;
/// everything else from the deepest round the team appeared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Champion,
    RunnerUp,
    Semifinal,
    Quarterfinal,
    RoundOf16,
    GroupStage,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Champion => "champion",
            Phase::RunnerUp => "runner-up",
            Phase::Semifinal => "semifinal",
            Phase::Quarterfinal => "quarterfinal",
            Phase::RoundOf16 => "round-of-16",
            Phase::GroupStage => "group stage",
        }
    }
}

// ── Domain rows ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: u32,
    pub name: String,
    /// Fixed ranking category; `None` when the tournament ranks by partner
    /// category sums instead.
    pub category: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub surname: String,
    pub category: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: u32,
    /// Direct inscription to a tournament, if any.
    pub tournament_id: Option<u32>,
    /// Group the team was drawn into, if any. Inscription and group
    /// placement can legitimately disagree; participants are the union.
    pub group_id: Option<u32>,
    pub player1_id: u32,
    pub player2_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: u32,
    pub tournament_id: u32,
    pub name: String,
}

/// Group-stage match as written by the fixture generator. Only the status
/// matters here; scores live with the group-stage machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMatch {
    pub id: u32,
    pub group_id: u32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub team_id: u32,
    pub group_id: u32,
    pub points: i32,
    pub sets_for: i32,
    pub sets_against: i32,
}

impl Standing {
    pub fn differential(&self) -> i32 {
        self.sets_for - self.sets_against
    }
}

/// One set's score, nullable per side until played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub team1: Option<u32>,
    pub team2: Option<u32>,
}

/// A node of the play-off tree. `(round, position)` addresses the node;
/// `next_match` and `next_slot` are set together or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffMatch {
    pub id: u32,
    pub tournament_id: u32,
    pub round: Round,
    pub position: u32,
    pub status: String,
    pub team1: Option<u32>,
    pub team2: Option<u32>,
    pub sets: [SetScore; SETS_PER_MATCH],
    pub winner: Option<u32>,
    pub next_match: Option<u32>,
    pub next_slot: Option<u8>,
    pub updated_at: Option<String>,
}

impl PlayoffMatch {
    pub fn new(
        tournament_id: u32,
        round: Round,
        position: u32,
        team1: Option<u32>,
        team2: Option<u32>,
    ) -> Self {
        PlayoffMatch {
            id: 0,
            tournament_id,
            round,
            position,
            status: STATUS_NOT_STARTED.to_string(),
            team1,
            team2,
            sets: [SetScore::default(); SETS_PER_MATCH],
            winner: None,
            next_match: None,
            next_slot: None,
            updated_at: None,
        }
    }

    pub fn involves(&self, team_id: u32) -> bool {
        self.team1 == Some(team_id) || self.team2 == Some(team_id)
    }
}

/// Cumulative ranking row, one per (player, category). Points only grow;
/// the metadata always reflects the most recent tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub id: u32,
    pub player_id: u32,
    pub category: u32,
    pub name: String,
    pub surname: String,
    pub last_partner: String,
    pub last_tournament: String,
    pub phase: String,
    pub points: u32,
}

// ── Request/response payloads ──────────────────────────────────────────

/// Seed-builder output: one initial-round pairing, local side first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub team1: u32,
    pub team2: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchResultRequest {
    pub sets: Vec<SetScore>,
    pub winner: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketGenerated {
    pub initial_round: Round,
    pub match_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketDeleted {
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultResponse {
    pub winner_id: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingOutcome {
    pub tournament: String,
    pub players_processed: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingQuery {
    pub category: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: u32,
    pub position: u32,
    pub status: String,
    pub team1: Option<TeamRef>,
    pub team2: Option<TeamRef>,
    pub sets: [SetScore; SETS_PER_MATCH],
    pub winner_id: Option<u32>,
}
