use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Every caller-visible failure of the play-off and ranking operations, each
/// with a stable machine-readable code and an HTTP status. "Ranking already
/// generated" is deliberately absent: that is a no-op success, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("A play-off bracket already exists for this tournament.")]
    BracketAlreadyExists,
    #[error("The group stage is not finished; {pending} matches are still open.")]
    GroupsIncomplete { pending: usize },
    #[error("Tournament has no groups.")]
    NoGroups,
    #[error("Not enough classified teams to build a play-off.")]
    NotEnoughQualifiers,
    #[error("Cross-group pairing needs an even number of groups, found {count}.")]
    OddGroupCount { count: usize },
    #[error("Groups without a first and second place: {groups}.")]
    IncompleteGroup { groups: String },
    #[error("No pairings could be computed.")]
    NoPairings,
    #[error("Tournament {0} not found.")]
    TournamentNotFound(u32),
    #[error("Match {0} not found.")]
    MatchNotFound(u32),
    #[error("Tournament has no ranking category.")]
    CategoryUnresolvable,
    #[error("No play-off bracket has been generated for this tournament.")]
    BracketMissing,
    #[error("The play-off is not finished; {pending} matches are still open.")]
    BracketIncomplete { pending: usize },
    #[error("Tournament has no participating teams.")]
    NoParticipants,
    #[error("The declared winner is not one of the match's teams.")]
    InvalidWinner,
    #[error("The winner cannot be determined from the submitted sets.")]
    WinnerUndetermined,
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BracketAlreadyExists => "bracket_already_exists",
            ApiError::GroupsIncomplete { .. } => "groups_incomplete",
            ApiError::NoGroups => "no_groups",
            ApiError::NotEnoughQualifiers => "not_enough_qualifiers",
            ApiError::OddGroupCount { .. } => "odd_group_count",
            ApiError::IncompleteGroup { .. } => "incomplete_group",
            ApiError::NoPairings => "no_pairings",
            ApiError::TournamentNotFound(_) => "tournament_not_found",
            ApiError::MatchNotFound(_) => "match_not_found",
            ApiError::CategoryUnresolvable => "category_unresolvable",
            ApiError::BracketMissing => "bracket_missing",
            ApiError::BracketIncomplete { .. } => "bracket_incomplete",
            ApiError::NoParticipants => "no_participants",
            ApiError::InvalidWinner => "invalid_winner",
            ApiError::WinnerUndetermined => "winner_undetermined",
            ApiError::Storage(_) => "storage",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BracketAlreadyExists
            | ApiError::GroupsIncomplete { .. }
            | ApiError::BracketMissing
            | ApiError::BracketIncomplete { .. } => StatusCode::CONFLICT,
            ApiError::TournamentNotFound(_) | ApiError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}: {self}", self.code());
        }
        let body = Json(json!({ "error": self.code(), "message": self.to_string() }));
        (status, body).into_response()
    }
}
