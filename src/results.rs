use crate::error::ApiError;
use crate::store::StoreData;
use crate::types::*;

/// Record a finished match: persist the set scores, decide the winner, and
/// push the winner into the linked slot of the next match. The caller wraps
/// this in one store transaction, so scoring and propagation land together
/// or not at all. Re-running the same recording is harmless: the next
/// match's slot is only written while still empty.
pub fn record_result(
    data: &mut StoreData,
    match_id: u32,
    request: &MatchResultRequest,
    now: &str,
) -> Result<u32, ApiError> {
    let (team1, team2, next_match, next_slot) = {
        let row = data
            .matches
            .get(&match_id)
            .ok_or(ApiError::MatchNotFound(match_id))?;
        (row.team1, row.team2, row.next_match, row.next_slot)
    };

    let mut sets = [SetScore::default(); SETS_PER_MATCH];
    for (slot, set) in sets.iter_mut().zip(request.sets.iter()) {
        *slot = *set;
    }

    let winner = decide_winner(team1, team2, &sets, request.winner)?;

    let row = data
        .matches
        .get_mut(&match_id)
        .ok_or(ApiError::MatchNotFound(match_id))?;
    row.sets = sets;
    row.status = STATUS_FINALIZED.to_string();
    row.winner = Some(winner);
    row.updated_at = Some(now.to_string());

    if let (Some(next_id), Some(slot)) = (next_match, next_slot) {
        let next = data.matches.get_mut(&next_id).ok_or_else(|| {
            ApiError::Storage(format!("match {match_id} links to missing match {next_id}"))
        })?;
        let target = if slot == 1 {
            &mut next.team1
        } else {
            &mut next.team2
        };
        // A sibling branch may already occupy the slot; never overwrite.
        if target.is_none() {
            *target = Some(winner);
        }
    }

    Ok(winner)
}

/// Count set wins per side — a set only counts when both sides scored and
/// one scored strictly more — then pick the side with more sets, unless an
/// explicit winner overrides the count.
fn decide_winner(
    team1: Option<u32>,
    team2: Option<u32>,
    sets: &[SetScore; SETS_PER_MATCH],
    explicit: Option<u32>,
) -> Result<u32, ApiError> {
    if let Some(winner) = explicit {
        if team1 == Some(winner) || team2 == Some(winner) {
            return Ok(winner);
        }
        return Err(ApiError::InvalidWinner);
    }

    let mut wins1 = 0u8;
    let mut wins2 = 0u8;
    for set in sets {
        if let (Some(a), Some(b)) = (set.team1, set.team2) {
            if a > b {
                wins1 += 1;
            } else if b > a {
                wins2 += 1;
            }
        }
    }

    if wins1 > wins2 {
        team1.ok_or(ApiError::WinnerUndetermined)
    } else if wins2 > wins1 {
        team2.ok_or(ApiError::WinnerUndetermined)
    } else {
        Err(ApiError::WinnerUndetermined)
    }
}
