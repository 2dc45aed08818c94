use crate::config::{AppConfig, CategoryRule};
use crate::error::ApiError;
use crate::store::StoreData;
use crate::types::*;

/// Fold a finished play-off into the cumulative player ranking. Gated on
/// the whole bracket being finalized; generating twice for one tournament
/// is a no-op the second time, detected through the `last_tournament`
/// metadata the first pass wrote.
pub fn generate_ranking(
    data: &mut StoreData,
    tournament_id: u32,
    config: &AppConfig,
) -> Result<RankingOutcome, ApiError> {
    let tournament = data
        .tournaments
        .get(&tournament_id)
        .cloned()
        .ok_or(ApiError::TournamentNotFound(tournament_id))?;

    let fixed_category = match config.category_rule {
        CategoryRule::Fixed => Some(tournament.category.ok_or(ApiError::CategoryUnresolvable)?),
        CategoryRule::PartnerSum => None,
    };

    let matches = data.matches_of(tournament_id);
    if matches.is_empty() {
        return Err(ApiError::BracketMissing);
    }
    let pending = matches.iter().filter(|m| !is_finalized(&m.status)).count();
    if pending > 0 {
        return Err(ApiError::BracketIncomplete { pending });
    }

    let participants = data.participants_of(tournament_id);
    if participants.is_empty() {
        return Err(ApiError::NoParticipants);
    }

    if data
        .ranking
        .values()
        .any(|e| e.last_tournament == tournament.name)
    {
        return Ok(RankingOutcome {
            tournament: tournament.name,
            players_processed: 0,
        });
    }

    let final_match = matches.iter().find(|m| m.round == Round::Final);
    let champion = final_match.and_then(|m| m.winner);
    let runner_up = final_match.and_then(|m| {
        if m.team1 == champion {
            m.team2
        } else {
            m.team1
        }
    });

    let mut processed = 0usize;
    for team_id in participants {
        let phase = team_phase(&matches, team_id, champion, runner_up);
        let points = config.point_schedule.points(phase);

        let team = data.teams.get(&team_id).cloned().ok_or_else(|| {
            ApiError::Storage(format!("team {team_id} has no row on file"))
        })?;
        let pair = [
            (team.player1_id, team.player2_id),
            (team.player2_id, team.player1_id),
        ];
        for (player_id, partner_id) in pair {
            let player = data.players.get(&player_id).cloned().ok_or_else(|| {
                ApiError::Storage(format!("player {player_id} has no row on file"))
            })?;
            let partner = data.players.get(&partner_id).cloned().ok_or_else(|| {
                ApiError::Storage(format!("player {partner_id} has no row on file"))
            })?;
            let category = match fixed_category {
                Some(category) => category,
                None => player.category + partner.category,
            };
            apply_points(
                data,
                &player,
                &partner,
                category,
                &tournament.name,
                phase,
                points,
            );
            processed += 1;
        }
    }

    Ok(RankingOutcome {
        tournament: tournament.name,
        players_processed: processed,
    })
}

/// Champion and runner-up come straight from the final; everyone else is
/// labelled by the deepest round they appeared in, with teams that never
/// reached the play-off staying at the group stage.
fn team_phase(
    matches: &[PlayoffMatch],
    team_id: u32,
    champion: Option<u32>,
    runner_up: Option<u32>,
) -> Phase {
    if champion == Some(team_id) {
        return Phase::Champion;
    }
    if runner_up == Some(team_id) {
        return Phase::RunnerUp;
    }
    let furthest = matches
        .iter()
        .filter(|m| m.involves(team_id))
        .map(|m| m.round.index())
        .max()
        .unwrap_or(0);
    match furthest {
        // A finalist that is not the champion is the runner-up.
        4 => Phase::RunnerUp,
        3 => Phase::Semifinal,
        2 => Phase::Quarterfinal,
        1 => Phase::RoundOf16,
        _ => Phase::GroupStage,
    }
}

fn apply_points(
    data: &mut StoreData,
    player: &Player,
    partner: &Player,
    category: u32,
    tournament_name: &str,
    phase: Phase,
    points: u32,
) {
    let existing = data
        .ranking
        .iter()
        .find(|(_, e)| e.player_id == player.id && e.category == category)
        .map(|(id, _)| *id);

    let partner_name = format!("{} {}", partner.name, partner.surname);
    match existing {
        Some(id) => {
            if let Some(entry) = data.ranking.get_mut(&id) {
                entry.points += points;
                entry.name = player.name.clone();
                entry.surname = player.surname.clone();
                entry.last_partner = partner_name;
                entry.last_tournament = tournament_name.to_string();
                entry.phase = phase.label().to_string();
            }
        }
        None => {
            data.insert_ranking_entry(RankingEntry {
                id: 0,
                player_id: player.id,
                category,
                name: player.name.clone(),
                surname: player.surname.clone(),
                last_partner: partner_name,
                last_tournament: tournament_name.to_string(),
                phase: phase.label().to_string(),
                points,
            });
        }
    }
}

/// Ranking rows for one category, best first. The ranking is never shown
/// unfiltered: without a category the list is empty.
pub fn list_ranking(data: &StoreData, category: Option<u32>) -> Vec<RankingEntry> {
    let Some(category) = category else {
        return Vec::new();
    };
    let mut rows: Vec<RankingEntry> = data
        .ranking
        .values()
        .filter(|e| e.category == category)
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.surname.cmp(&b.surname))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}
