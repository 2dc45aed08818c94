use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

use crate::error::ApiError;
use crate::standings::group_standings;
use crate::store::StoreData;
use crate::types::*;

// ── Seed builder ───────────────────────────────────────────────────────

/// Derive the initial play-off round and its pairings from the finalized
/// group standings. Pure: reads the store, persists nothing.
pub fn build_seeds(
    data: &StoreData,
    tournament_id: u32,
) -> Result<(Round, Vec<Pairing>), ApiError> {
    if data
        .matches
        .values()
        .any(|m| m.tournament_id == tournament_id)
    {
        return Err(ApiError::BracketAlreadyExists);
    }

    let groups = data.groups_of(tournament_id);
    if groups.is_empty() {
        return Err(ApiError::NoGroups);
    }

    let group_ids: HashSet<u32> = groups.iter().map(|g| g.id).collect();
    let pending = data.pending_group_matches(&group_ids);
    if pending > 0 {
        return Err(ApiError::GroupsIncomplete { pending });
    }

    // groups_of is already in lexicographic name order.
    let ranked: Vec<(String, Vec<Standing>)> = groups
        .iter()
        .map(|g| (g.name.clone(), group_standings(data, g.id)))
        .collect();

    let (round, pairings) = if ranked.len() == 1 {
        single_group_pairings(&ranked[0].1)?
    } else {
        cross_group_pairings(&ranked)?
    };

    if pairings.is_empty() {
        return Err(ApiError::NoPairings);
    }
    Ok((round, pairings))
}

/// One group qualifies directly: four or more classified teams open with
/// semifinals (1v4, 2v3); two or three go straight to a final (1v2).
fn single_group_pairings(ranked: &[Standing]) -> Result<(Round, Vec<Pairing>), ApiError> {
    if ranked.len() < 2 {
        return Err(ApiError::NotEnoughQualifiers);
    }
    if ranked.len() >= 4 {
        let pairings = vec![
            Pairing {
                team1: ranked[0].team_id,
                team2: ranked[3].team_id,
            },
            Pairing {
                team1: ranked[1].team_id,
                team2: ranked[2].team_id,
            },
        ];
        Ok((Round::Semis, pairings))
    } else {
        let pairings = vec![Pairing {
            team1: ranked[0].team_id,
            team2: ranked[1].team_id,
        }];
        Ok((Round::Final, pairings))
    }
}

/// Consecutive group pairs cross their top two: (G1-1st vs G2-2nd) and
/// (G2-1st vs G1-2nd). The initial round follows from the total slot count.
fn cross_group_pairings(
    ranked: &[(String, Vec<Standing>)],
) -> Result<(Round, Vec<Pairing>), ApiError> {
    if ranked.len() % 2 != 0 {
        return Err(ApiError::OddGroupCount {
            count: ranked.len(),
        });
    }

    let short: Vec<&str> = ranked
        .iter()
        .filter(|(_, standings)| standings.len() < 2)
        .map(|(name, _)| name.as_str())
        .collect();
    if !short.is_empty() {
        return Err(ApiError::IncompleteGroup {
            groups: short.join(", "),
        });
    }

    let mut pairings = Vec::with_capacity(ranked.len());
    for pair in ranked.chunks_exact(2) {
        let (_, first) = &pair[0];
        let (_, second) = &pair[1];
        pairings.push(Pairing {
            team1: first[0].team_id,
            team2: second[1].team_id,
        });
        pairings.push(Pairing {
            team1: second[0].team_id,
            team2: first[1].team_id,
        });
    }

    let round = Round::from_slots(pairings.len() * 2);
    Ok((round, pairings))
}

// ── Bracket builder ────────────────────────────────────────────────────

/// Persist the full tree for the given initial pairings: the initial round
/// in pairing order, every downstream round as empty placeholders, and the
/// forward links. Match `i` of a round feeds slot 1 or 2 (even/odd `i`) of
/// match `i / 2` in the next round; final-round matches feed nothing.
pub fn create_bracket(
    data: &mut StoreData,
    tournament_id: u32,
    initial: Round,
    pairings: &[Pairing],
) {
    let rounds = initial.sequence();

    let mut ids_by_round: Vec<Vec<u32>> = Vec::with_capacity(rounds.len());
    let first: Vec<u32> = pairings
        .iter()
        .enumerate()
        .map(|(i, p)| {
            data.insert_match(PlayoffMatch::new(
                tournament_id,
                initial,
                i as u32,
                Some(p.team1),
                Some(p.team2),
            ))
        })
        .collect();
    ids_by_round.push(first);

    for round in &rounds[1..] {
        let prev_count = ids_by_round.last().map(Vec::len).unwrap_or(0);
        let count = prev_count.div_ceil(2);
        let ids: Vec<u32> = (0..count)
            .map(|i| {
                data.insert_match(PlayoffMatch::new(
                    tournament_id,
                    *round,
                    i as u32,
                    None,
                    None,
                ))
            })
            .collect();
        ids_by_round.push(ids);
    }

    for level in 0..ids_by_round.len().saturating_sub(1) {
        for (i, id) in ids_by_round[level].iter().enumerate() {
            let next_id = ids_by_round[level + 1][i / 2];
            if let Some(row) = data.matches.get_mut(id) {
                row.next_match = Some(next_id);
                row.next_slot = Some(if i % 2 == 0 { 1 } else { 2 });
            }
        }
    }
}

/// Seed extraction plus tree creation as one operation; the caller wraps it
/// in a single store transaction so a failure never leaves a partial tree.
pub fn generate_bracket(
    data: &mut StoreData,
    tournament_id: u32,
) -> Result<BracketGenerated, ApiError> {
    if !data.tournaments.contains_key(&tournament_id) {
        return Err(ApiError::TournamentNotFound(tournament_id));
    }
    let (initial_round, pairings) = build_seeds(data, tournament_id)?;
    create_bracket(data, tournament_id, initial_round, &pairings);
    Ok(BracketGenerated {
        initial_round,
        match_count: pairings.len(),
    })
}

// ── Views & reset ──────────────────────────────────────────────────────

/// The bracket grouped by round label, with team names and scores resolved.
/// An empty object when no bracket exists.
pub fn bracket_overview(data: &StoreData, tournament_id: u32) -> Value {
    let mut by_round: BTreeMap<Round, Vec<MatchView>> = BTreeMap::new();
    for row in data.matches_of(tournament_id) {
        by_round.entry(row.round).or_default().push(MatchView {
            id: row.id,
            position: row.position,
            status: row.status.clone(),
            team1: team_ref(data, row.team1),
            team2: team_ref(data, row.team2),
            sets: row.sets,
            winner_id: row.winner,
        });
    }
    let mut rounds = Map::new();
    for (round, views) in by_round {
        rounds.insert(round.label().to_string(), json!(views));
    }
    Value::Object(rounds)
}

fn team_ref(data: &StoreData, team_id: Option<u32>) -> Option<TeamRef> {
    team_id.map(|id| TeamRef {
        id,
        name: data.team_label(id),
    })
}

/// Full reset: removes every play-off match of the tournament.
pub fn delete_bracket(data: &mut StoreData, tournament_id: u32) -> usize {
    let before = data.matches.len();
    data.matches.retain(|_, m| m.tournament_id != tournament_id);
    before - data.matches.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(group_names: &[&str]) -> StoreData {
        let mut data = StoreData::default();
        data.tournaments.insert(
            1,
            Tournament {
                id: 1,
                name: "Torneo Apertura".to_string(),
                category: Some(4),
            },
        );
        for (i, name) in group_names.iter().enumerate() {
            let id = (i + 1) as u32;
            data.groups.insert(
                id,
                Group {
                    id,
                    tournament_id: 1,
                    name: name.to_string(),
                },
            );
        }
        data
    }

    fn add_standing(data: &mut StoreData, group_id: u32, team_id: u32, points: i32) {
        data.standings.push(Standing {
            team_id,
            group_id,
            points,
            sets_for: points,
            sets_against: 0,
        });
    }

    fn add_group_match(data: &mut StoreData, id: u32, group_id: u32, status: &str) {
        data.group_matches.insert(
            id,
            GroupMatch {
                id,
                group_id,
                status: status.to_string(),
            },
        );
    }

    fn matches_in(data: &StoreData, round: Round) -> Vec<PlayoffMatch> {
        let mut rows: Vec<PlayoffMatch> = data
            .matches
            .values()
            .filter(|m| m.round == round)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.position);
        rows
    }

    #[test]
    fn test_two_qualifiers_go_straight_to_final() {
        let mut data = make_data(&["A"]);
        add_standing(&mut data, 1, 10, 6);
        add_standing(&mut data, 1, 11, 3);

        let out = generate_bracket(&mut data, 1).unwrap();
        assert_eq!(out.initial_round, Round::Final);
        assert_eq!(out.match_count, 1);

        let finals = matches_in(&data, Round::Final);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].team1, Some(10));
        assert_eq!(finals[0].team2, Some(11));
        assert_eq!(finals[0].next_match, None);
        assert_eq!(finals[0].next_slot, None);
    }

    #[test]
    fn test_four_qualifiers_open_with_semis() {
        let mut data = make_data(&["A"]);
        for (team, points) in [(10, 9), (11, 6), (12, 4), (13, 1)] {
            add_standing(&mut data, 1, team, points);
        }

        let out = generate_bracket(&mut data, 1).unwrap();
        assert_eq!(out.initial_round, Round::Semis);
        assert_eq!(out.match_count, 2);

        let semis = matches_in(&data, Round::Semis);
        let finals = matches_in(&data, Round::Final);
        assert_eq!(semis.len(), 2);
        assert_eq!(finals.len(), 1);

        // 1st vs 4th, then 2nd vs 3rd.
        assert_eq!(semis[0].team1, Some(10));
        assert_eq!(semis[0].team2, Some(13));
        assert_eq!(semis[1].team1, Some(11));
        assert_eq!(semis[1].team2, Some(12));

        // Both semis feed the final, first into slot 1, second into slot 2.
        assert_eq!(semis[0].next_match, Some(finals[0].id));
        assert_eq!(semis[0].next_slot, Some(1));
        assert_eq!(semis[1].next_match, Some(finals[0].id));
        assert_eq!(semis[1].next_slot, Some(2));

        // The final placeholder is empty and terminal.
        assert_eq!(finals[0].team1, None);
        assert_eq!(finals[0].team2, None);
        assert_eq!(finals[0].next_match, None);
        assert_eq!(finals[0].status, STATUS_NOT_STARTED);
    }

    #[test]
    fn test_two_groups_cross_their_top_two() {
        let mut data = make_data(&["B", "A"]);
        // Group ids: 1="B", 2="A"; lexicographic order puts A first.
        for (team, points) in [(20, 6), (21, 3)] {
            add_standing(&mut data, 2, team, points);
        }
        for (team, points) in [(30, 6), (31, 3)] {
            add_standing(&mut data, 1, team, points);
        }

        let out = generate_bracket(&mut data, 1).unwrap();
        assert_eq!(out.initial_round, Round::Semis);
        assert_eq!(out.match_count, 2);

        let semis = matches_in(&data, Round::Semis);
        assert_eq!(semis[0].team1, Some(20)); // A-1st vs B-2nd
        assert_eq!(semis[0].team2, Some(31));
        assert_eq!(semis[1].team1, Some(30)); // B-1st vs A-2nd
        assert_eq!(semis[1].team2, Some(21));
    }

    #[test]
    fn test_four_groups_open_with_quarters() {
        let mut data = make_data(&["A", "B", "C", "D"]);
        let mut team = 10;
        for group_id in 1..=4 {
            add_standing(&mut data, group_id, team, 6);
            add_standing(&mut data, group_id, team + 1, 3);
            team += 10;
        }

        let out = generate_bracket(&mut data, 1).unwrap();
        assert_eq!(out.initial_round, Round::Cuartos);
        assert_eq!(out.match_count, 4);
        assert_eq!(matches_in(&data, Round::Cuartos).len(), 4);
        assert_eq!(matches_in(&data, Round::Semis).len(), 2);
        assert_eq!(matches_in(&data, Round::Final).len(), 1);

        // Quarterfinal i feeds semifinal i/2.
        let quarters = matches_in(&data, Round::Cuartos);
        let semis = matches_in(&data, Round::Semis);
        assert_eq!(quarters[0].next_match, Some(semis[0].id));
        assert_eq!(quarters[1].next_match, Some(semis[0].id));
        assert_eq!(quarters[2].next_match, Some(semis[1].id));
        assert_eq!(quarters[3].next_match, Some(semis[1].id));
        assert_eq!(quarters[2].next_slot, Some(1));
        assert_eq!(quarters[3].next_slot, Some(2));
    }

    #[test]
    fn test_initial_round_follows_slot_count() {
        assert_eq!(Round::from_slots(16), Round::Octavos);
        assert_eq!(Round::from_slots(8), Round::Cuartos);
        assert_eq!(Round::from_slots(4), Round::Semis);
        assert_eq!(Round::from_slots(2), Round::Final);
    }

    #[test]
    fn test_eight_groups_open_with_octavos() {
        let mut data = make_data(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let mut team = 10;
        for group_id in 1..=8 {
            add_standing(&mut data, group_id, team, 6);
            add_standing(&mut data, group_id, team + 1, 3);
            team += 10;
        }

        let out = generate_bracket(&mut data, 1).unwrap();
        assert_eq!(out.initial_round, Round::Octavos);
        assert_eq!(out.match_count, 8);
        // One initial match per group, then 4 + 2 + 1 placeholders.
        assert_eq!(matches_in(&data, Round::Octavos).len(), 8);
        assert_eq!(matches_in(&data, Round::Cuartos).len(), 4);
        assert_eq!(matches_in(&data, Round::Semis).len(), 2);
        assert_eq!(matches_in(&data, Round::Final).len(), 1);

        // Every non-final match carries a forward link, the final none.
        for row in data.matches.values() {
            if row.round == Round::Final {
                assert_eq!(row.next_match, None);
                assert_eq!(row.next_slot, None);
            } else {
                assert!(row.next_match.is_some());
                assert!(row.next_slot.is_some());
            }
        }
    }

    #[test]
    fn test_second_generation_is_rejected_and_changes_nothing() {
        let mut data = make_data(&["A"]);
        add_standing(&mut data, 1, 10, 6);
        add_standing(&mut data, 1, 11, 3);

        generate_bracket(&mut data, 1).unwrap();
        let snapshot = data.matches_of(1);

        let err = generate_bracket(&mut data, 1).unwrap_err();
        assert_eq!(err, ApiError::BracketAlreadyExists);
        assert_eq!(data.matches_of(1).len(), snapshot.len());
    }

    #[test]
    fn test_pending_group_match_blocks_generation() {
        let mut data = make_data(&["A"]);
        add_standing(&mut data, 1, 10, 6);
        add_standing(&mut data, 1, 11, 3);
        add_group_match(&mut data, 1, 1, " Finalized ");
        add_group_match(&mut data, 2, 1, "FINALIZED");
        add_group_match(&mut data, 3, 1, STATUS_IN_PROGRESS);

        let err = generate_bracket(&mut data, 1).unwrap_err();
        assert_eq!(err, ApiError::GroupsIncomplete { pending: 1 });
        assert!(data.matches.is_empty());
    }

    #[test]
    fn test_sloppy_finalized_statuses_pass_the_gate() {
        let mut data = make_data(&["A"]);
        add_standing(&mut data, 1, 10, 6);
        add_standing(&mut data, 1, 11, 3);
        add_group_match(&mut data, 1, 1, "  FinaliZed\t");

        assert!(generate_bracket(&mut data, 1).is_ok());
    }

    #[test]
    fn test_odd_group_count_is_rejected() {
        let mut data = make_data(&["A", "B", "C"]);
        for group_id in 1..=3 {
            add_standing(&mut data, group_id, group_id * 10, 6);
            add_standing(&mut data, group_id, group_id * 10 + 1, 3);
        }

        let err = generate_bracket(&mut data, 1).unwrap_err();
        assert_eq!(err, ApiError::OddGroupCount { count: 3 });
    }

    #[test]
    fn test_incomplete_groups_are_named() {
        let mut data = make_data(&["A", "B"]);
        add_standing(&mut data, 1, 10, 6);
        add_standing(&mut data, 1, 11, 3);
        add_standing(&mut data, 2, 20, 6);

        let err = generate_bracket(&mut data, 1).unwrap_err();
        assert_eq!(
            err,
            ApiError::IncompleteGroup {
                groups: "B".to_string()
            }
        );
    }

    #[test]
    fn test_no_groups_and_missing_tournament() {
        let mut data = make_data(&[]);
        assert_eq!(generate_bracket(&mut data, 1).unwrap_err(), ApiError::NoGroups);
        assert_eq!(
            generate_bracket(&mut data, 7).unwrap_err(),
            ApiError::TournamentNotFound(7)
        );
    }

    #[test]
    fn test_single_qualifier_is_not_enough() {
        let mut data = make_data(&["A"]);
        add_standing(&mut data, 1, 10, 6);

        let err = generate_bracket(&mut data, 1).unwrap_err();
        assert_eq!(err, ApiError::NotEnoughQualifiers);
    }

    #[test]
    fn test_delete_bracket_resets_everything() {
        let mut data = make_data(&["A"]);
        add_standing(&mut data, 1, 10, 6);
        add_standing(&mut data, 1, 11, 3);
        generate_bracket(&mut data, 1).unwrap();

        let deleted = delete_bracket(&mut data, 1);
        assert_eq!(deleted, 1);
        assert!(data.matches.is_empty());
        assert_eq!(bracket_overview(&data, 1), serde_json::json!({}));
    }
}
