use crate::store::StoreData;
use crate::types::Standing;

/// A bracket never needs more than a group's top four.
pub const MAX_CLASSIFIED: usize = 4;

/// A group's classification: points, then set differential, then sets won,
/// all descending, truncated to the top four. The sort is stable, so ties
/// beyond those three keys keep store order.
pub fn group_standings(data: &StoreData, group_id: u32) -> Vec<Standing> {
    let mut rows: Vec<Standing> = data
        .standings
        .iter()
        .filter(|s| s.group_id == group_id)
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.differential().cmp(&a.differential()))
            .then_with(|| b.sets_for.cmp(&a.sets_for))
    });
    rows.truncate(MAX_CLASSIFIED);
    rows
}
