// Head-to-head standings over accumulated roster statistics.
//
// Nine categories: FG%, FT%, points, assists, rebounds, steals, blocks,
// threes (higher wins) and turnovers (lower wins). Each participant earns a
// point per category per opponent where they strictly beat that opponent;
// standings sort descending by total.

use serde::Serialize;

use crate::auction::participant::{CumulativeStats, Participant};

/// Number of scored statistical categories.
pub const CATEGORY_COUNT: usize = 9;

/// One row of the standings table.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    /// Index into the auction's fixed participant order.
    pub participant: usize,
    pub name: String,
    /// Head-to-head points summed across all opponents.
    pub points: u32,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// Count the categories in which `a` strictly beats `b`.
///
/// Turnovers are inverted: fewer is the win. Equal values score for neither
/// side in any category.
pub fn head_to_head_points(a: &CumulativeStats, b: &CumulativeStats) -> u32 {
    let higher_wins = [
        (a.fg_pct(), b.fg_pct()),
        (a.ft_pct(), b.ft_pct()),
        (a.points, b.points),
        (a.assists, b.assists),
        (a.rebounds, b.rebounds),
        (a.steals, b.steals),
        (a.blocks, b.blocks),
        (a.threes, b.threes),
    ];

    let mut points = 0;
    for (ours, theirs) in higher_wins {
        if ours > theirs {
            points += 1;
        }
    }
    if a.turnovers < b.turnovers {
        points += 1;
    }
    points
}

/// Compute standings for the full participant list.
///
/// The sort is stable, so participants tied on head-to-head points keep
/// their prior relative order; ties are intentionally not broken further.
pub fn standings(participants: &[Participant]) -> Vec<Standing> {
    let mut rows: Vec<Standing> = participants
        .iter()
        .enumerate()
        .map(|(i, participant)| {
            let points = participants
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, opponent)| head_to_head_points(&participant.totals, &opponent.totals))
                .sum();
            Standing {
                participant: i,
                name: participant.name.clone(),
                points,
                rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.points.cmp(&a.points));
    for (position, row) in rows.iter_mut().enumerate() {
        row.rank = position + 1;
    }
    rows
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
