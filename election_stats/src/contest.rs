use log::{debug, info};

use crate::config::*;
use crate::group_by;
use crate::numeric::pct;

/// Candidates of one constituency, best first.
///
/// The sort is stable: under `TieBreak::FirstEncountered`, equal vote counts
/// keep the order of the input.
fn ranked<'a>(rows: &[&'a ElectionRecord], tie_break: TieBreak) -> Vec<&'a ElectionRecord> {
    let mut res = rows.to_vec();
    match tie_break {
        TieBreak::FirstEncountered => res.sort_by(|a, b| b.votes.cmp(&a.votes)),
        TieBreak::PartyName => {
            res.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.party.cmp(&b.party)))
        }
    }
    res
}

/// The party with the most votes in every constituency.
///
/// The vote share is the one annotated at cleaning time, relative to every
/// party of the constituency.
pub fn winners(records: &[ElectionRecord], tie_break: TieBreak) -> Vec<Winner> {
    info!("winners: processing {:?} records", records.len());
    group_by(records, |r| r.constituency_name.as_str())
        .into_iter()
        .filter_map(|(constituency, rows)| {
            let best = ranked(&rows, tie_break).into_iter().next()?;
            debug!("winners: {:?} -> {:?}", constituency, best.party);
            Some(Winner {
                constituency_name: constituency.to_string(),
                region: best.region.clone(),
                party: best.party.clone(),
                votes: best.votes,
                vote_share_pct: best.vote_share_pct,
            })
        })
        .collect()
}

/// Compares the two best parties of every constituency.
///
/// The runner-up is the best row of another party, so a constituency with a
/// single distinct party has no runner-up even when that party has several rows.
pub fn margins(records: &[ElectionRecord], tie_break: TieBreak) -> Vec<Margin> {
    info!("margins: processing {:?} records", records.len());
    group_by(records, |r| r.constituency_name.as_str())
        .into_iter()
        .filter_map(|(constituency, rows)| {
            let sorted = ranked(&rows, tie_break);
            let first = *sorted.first()?;
            let second = sorted.iter().find(|r| r.party != first.party);
            let margin = match second {
                Some(second) => {
                    let margin_votes = first.votes - second.votes;
                    let margin_pct = pct(margin_votes as f64, (first.votes + second.votes) as f64);
                    Margin {
                        constituency_name: constituency.to_string(),
                        region: first.region.clone(),
                        winner: first.party.clone(),
                        winner_votes: first.votes,
                        runner_up: Some(second.party.clone()),
                        runner_up_votes: Some(second.votes),
                        margin_votes: Some(margin_votes),
                        margin_pct,
                        category: MarginCategory::from_pct(margin_pct),
                    }
                }
                None => Margin {
                    constituency_name: constituency.to_string(),
                    region: first.region.clone(),
                    winner: first.party.clone(),
                    winner_votes: first.votes,
                    runner_up: None,
                    runner_up_votes: None,
                    margin_votes: None,
                    margin_pct: f64::NAN,
                    category: None,
                },
            };
            debug!("margins: {:?}", margin);
            Some(margin)
        })
        .collect()
}
