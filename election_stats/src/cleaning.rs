use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::*;
use crate::constituency_totals;
use crate::numeric::pct;

/// Turns rows from a data source into election records.
///
/// - exact duplicate rows are removed (the first occurrence is kept)
/// - rows without votes, party, constituency, region or electorate are dropped
/// - rows with negative votes are dropped
/// - party, constituency and region names are trimmed; a name that is empty
///   after trimming counts as missing
///
/// The surviving rows are annotated with the total of their constituency and
/// their vote share in it.
pub fn clean(raw: &[RawRecord]) -> Vec<ElectionRecord> {
    info!("clean: processing {:?} rows", raw.len());
    let mut seen: HashSet<&RawRecord> = HashSet::new();
    let mut duplicates = 0_usize;
    let mut dropped = 0_usize;
    let mut res: Vec<ElectionRecord> = Vec::new();
    for r in raw.iter() {
        if !seen.insert(r) {
            duplicates += 1;
            continue;
        }
        match validate_row(r) {
            Some(er) => res.push(er),
            None => {
                debug!("clean: dropping row {:?}", r);
                dropped += 1;
            }
        }
    }
    if duplicates > 0 || dropped > 0 {
        warn!(
            "clean: removed {} duplicate rows and {} incomplete or negative rows",
            duplicates, dropped
        );
    }
    annotate_shares(res)
}

fn trimmed(s: &Option<String>) -> Option<String> {
    match s.as_deref().map(str::trim) {
        Some(x) if !x.is_empty() => Some(x.to_string()),
        _ => None,
    }
}

fn validate_row(r: &RawRecord) -> Option<ElectionRecord> {
    let votes = r.votes?;
    if votes < 0 {
        return None;
    }
    Some(ElectionRecord {
        region: trimmed(&r.region)?,
        constituency_name: trimmed(&r.constituency_name)?,
        party: trimmed(&r.party)?,
        votes: votes as u64,
        total_voters: r.total_voters?,
        timestamp: r.timestamp,
        counting_status: r.counting_status,
        counted_votes: r.counted_votes,
        total_constituency_votes: 0,
        vote_share_pct: f64::NAN,
    })
}

/// Recomputes the constituency totals and vote shares of the records.
pub fn annotate_shares(records: Vec<ElectionRecord>) -> Vec<ElectionRecord> {
    let totals: Vec<u64> = {
        let by_constituency = constituency_totals(&records);
        records
            .iter()
            .map(|r| {
                by_constituency
                    .get(r.constituency_name.as_str())
                    .cloned()
                    .unwrap_or(0)
            })
            .collect()
    };
    records
        .into_iter()
        .zip(totals)
        .map(|(r, total)| ElectionRecord {
            total_constituency_votes: total,
            vote_share_pct: pct(r.votes as f64, total as f64),
            ..r
        })
        .collect()
}
