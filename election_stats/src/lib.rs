mod anomaly;
pub mod builder;
pub mod cache;
mod cleaning;
mod config;
mod contest;
mod descriptive;
pub mod manual;
mod numeric;
pub mod prediction;
mod regional;
mod swing;
mod timeline;
mod turnout;
mod views;

use std::{collections::HashMap, hash::Hash};

pub use crate::anomaly::*;
pub use crate::cleaning::*;
pub use crate::config::*;
pub use crate::contest::*;
pub use crate::descriptive::*;
pub use crate::regional::*;
pub use crate::swing::*;
pub use crate::timeline::*;
pub use crate::turnout::*;
pub use crate::views::*;

// **** Grouping primitives shared by the aggregations ****

/// Groups the records by key. Groups come out in the order in which their
/// key was first seen, and records keep their input order inside a group.
pub(crate) fn group_by<'a, K, F>(
    records: &'a [ElectionRecord],
    key: F,
) -> Vec<(K, Vec<&'a ElectionRecord>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a ElectionRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a ElectionRecord>)> = Vec::new();
    for r in records.iter() {
        let k = key(r);
        if let Some(&idx) = index.get(&k) {
            groups[idx].1.push(r);
        } else {
            index.insert(k.clone(), groups.len());
            groups.push((k, vec![r]));
        }
    }
    groups
}

/// Total votes cast per constituency. This is the base of every
/// constituency-level vote share.
pub(crate) fn constituency_totals(records: &[ElectionRecord]) -> HashMap<&str, u64> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for r in records.iter() {
        *totals.entry(r.constituency_name.as_str()).or_insert(0) += r.votes;
    }
    totals
}

/// Picks the element with the most votes.
///
/// Under `TieBreak::FirstEncountered`, the first maximum in slice order wins.
/// Under `TieBreak::PartyName`, the smallest name among the maxima wins.
pub(crate) fn select_leader<'a, T, V, N>(
    items: &'a [T],
    votes: V,
    name: N,
    tie_break: TieBreak,
) -> Option<&'a T>
where
    V: Fn(&T) -> u64,
    N: Fn(&T) -> &str,
{
    let mut best: Option<&'a T> = None;
    for item in items.iter() {
        best = match best {
            None => Some(item),
            Some(b) if votes(item) > votes(b) => Some(item),
            Some(b)
                if votes(item) == votes(b)
                    && tie_break == TieBreak::PartyName
                    && name(item) < name(b) =>
            {
                Some(item)
            }
            keep => keep,
        };
    }
    best
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::*;

    /// Cleaned records from (region, constituency, party, votes, total_voters) rows.
    pub fn records(rows: &[(&str, &str, &str, i64, u64)]) -> Vec<ElectionRecord> {
        init_logger();
        clean(&raw_records(rows))
    }

    pub fn raw_records(rows: &[(&str, &str, &str, i64, u64)]) -> Vec<RawRecord> {
        rows.iter()
            .map(|(region, constituency, party, votes, total_voters)| RawRecord {
                region: Some(region.to_string()),
                constituency_name: Some(constituency.to_string()),
                party: Some(party.to_string()),
                votes: Some(*votes),
                total_voters: Some(*total_voters),
                ..RawRecord::default()
            })
            .collect()
    }

    pub fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    pub fn assert_close(left: f64, right: f64) {
        assert!(
            (left - right).abs() < 1e-9,
            "{} and {} are not close",
            left,
            right
        );
    }
}
