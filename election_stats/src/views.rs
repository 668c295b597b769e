// Views of the dashboard pages: overview, filters, cross-regional table and
// counting progress.

use std::collections::HashMap;

use log::{debug, info};

use crate::config::*;
use crate::numeric::pct;
use crate::{group_by, select_leader};

#[derive(PartialEq, Debug, Clone)]
pub struct Overview {
    pub total_votes: u64,
    pub constituencies: usize,
    pub regions: usize,
    pub parties: usize,
    /// Sum of the electorates, counting every constituency once.
    pub registered_voters: u64,
    pub turnout_pct: f64,
    pub leading_party: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ConstituencyTotal {
    pub constituency_name: String,
    pub region: String,
    pub votes: u64,
}

/// Summed votes by region (rows) and party (columns). Missing cells are 0.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CrossTab {
    pub regions: Vec<String>,
    pub parties: Vec<String>,
    pub cells: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn get(&self, region: &str, party: &str) -> Option<u64> {
        let ri = self.regions.iter().position(|r| r == region)?;
        let pi = self.parties.iter().position(|p| p == party)?;
        Some(self.cells[ri][pi])
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountingProgress {
    /// Number of rows per status. The known statuses are always present; rows
    /// without a status are reported under `None` when there are any.
    pub by_status: Vec<(Option<CountingStatus>, usize)>,
    /// Number of rows per (region, status), for the combinations that occur.
    pub by_region: Vec<(String, Option<CountingStatus>, usize)>,
    /// Counted votes per party. Rows without counted votes contribute nothing.
    pub counted_by_party: Vec<(String, u64)>,
}

fn party_totals(records: &[ElectionRecord]) -> Vec<(&str, u64)> {
    group_by(records, |r| r.party.as_str())
        .into_iter()
        .map(|(party, rows)| (party, rows.iter().map(|r| r.votes).sum()))
        .collect()
}

/// Headline numbers of the home page.
///
/// `total_votes` sums the given records, while the turnout counts every vote
/// cast in the constituencies they cover.
pub fn overview(records: &[ElectionRecord], tie_break: TieBreak) -> Overview {
    info!("overview: processing {:?} records", records.len());
    let by_constituency = group_by(records, |r| r.constituency_name.as_str());
    let registered_voters: u64 = by_constituency
        .iter()
        .map(|(_, rows)| rows[0].total_voters)
        .sum();
    let votes_cast: u64 = by_constituency
        .iter()
        .map(|(_, rows)| rows[0].total_constituency_votes)
        .sum();
    let total_votes: u64 = records.iter().map(|r| r.votes).sum();
    let totals = party_totals(records);
    let leading_party =
        select_leader(&totals, |p| p.1, |p| p.0, tie_break).map(|p| p.0.to_string());
    Overview {
        total_votes,
        constituencies: by_constituency.len(),
        regions: group_by(records, |r| r.region.as_str()).len(),
        parties: totals.len(),
        registered_voters,
        turnout_pct: pct(votes_cast as f64, registered_voters as f64),
        leading_party,
    }
}

/// Keeps the records of the given regions and party. An empty list of regions
/// and a `None` party keep everything.
///
/// The records keep the shares annotated at cleaning time.
pub fn filter(
    records: &[ElectionRecord],
    regions: &[&str],
    party: Option<&str>,
) -> Vec<ElectionRecord> {
    let res: Vec<ElectionRecord> = records
        .iter()
        .filter(|r| regions.is_empty() || regions.contains(&r.region.as_str()))
        .filter(|r| party.map_or(true, |x| r.party == x))
        .cloned()
        .collect();
    debug!(
        "filter: regions {:?} party {:?}: {} -> {} records",
        regions,
        party,
        records.len(),
        res.len()
    );
    res
}

/// The `n` constituencies with the most votes, in decreasing order.
pub fn top_constituencies(records: &[ElectionRecord], n: usize) -> Vec<ConstituencyTotal> {
    let mut res: Vec<ConstituencyTotal> = group_by(records, |r| r.constituency_name.as_str())
        .into_iter()
        .map(|(name, rows)| ConstituencyTotal {
            constituency_name: name.to_string(),
            region: rows[0].region.clone(),
            votes: rows.iter().map(|r| r.votes).sum(),
        })
        .collect();
    res.sort_by(|a, b| b.votes.cmp(&a.votes));
    res.truncate(n);
    res
}

/// Region by party table of the summed votes.
pub fn cross_regional(records: &[ElectionRecord]) -> CrossTab {
    let regions: Vec<String> = group_by(records, |r| r.region.as_str())
        .into_iter()
        .map(|(r, _)| r.to_string())
        .collect();
    let parties: Vec<String> = group_by(records, |r| r.party.as_str())
        .into_iter()
        .map(|(p, _)| p.to_string())
        .collect();
    let region_idx: HashMap<&str, usize> = regions
        .iter()
        .enumerate()
        .map(|(i, r)| (r.as_str(), i))
        .collect();
    let party_idx: HashMap<&str, usize> = parties
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();
    let mut cells = vec![vec![0_u64; parties.len()]; regions.len()];
    for r in records.iter() {
        if let (Some(&ri), Some(&pi)) = (
            region_idx.get(r.region.as_str()),
            party_idx.get(r.party.as_str()),
        ) {
            cells[ri][pi] += r.votes;
        }
    }
    CrossTab {
        regions,
        parties,
        cells,
    }
}

/// State of the count, as shown on the counting page.
pub fn counting_progress(records: &[ElectionRecord]) -> CountingProgress {
    info!("counting_progress: processing {:?} records", records.len());
    let mut by_status: Vec<(Option<CountingStatus>, usize)> = CountingStatus::ALL
        .iter()
        .map(|s| {
            let n = records
                .iter()
                .filter(|r| r.counting_status == Some(*s))
                .count();
            (Some(*s), n)
        })
        .collect();
    let unknown = records
        .iter()
        .filter(|r| r.counting_status.is_none())
        .count();
    if unknown > 0 {
        by_status.push((None, unknown));
    }

    let mut by_region: Vec<(String, Option<CountingStatus>, usize)> = Vec::new();
    for (region, rows) in group_by(records, |r| r.region.as_str()) {
        let statuses = CountingStatus::ALL.iter().map(|s| Some(*s)).chain([None]);
        for status in statuses {
            let n = rows.iter().filter(|r| r.counting_status == status).count();
            if n > 0 {
                by_region.push((region.to_string(), status, n));
            }
        }
    }

    let counted_by_party = group_by(records, |r| r.party.as_str())
        .into_iter()
        .map(|(party, rows)| {
            (
                party.to_string(),
                rows.iter().filter_map(|r| r.counted_votes).sum(),
            )
        })
        .collect();

    CountingProgress {
        by_status,
        by_region,
        counted_by_party,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::{regional_metrics, turnout, winners};

    fn sample() -> Vec<ElectionRecord> {
        records(&[
            ("North", "N1", "A", 600, 2000),
            ("North", "N1", "B", 400, 2000),
            ("North", "N2", "A", 100, 1000),
            ("North", "N2", "B", 300, 1000),
            ("South", "S1", "C", 250, 500),
        ])
    }

    #[test]
    fn overview_numbers() {
        let o = overview(&sample(), TieBreak::FirstEncountered);
        assert_eq!(o.total_votes, 1650);
        assert_eq!(o.constituencies, 3);
        assert_eq!(o.regions, 2);
        assert_eq!(o.parties, 3);
        assert_eq!(o.registered_voters, 3500);
        assert_close(o.turnout_pct, 1650.0 * 100.0 / 3500.0);
        assert_eq!(o.leading_party.as_deref(), Some("A"));
        assert_eq!(overview(&[], TieBreak::FirstEncountered).leading_party, None);
    }

    #[test]
    fn filters_and_top() {
        let rs = sample();
        assert_eq!(filter(&rs, &["North"], None).len(), 4);
        assert_eq!(filter(&rs, &["North"], Some("B")).len(), 2);
        assert_eq!(filter(&rs, &["North", "South"], None).len(), 5);
        assert_eq!(filter(&rs, &["South", "West"], None).len(), 1);
        assert_eq!(filter(&rs, &[], None).len(), 5);
        let top = top_constituencies(&rs, 2);
        let names: Vec<&str> = top.iter().map(|c| c.constituency_name.as_str()).collect();
        assert_eq!(names, vec!["N1", "N2"]);
        assert_eq!(top[0].votes, 1000);
    }

    #[test]
    fn filtered_records_keep_the_constituency_base() {
        let rs = records(&[
            ("North", "X", "A", 600, 2000),
            ("North", "X", "B", 400, 2000),
        ]);
        let only_a = filter(&rs, &[], Some("A"));
        assert_eq!(only_a.len(), 1);
        assert_close(only_a[0].vote_share_pct, 60.0);
        assert_close(winners(&only_a, TieBreak::FirstEncountered)[0].vote_share_pct, 60.0);
        let m = regional_metrics(&only_a, TieBreak::FirstEncountered);
        assert_close(m[0].average_vote_share_pct, 60.0);
        assert_close(turnout(&only_a)[0].turnout_pct, 50.0);
        let o = overview(&only_a, TieBreak::FirstEncountered);
        assert_eq!(o.total_votes, 600);
        assert_close(o.turnout_pct, 50.0);
    }

    #[test]
    fn cross_table_fills_zeros() {
        let t = cross_regional(&sample());
        assert_eq!(t.regions, vec!["North", "South"]);
        assert_eq!(t.parties, vec!["A", "B", "C"]);
        assert_eq!(t.get("North", "A"), Some(700));
        assert_eq!(t.get("South", "A"), Some(0));
        assert_eq!(t.get("South", "C"), Some(250));
        assert_eq!(t.get("West", "C"), None);
    }

    #[test]
    fn counting_statuses() {
        let mut rs = sample();
        rs[0].counting_status = Some(CountingStatus::Complete);
        rs[0].counted_votes = Some(500);
        rs[1].counting_status = Some(CountingStatus::Complete);
        rs[1].counted_votes = Some(350);
        rs[2].counting_status = Some(CountingStatus::Pending);
        rs[3].counting_status = Some(CountingStatus::InProgress);
        rs[3].counted_votes = Some(200);
        let p = counting_progress(&rs);
        assert_eq!(
            p.by_status,
            vec![
                (Some(CountingStatus::Complete), 2),
                (Some(CountingStatus::InProgress), 1),
                (Some(CountingStatus::Pending), 1),
                (None, 1),
            ]
        );
        assert_eq!(
            p.by_region,
            vec![
                ("North".to_string(), Some(CountingStatus::Complete), 2),
                ("North".to_string(), Some(CountingStatus::InProgress), 1),
                ("North".to_string(), Some(CountingStatus::Pending), 1),
                ("South".to_string(), None, 1),
            ]
        );
        assert_eq!(
            p.counted_by_party,
            vec![
                ("A".to_string(), 500),
                ("B".to_string(), 550),
                ("C".to_string(), 0),
            ]
        );
    }
}
