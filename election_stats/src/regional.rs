use std::collections::HashMap;

use log::{debug, info};

use crate::config::*;
use crate::numeric::{mean, pct};
use crate::{group_by, select_leader};

/// Per (region, party) metrics, together with the leading party of each region.
///
/// A party "wins" a constituency when its votes equal the maximum of that
/// constituency, so every party of a tie is credited with the win.
pub fn regional_metrics(records: &[ElectionRecord], tie_break: TieBreak) -> Vec<RegionalMetrics> {
    info!("regional_metrics: processing {:?} records", records.len());
    let mut max_votes: HashMap<&str, u64> = HashMap::new();
    for r in records.iter() {
        let e = max_votes.entry(r.constituency_name.as_str()).or_insert(0);
        *e = (*e).max(r.votes);
    }

    let mut res: Vec<RegionalMetrics> = Vec::new();
    for (region, region_rows) in group_by(records, |r| r.region.as_str()) {
        let region_total: u64 = region_rows.iter().map(|r| r.votes).sum();

        let mut party_totals: Vec<(&str, u64)> = Vec::new();
        let mut rows_by_party: Vec<Vec<&ElectionRecord>> = Vec::new();
        for r in region_rows.iter().copied() {
            match party_totals.iter().position(|(p, _)| *p == r.party) {
                Some(idx) => {
                    party_totals[idx].1 += r.votes;
                    rows_by_party[idx].push(r);
                }
                None => {
                    party_totals.push((r.party.as_str(), r.votes));
                    rows_by_party.push(vec![r]);
                }
            }
        }
        let leading_party = select_leader(&party_totals, |p| p.1, |p| p.0, tie_break)
            .map(|p| p.0.to_string())
            .unwrap_or_default();
        debug!(
            "regional_metrics: region {:?}: total {:?} leader {:?}",
            region, region_total, leading_party
        );

        for ((party, total), rows) in party_totals.iter().zip(rows_by_party.iter()) {
            let shares: Vec<f64> = rows.iter().map(|r| r.vote_share_pct).collect();
            let constituencies_won = rows
                .iter()
                .filter(|r| max_votes.get(r.constituency_name.as_str()) == Some(&r.votes))
                .count();
            res.push(RegionalMetrics {
                region: region.to_string(),
                party: party.to_string(),
                total_votes: *total,
                average_vote_share_pct: mean(&shares),
                constituencies_won,
                regional_vote_share_pct: pct(*total as f64, region_total as f64),
                leading_party: leading_party.clone(),
            });
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn sample() -> Vec<ElectionRecord> {
        records(&[
            ("North", "N1", "A", 600, 2000),
            ("North", "N1", "B", 400, 2000),
            ("North", "N2", "A", 300, 2000),
            ("North", "N2", "B", 300, 2000),
            ("South", "S1", "B", 900, 2000),
            ("South", "S1", "A", 100, 2000),
        ])
    }

    #[test]
    fn metrics_per_region_and_party() {
        let m = regional_metrics(&sample(), TieBreak::FirstEncountered);
        assert_eq!(m.len(), 4);
        let north_a = &m[0];
        assert_eq!((north_a.region.as_str(), north_a.party.as_str()), ("North", "A"));
        assert_eq!(north_a.total_votes, 900);
        assert_close(north_a.average_vote_share_pct, (60.0 + 50.0) / 2.0);
        assert_close(north_a.regional_vote_share_pct, 900.0 * 100.0 / 1600.0);
        assert_eq!(north_a.leading_party, "A");
        assert_eq!(m[3].leading_party, "B");
    }

    #[test]
    fn ties_credit_every_party() {
        let m = regional_metrics(&sample(), TieBreak::FirstEncountered);
        // N2 is a tie between A and B.
        assert_eq!(m[0].constituencies_won, 2);
        assert_eq!(m[1].constituencies_won, 1);
    }

    #[test]
    fn repeated_calls_agree() {
        let rs = sample();
        assert_eq!(
            regional_metrics(&rs, TieBreak::FirstEncountered),
            regional_metrics(&rs, TieBreak::FirstEncountered)
        );
        assert_eq!(
            regional_metrics(&rs, TieBreak::PartyName),
            regional_metrics(&rs, TieBreak::PartyName)
        );
    }

    #[test]
    fn leading_party_tie_break() {
        let rs = records(&[
            ("North", "N1", "B", 500, 2000),
            ("North", "N1", "A", 500, 2000),
        ]);
        let first = regional_metrics(&rs, TieBreak::FirstEncountered);
        assert!(first.iter().all(|m| m.leading_party == "B"));
        let by_name = regional_metrics(&rs, TieBreak::PartyName);
        assert!(by_name.iter().all(|m| m.leading_party == "A"));
    }
}
