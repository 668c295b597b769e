use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::config::*;
use crate::numeric::pct;

/// Compares the results of two elections, party by party and constituency by
/// constituency.
///
/// This is an outer join on (constituency, party): rows of the current
/// election come first in their input order, followed by the rows that only
/// exist in the previous election.
///
/// Vote shares are the ones annotated at cleaning time.
/// An absent side counts as zero votes. When the previous election has no
/// votes for the pair, the percentage swing uses a base of 1 vote instead of 0,
/// so that a new party shows a large but finite swing.
pub fn swing(current: &[ElectionRecord], previous: &[ElectionRecord]) -> Vec<SwingRecord> {
    info!(
        "swing: {:?} current records, {:?} previous records",
        current.len(),
        previous.len()
    );
    let mut previous_by_key: HashMap<(&str, &str), &ElectionRecord> = HashMap::new();
    for r in previous.iter() {
        previous_by_key
            .entry((r.constituency_name.as_str(), r.party.as_str()))
            .or_insert(r);
    }

    let mut res: Vec<SwingRecord> = Vec::new();
    let mut matched: HashSet<(&str, &str)> = HashSet::new();
    for r in current.iter() {
        let key = (r.constituency_name.as_str(), r.party.as_str());
        let prev = previous_by_key.get(&key).cloned();
        if prev.is_some() {
            matched.insert(key);
        }
        res.push(swing_row(
            r,
            Some(r.votes),
            prev.map(|p| p.votes),
            r.vote_share_pct,
            prev.map(|p| p.vote_share_pct),
        ));
    }
    for p in previous.iter() {
        // Inserting marks the pair as handled, so a duplicated pair is only reported once.
        if !matched.insert((p.constituency_name.as_str(), p.party.as_str())) {
            continue;
        }
        res.push(swing_row(
            p,
            None,
            Some(p.votes),
            f64::NAN,
            Some(p.vote_share_pct),
        ));
    }
    res
}

fn swing_row(
    r: &ElectionRecord,
    current_votes: Option<u64>,
    previous_votes: Option<u64>,
    current_share: f64,
    previous_share: Option<f64>,
) -> SwingRecord {
    let cur = current_votes.unwrap_or(0);
    let prev = previous_votes.unwrap_or(0);
    let vote_change = cur as i64 - prev as i64;
    let base = if prev == 0 { 1 } else { prev };
    let swing_pct = pct(vote_change as f64, base as f64);
    let current_share_pct = if current_votes.is_some() {
        current_share
    } else {
        0.0
    };
    let previous_share_pct = previous_share.unwrap_or(0.0);
    let res = SwingRecord {
        constituency_name: r.constituency_name.clone(),
        region: r.region.clone(),
        party: r.party.clone(),
        current_votes,
        previous_votes,
        vote_change,
        swing_pct,
        current_share_pct,
        previous_share_pct,
        share_change_pts: current_share_pct - previous_share_pct,
        category: SwingCategory::from_pct(swing_pct),
    };
    debug!("swing_row: {:?}", res);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::filter;

    #[test]
    fn matched_rows() {
        let current = records(&[
            ("North", "N1", "A", 550, 2000),
            ("North", "N1", "B", 450, 2000),
        ]);
        let previous = records(&[
            ("North", "N1", "A", 500, 2000),
            ("North", "N1", "B", 500, 2000),
        ]);
        let s = swing(&current, &previous);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].vote_change, 50);
        assert_close(s[0].swing_pct, 10.0);
        assert_eq!(s[0].category, SwingCategory::StrongGain);
        assert_close(s[0].share_change_pts, 5.0);
        assert_eq!(s[1].vote_change, -50);
        assert_close(s[1].swing_pct, -10.0);
        assert_eq!(s[1].category, SwingCategory::StrongLoss);
    }

    #[test]
    fn shares_of_a_party_slice() {
        let current = records(&[
            ("North", "N1", "A", 550, 2000),
            ("North", "N1", "B", 450, 2000),
        ]);
        let previous = records(&[
            ("North", "N1", "A", 500, 2000),
            ("North", "N1", "B", 500, 2000),
        ]);
        let s = swing(&filter(&current, &[], Some("A")), &filter(&previous, &[], Some("A")));
        assert_eq!(s.len(), 1);
        assert_close(s[0].current_share_pct, 55.0);
        assert_close(s[0].share_change_pts, 5.0);
    }

    #[test]
    fn new_party_uses_unit_base() {
        let current = records(&[("North", "N1", "New", 100, 2000)]);
        let s = swing(&current, &[]);
        assert_eq!(s[0].previous_votes, None);
        assert_eq!(s[0].vote_change, 100);
        assert_eq!(s[0].swing_pct, 10000.0);
        assert_eq!(s[0].category, SwingCategory::StrongGain);
    }

    #[test]
    fn vanished_party_is_kept() {
        let current = records(&[("North", "N1", "A", 100, 2000)]);
        let previous = records(&[
            ("North", "N1", "A", 100, 2000),
            ("North", "N1", "Gone", 40, 2000),
        ]);
        let s = swing(&current, &previous);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].vote_change, 0);
        assert_eq!(s[0].category, SwingCategory::Loss);
        assert_eq!(s[1].party, "Gone");
        assert_eq!(s[1].current_votes, None);
        assert_eq!(s[1].vote_change, -40);
        assert_close(s[1].swing_pct, -100.0);
    }

    #[test]
    fn category_bands() {
        assert_eq!(SwingCategory::from_pct(5.0), SwingCategory::Gain);
        assert_eq!(SwingCategory::from_pct(5.01), SwingCategory::StrongGain);
        assert_eq!(SwingCategory::from_pct(0.0), SwingCategory::Loss);
        assert_eq!(SwingCategory::from_pct(-4.99), SwingCategory::Loss);
        assert_eq!(SwingCategory::from_pct(-5.0), SwingCategory::StrongLoss);
    }
}
