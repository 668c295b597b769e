use log::{debug, info};

use crate::config::*;
use crate::group_by;
use crate::numeric::pct;

/// Turnout of every constituency, sorted by decreasing turnout.
///
/// The electorate of a constituency is taken from its first record; it is
/// expected to be the same on every row of the constituency. The votes cast
/// are the constituency total annotated at cleaning time, so a slice holding
/// only some parties still reports the turnout of the whole constituency.
pub fn turnout(records: &[ElectionRecord]) -> Vec<TurnoutStats> {
    info!("turnout: processing {:?} records", records.len());
    let mut res: Vec<TurnoutStats> = group_by(records, |r| r.constituency_name.as_str())
        .into_iter()
        .map(|(constituency, rows)| {
            let first = rows[0];
            let votes_cast = first.total_constituency_votes;
            let turnout_pct = pct(votes_cast as f64, first.total_voters as f64);
            TurnoutStats {
                constituency_name: constituency.to_string(),
                region: first.region.clone(),
                total_voters: first.total_voters,
                votes_cast,
                turnout_pct,
                category: TurnoutCategory::from_pct(turnout_pct),
            }
        })
        .collect();
    // Stable: constituencies with the same turnout keep their input order.
    // Undefined turnouts go last.
    res.sort_by(|a, b| match (a.turnout_pct.is_nan(), b.turnout_pct.is_nan()) {
        (false, false) => b.turnout_pct.total_cmp(&a.turnout_pct),
        (x, y) => x.cmp(&y),
    });
    debug!("turnout: {:?} constituencies", res.len());
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn turnout_and_category() {
        let rs = records(&[
            ("North", "X", "Party A", 600, 2000),
            ("North", "X", "Party B", 400, 2000),
        ]);
        let t = turnout(&rs);
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].votes_cast, 1000);
        assert_eq!(t[0].total_voters, 2000);
        assert_close(t[0].turnout_pct, 50.0);
        assert_eq!(t[0].category, Some(TurnoutCategory::Medium));
    }

    #[test]
    fn repeated_calls_agree() {
        let rs = records(&[
            ("North", "A1", "A", 300, 1000),
            ("North", "A1", "B", 200, 1000),
            ("South", "B1", "A", 800, 1000),
            ("South", "C1", "A", 500, 1000),
        ]);
        assert_eq!(turnout(&rs), turnout(&rs));
    }

    #[test]
    fn lower_bounds_are_inclusive() {
        let rs = records(&[
            ("North", "VH", "A", 750, 1000),
            ("North", "H", "A", 600, 1000),
            ("North", "M", "A", 450, 1000),
            ("North", "L", "A", 449, 1000),
        ]);
        let t = turnout(&rs);
        let cats: Vec<(&str, Option<TurnoutCategory>)> = t
            .iter()
            .map(|s| (s.constituency_name.as_str(), s.category))
            .collect();
        assert_eq!(
            cats,
            vec![
                ("VH", Some(TurnoutCategory::VeryHigh)),
                ("H", Some(TurnoutCategory::High)),
                ("M", Some(TurnoutCategory::Medium)),
                ("L", Some(TurnoutCategory::Low)),
            ]
        );
    }

    #[test]
    fn sorted_by_decreasing_turnout() {
        let rs = records(&[
            ("North", "N1", "A", 100, 1000),
            ("North", "N2", "A", 900, 1000),
            ("North", "N3", "A", 500, 1000),
            ("North", "N4", "A", 10, 0),
        ]);
        let t = turnout(&rs);
        let names: Vec<&str> = t.iter().map(|s| s.constituency_name.as_str()).collect();
        assert_eq!(names, vec!["N2", "N3", "N1", "N4"]);
        assert!(t[3].turnout_pct.is_nan());
        assert_eq!(t[3].category, None);
        assert!(turnout(&[]).is_empty());
    }
}
