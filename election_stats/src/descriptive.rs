use std::collections::HashSet;

use log::{debug, info};

use crate::config::*;
use crate::group_by;
use crate::numeric::{mean, pct, percentile, sample_std_dev, sorted_copy};

/// Summary statistics of the votes of each group.
///
/// Groups are reported in the order in which they first appear. The share
/// columns are relative to the sum over all the groups.
pub fn describe(records: &[ElectionRecord], group_key: GroupKey) -> Vec<DescriptiveStats> {
    info!(
        "describe: {:?} records grouped by {:?}",
        records.len(),
        group_key
    );
    let mut res: Vec<DescriptiveStats> = group_by(records, |r| group_key.key_of(r))
        .into_iter()
        .map(|(group, rows)| describe_group(group, &rows))
        .collect();

    let grand_total: u64 = res.iter().map(|s| s.total).sum();
    let sum_of_means: f64 = res.iter().map(|s| s.mean).sum();
    for s in res.iter_mut() {
        s.share_of_total_pct = pct(s.total as f64, grand_total as f64);
        s.mean_share_pct = pct(s.mean, sum_of_means);
    }
    res
}

fn describe_group(group: &str, rows: &[&ElectionRecord]) -> DescriptiveStats {
    let values: Vec<f64> = rows.iter().map(|r| r.votes as f64).collect();
    let sorted = sorted_copy(&values);
    let m = mean(&values);
    let sd = sample_std_dev(&values);
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let constituencies: HashSet<&str> = rows
        .iter()
        .map(|r| r.constituency_name.as_str())
        .collect();
    let stats = DescriptiveStats {
        group: group.to_string(),
        total: rows.iter().map(|r| r.votes).sum(),
        count: rows.len(),
        mean: m,
        median: percentile(&sorted, 0.5),
        std_dev: sd,
        min: rows.iter().map(|r| r.votes).min().unwrap_or(0),
        max: rows.iter().map(|r| r.votes).max().unwrap_or(0),
        q1,
        q3,
        iqr: q3 - q1,
        coefficient_of_variation: if m == 0.0 { f64::NAN } else { sd / m },
        constituencies: constituencies.len(),
        share_of_total_pct: f64::NAN,
        mean_share_pct: f64::NAN,
    };
    debug!("describe_group: {:?}", stats);
    stats
}
