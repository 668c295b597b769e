use log::{debug, info};

use crate::config::*;
use crate::group_by;
use crate::numeric::{mean, sample_std_dev};

pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Records whose votes are outliers within their party.
///
/// The z-score of a record is computed against the mean and the sample
/// standard deviation of the votes of its party over all the constituencies.
/// Records with an undefined z-score (a party with a single record, or with
/// identical votes everywhere) are never reported.
///
/// The result is sorted by decreasing absolute z-score.
pub fn detect_anomalies(records: &[ElectionRecord], z_threshold: f64) -> Vec<AnomalyRecord> {
    info!(
        "detect_anomalies: {:?} records, threshold {}",
        records.len(),
        z_threshold
    );
    let mut res: Vec<AnomalyRecord> = Vec::new();
    for (party, rows) in group_by(records, |r| r.party.as_str()) {
        let values: Vec<f64> = rows.iter().map(|r| r.votes as f64).collect();
        let m = mean(&values);
        let sd = sample_std_dev(&values);
        debug!(
            "detect_anomalies: party {:?}: mean {} std dev {}",
            party, m, sd
        );
        if !(sd.is_finite() && sd > 0.0) {
            continue;
        }
        for r in rows.iter() {
            let z = (r.votes as f64 - m) / sd;
            // NaN compares as false, so it is never flagged.
            if z.abs() > z_threshold {
                res.push(AnomalyRecord {
                    region: r.region.clone(),
                    constituency_name: r.constituency_name.clone(),
                    party: r.party.clone(),
                    votes: r.votes,
                    party_mean: m,
                    party_std_dev: sd,
                    z_score: z,
                });
            }
        }
    }
    res.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn with_outlier() -> Vec<ElectionRecord> {
        let names: Vec<String> = (0..15).map(|i| format!("C{}", i)).collect();
        let mut rows: Vec<(&str, &str, &str, i64, u64)> = names
            .iter()
            .map(|n| ("North", n.as_str(), "A", 100, 10_000))
            .collect();
        rows[7].3 = 1000;
        rows.push(("North", "C0", "Solo", 5000, 10_000));
        records(&rows)
    }

    #[test]
    fn flags_outlier() {
        let a = detect_anomalies(&with_outlier(), DEFAULT_Z_THRESHOLD);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].constituency_name, "C7");
        assert_eq!(a[0].party, "A");
        // With one outlier among n equal values, z = (n - 1) / sqrt(n).
        assert_close(a[0].z_score, 14.0 / 15.0_f64.sqrt());
        assert_close(a[0].party_mean, 160.0);
    }

    #[test]
    fn single_constituency_party_is_not_flagged() {
        let a = detect_anomalies(&with_outlier(), 0.0);
        assert!(a.iter().all(|x| x.party != "Solo"));
        // Every row of party A deviates from the mean.
        assert_eq!(a.len(), 15);
        assert_eq!(a[0].constituency_name, "C7");
    }

    #[test]
    fn zero_variance_is_not_flagged() {
        let rs = records(&[
            ("North", "N1", "A", 10, 100),
            ("North", "N2", "A", 10, 100),
        ]);
        assert!(detect_anomalies(&rs, 0.0).is_empty());
    }

    #[test]
    fn idempotent() {
        let rs = with_outlier();
        assert_eq!(
            detect_anomalies(&rs, 1.0),
            detect_anomalies(&rs, 1.0)
        );
    }
}
