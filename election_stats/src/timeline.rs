use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use log::{debug, info, warn};

use crate::config::*;
use crate::numeric::mean;

/// Start of the period containing the instant.
///
/// Days start at midnight UTC, weeks on Monday at midnight UTC.
pub fn bucket_start(ts: DateTime<Utc>, period: Period) -> DateTime<Utc> {
    let date = ts.date_naive();
    let naive = match period {
        Period::Hour => {
            date.and_time(NaiveTime::from_hms_opt(ts.hour(), 0, 0).unwrap_or(NaiveTime::MIN))
        }
        Period::Day => date.and_time(NaiveTime::MIN),
        Period::Week => {
            let monday = date - Duration::days(i64::from(ts.weekday().num_days_from_monday()));
            monday.and_time(NaiveTime::MIN)
        }
    };
    Utc.from_utc_datetime(&naive)
}

/// Total and mean votes per (period, party).
///
/// Records without a timestamp are placed in the period of the current time.
/// See `aggregate_by_period_at`.
pub fn aggregate_by_period(records: &[ElectionRecord], period: Period) -> Vec<PeriodAggregate> {
    aggregate_by_period_at(records, period, Utc::now())
}

/// Total and mean votes per (period, party), with an explicit invocation time.
///
/// All the records without a timestamp collapse into the single bucket that
/// contains `now`. This skews that bucket when many records lack a timestamp,
/// and a warning is logged when it happens.
///
/// The output is sorted by period, then by first appearance of the party.
pub fn aggregate_by_period_at(
    records: &[ElectionRecord],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<PeriodAggregate> {
    info!(
        "aggregate_by_period: {:?} records per {}",
        records.len(),
        period
    );
    let missing = records.iter().filter(|r| r.timestamp.is_none()).count();
    if missing > 0 {
        warn!(
            "aggregate_by_period: {} records without a timestamp are assigned to the current {} ({})",
            missing, period, now
        );
    }

    let mut party_order: HashMap<&str, usize> = HashMap::new();
    let mut index: HashMap<(DateTime<Utc>, &str), usize> = HashMap::new();
    let mut groups: Vec<(DateTime<Utc>, &str, Vec<u64>)> = Vec::new();
    for r in records.iter() {
        let next_party = party_order.len();
        party_order.entry(r.party.as_str()).or_insert(next_party);
        let bucket = bucket_start(r.timestamp.unwrap_or(now), period);
        let key = (bucket, r.party.as_str());
        match index.get(&key) {
            Some(&idx) => groups[idx].2.push(r.votes),
            None => {
                index.insert(key, groups.len());
                groups.push((bucket, r.party.as_str(), vec![r.votes]));
            }
        }
    }
    groups.sort_by_key(|(bucket, party, _)| (*bucket, party_order.get(party).cloned()));

    groups
        .into_iter()
        .map(|(bucket_start, party, votes)| {
            let values: Vec<f64> = votes.iter().map(|v| *v as f64).collect();
            let agg = PeriodAggregate {
                bucket_start,
                party: party.to_string(),
                total_votes: votes.iter().sum(),
                mean_votes: mean(&values),
                record_count: votes.len(),
            };
            debug!("aggregate_by_period: {:?}", agg);
            agg
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .unwrap()
    }

    #[test]
    fn buckets() {
        // A Wednesday.
        let ts = at("2024-05-15T13:47:12Z");
        assert_eq!(bucket_start(ts, Period::Hour), at("2024-05-15T13:00:00Z"));
        assert_eq!(bucket_start(ts, Period::Day), at("2024-05-15T00:00:00Z"));
        assert_eq!(bucket_start(ts, Period::Week), at("2024-05-13T00:00:00Z"));
    }

    #[test]
    fn rollup_by_day() {
        let mut rs = records(&[
            ("North", "N1", "A", 100, 1000),
            ("North", "N1", "B", 50, 1000),
            ("North", "N2", "A", 300, 1000),
            ("North", "N2", "B", 70, 1000),
        ]);
        rs[0].timestamp = Some(at("2024-05-15T08:00:00Z"));
        rs[1].timestamp = Some(at("2024-05-15T09:00:00Z"));
        rs[2].timestamp = Some(at("2024-05-15T20:00:00Z"));
        rs[3].timestamp = Some(at("2024-05-14T23:59:59Z"));
        let agg = aggregate_by_period_at(&rs, Period::Day, at("2024-06-01T00:00:00Z"));
        let rows: Vec<(DateTime<Utc>, &str, u64, usize)> = agg
            .iter()
            .map(|a| (a.bucket_start, a.party.as_str(), a.total_votes, a.record_count))
            .collect();
        assert_eq!(
            rows,
            vec![
                (at("2024-05-14T00:00:00Z"), "B", 70, 1),
                (at("2024-05-15T00:00:00Z"), "A", 400, 2),
                (at("2024-05-15T00:00:00Z"), "B", 50, 1),
            ]
        );
        assert_close(agg[1].mean_votes, 200.0);
    }

    #[test]
    fn missing_timestamps_collapse_into_now() {
        let rs = records(&[
            ("North", "N1", "A", 100, 1000),
            ("North", "N2", "A", 300, 1000),
        ]);
        let now = at("2024-05-15T13:47:12Z");
        let agg = aggregate_by_period_at(&rs, Period::Hour, now);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg[0].bucket_start, at("2024-05-15T13:00:00Z"));
        assert_eq!(agg[0].total_votes, 400);
    }
}
