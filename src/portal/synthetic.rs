// A generated election, for demonstrations and tests.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::portal::io_csv::ConstituencyRow;
use crate::portal::*;

pub const DEFAULT_SEED: u64 = 42;

pub const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];

pub const CONSTITUENCIES_PER_REGION: usize = 20;

/// The parties, with the range of their share of the turnout.
pub const PARTIES: [(&str, f64, f64); 5] = [
    ("Party A", 0.25, 0.35),
    ("Party B", 0.20, 0.30),
    ("Party C", 0.15, 0.25),
    ("Party D", 0.10, 0.20),
    ("Independent", 0.05, 0.15),
];

fn draw_status(rng: &mut StdRng) -> CountingStatus {
    let x: f64 = rng.random();
    if x < 0.70 {
        CountingStatus::Complete
    } else if x < 0.95 {
        CountingStatus::InProgress
    } else {
        CountingStatus::Pending
    }
}

/// Generates the results of every party in every constituency.
///
/// All the rows carry the timestamp `at`. The same seed always produces the
/// same rows.
pub fn generate(seed: u64, at: DateTime<Utc>) -> (Vec<ConstituencyRow>, Vec<RawRecord>) {
    info!("generate: synthetic election with seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut constituencies: Vec<ConstituencyRow> = Vec::new();
    let mut rows: Vec<RawRecord> = Vec::new();
    for region in REGIONS.iter() {
        for const_id in 1..=CONSTITUENCIES_PER_REGION {
            let constituency_name = format!("{} Constituency {}", region, const_id);
            let total_voters: u64 = rng.random_range(50_000..200_000);
            constituencies.push(ConstituencyRow {
                region: region.to_string(),
                constituency_id: Some(const_id.to_string()),
                constituency_name: constituency_name.clone(),
                total_voters: Some(total_voters),
            });
            for (party, low, high) in PARTIES.iter() {
                let turnout: f64 = rng.random_range(0.6..0.85);
                let strength: f64 = rng.random_range(*low..*high);
                let votes = (total_voters as f64 * turnout * strength) as u64;
                let status = draw_status(&mut rng);
                let counted_ratio: f64 = rng.random_range(0.75..0.95);
                rows.push(RawRecord {
                    region: Some(region.to_string()),
                    constituency_name: Some(constituency_name.clone()),
                    party: Some(party.to_string()),
                    votes: Some(votes as i64),
                    total_voters: Some(total_voters),
                    timestamp: Some(at),
                    counting_status: Some(status),
                    counted_votes: Some((votes as f64 * counted_ratio) as u64),
                });
            }
        }
    }
    debug!("generate: {} rows", rows.len());
    (constituencies, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-15T13:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn shape() {
        let (cs, rows) = generate(DEFAULT_SEED, at());
        assert_eq!(cs.len(), 100);
        assert_eq!(rows.len(), 500);
        let records = clean(&rows);
        assert_eq!(records.len(), 500);
        for r in records.iter() {
            assert!((50_000..200_000).contains(&r.total_voters));
            assert!(r.votes <= r.total_voters);
            assert!(r.counted_votes.unwrap_or(0) <= r.votes);
        }
        // The electorate is drawn once per constituency.
        let x: Vec<u64> = records
            .iter()
            .filter(|r| r.constituency_name == "North Constituency 1")
            .map(|r| r.total_voters)
            .collect();
        assert_eq!(x.len(), 5);
        assert!(x.iter().all(|v| *v == x[0]));
    }

    #[test]
    fn seeded() {
        assert_eq!(generate(7, at()), generate(7, at()));
        assert_ne!(generate(7, at()).1, generate(8, at()).1);
    }
}
