use chrono::{DateTime, Utc};
use log::debug;

use crate::cache::RecordSet;
pub use crate::config::*;

/// A builder for collecting results row by row.
///
/// The rows are cleaned once, when the record set is built.
///
/// ```
/// pub use election_stats::builder::Builder;
/// # use election_stats::StatsError;
///
/// let mut builder = Builder::new();
/// builder.add_result("North", "X", "Party A", 600, 2000)?;
/// builder.add_result("North", "X", "Party B", 400, 2000)?;
///
/// let set = builder.build();
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.records()[0].vote_share_pct, 60.0);
///
/// # Ok::<(), StatsError>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    _ingestion_time: Option<DateTime<Utc>>,
    _rows: Vec<RawRecord>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Stamps the rows that come without a timestamp.
    pub fn ingestion_time(self, ts: DateTime<Utc>) -> Builder {
        Builder {
            _ingestion_time: Some(ts),
            _rows: self._rows,
        }
    }

    /// Adds the votes of one party in one constituency.
    ///
    /// Unlike rows coming from a data source, which are silently dropped by
    /// the cleaning stage, a row with an empty name is rejected here.
    pub fn add_result(
        &mut self,
        region: &str,
        constituency_name: &str,
        party: &str,
        votes: u64,
        total_voters: u64,
    ) -> Result<(), StatsError> {
        for (field, value) in [
            ("region", region),
            ("constituency_name", constituency_name),
            ("party", party),
        ] {
            if value.trim().is_empty() {
                return Err(StatsError::MalformedInput {
                    reason: format!("empty {} in result row", field),
                });
            }
        }
        let votes = i64::try_from(votes).map_err(|_| StatsError::InvalidParameter {
            name: "votes".to_string(),
            value: votes.to_string(),
        })?;
        self.add_raw(&RawRecord {
            region: Some(region.to_string()),
            constituency_name: Some(constituency_name.to_string()),
            party: Some(party.to_string()),
            votes: Some(votes),
            total_voters: Some(total_voters),
            ..RawRecord::default()
        });
        Ok(())
    }

    /// Adds a row as it comes from a data source.
    pub fn add_raw(&mut self, row: &RawRecord) {
        let mut row = row.clone();
        if row.timestamp.is_none() {
            row.timestamp = self._ingestion_time;
        }
        self._rows.push(row);
    }

    pub fn build(self) -> RecordSet {
        debug!("Builder::build: {} rows", self._rows.len());
        RecordSet::from_raw(&self._rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_names() {
        let mut b = Builder::new();
        assert!(matches!(
            b.add_result("North", "  ", "A", 1, 10),
            Err(StatsError::MalformedInput { .. })
        ));
        assert!(b.add_result("North", "N1", "A", 1, 10).is_ok());
        assert_eq!(b.build().len(), 1);
    }

    #[test]
    fn stamps_ingestion_time() {
        let ts = DateTime::parse_from_rfc3339("2024-05-15T13:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut b = Builder::new().ingestion_time(ts);
        b.add_result("North", "N1", "A", 1, 10).unwrap();
        b.add_raw(&RawRecord {
            votes: None,
            ..RawRecord::default()
        });
        let set = b.build();
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].timestamp, Some(ts));
    }
}
