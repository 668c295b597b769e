/*!
Snapshots of cleaned records, and a cache of the tables computed from them.

The cache is owned by the caller and never shared implicitly. It remembers
the fingerprint of the record set it was filled from: handing it a record set
with a different fingerprint drops every cached table before computing again.

```
use election_stats::cache::{AggregateCache, RecordSet};
use election_stats::{RawRecord, TieBreak};

let raw = vec![RawRecord {
    region: Some("North".to_string()),
    constituency_name: Some("X".to_string()),
    party: Some("Party A".to_string()),
    votes: Some(600),
    total_voters: Some(2000),
    ..RawRecord::default()
}];
let set = RecordSet::from_raw(&raw);
let mut cache = AggregateCache::new();
let first = cache.winners(&set, TieBreak::FirstEncountered).to_vec();
let again = cache.winners(&set, TieBreak::FirstEncountered).to_vec();
assert_eq!(first, again);
assert_eq!(cache.hits(), 1);
```
*/

use std::collections::HashMap;

use log::{debug, info};

use crate::*;

/// An immutable snapshot of cleaned records.
#[derive(PartialEq, Debug, Clone)]
pub struct RecordSet {
    records: Vec<ElectionRecord>,
    fingerprint: String,
}

impl RecordSet {
    pub fn new(records: Vec<ElectionRecord>) -> RecordSet {
        let fingerprint = fingerprint_of(&records);
        debug!(
            "RecordSet::new: {} records, fingerprint {}",
            records.len(),
            fingerprint
        );
        RecordSet {
            records,
            fingerprint,
        }
    }

    /// Cleans the rows and takes a snapshot of the result.
    pub fn from_raw(raw: &[RawRecord]) -> RecordSet {
        RecordSet::new(clean(raw))
    }

    pub fn records(&self) -> &[ElectionRecord] {
        &self.records
    }

    /// SHA-256 of the canonical text form of the records, in order.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn fingerprint_of(records: &[ElectionRecord]) -> String {
    let mut canonical = String::new();
    for r in records.iter() {
        canonical.push_str(&format!(
            "{:?}\t{:?}\t{:?}\t{}\t{}\t{:?}\t{:?}\t{:?}\n",
            r.region,
            r.constituency_name,
            r.party,
            r.votes,
            r.total_voters,
            r.timestamp.map(|ts| ts.to_rfc3339()),
            r.counting_status,
            r.counted_votes
        ));
    }
    sha256::digest(canonical)
}

/// Tables computed from one record set, keyed by operation and parameters.
#[derive(Debug, Default)]
pub struct AggregateCache {
    fingerprint: Option<String>,
    describe: HashMap<GroupKey, Vec<DescriptiveStats>>,
    regional: HashMap<TieBreak, Vec<RegionalMetrics>>,
    turnout: Option<Vec<TurnoutStats>>,
    winners: HashMap<TieBreak, Vec<Winner>>,
    margins: HashMap<TieBreak, Vec<Margin>>,
    // Keyed by the bit pattern of the threshold.
    anomalies: HashMap<u64, Vec<AnomalyRecord>>,
    hits: usize,
    misses: usize,
}

impl AggregateCache {
    pub fn new() -> AggregateCache {
        AggregateCache::default()
    }

    /// Drops every cached table.
    pub fn invalidate(&mut self) {
        debug!("AggregateCache::invalidate");
        self.fingerprint = None;
        self.describe.clear();
        self.regional.clear();
        self.turnout = None;
        self.winners.clear();
        self.margins.clear();
        self.anomalies.clear();
    }

    /// Invalidates the cache when it was filled from another record set.
    fn sync(&mut self, set: &RecordSet) {
        if self.fingerprint.as_deref() != Some(set.fingerprint()) {
            if self.fingerprint.is_some() {
                info!("AggregateCache: record set changed, invalidating");
            }
            self.invalidate();
            self.fingerprint = Some(set.fingerprint().to_string());
        }
    }

    fn count(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn describe(&mut self, set: &RecordSet, group_key: GroupKey) -> &[DescriptiveStats] {
        self.sync(set);
        let hit = self.describe.contains_key(&group_key);
        self.count(hit);
        self.describe
            .entry(group_key)
            .or_insert_with(|| describe(set.records(), group_key))
    }

    pub fn regional_metrics(&mut self, set: &RecordSet, tie_break: TieBreak) -> &[RegionalMetrics] {
        self.sync(set);
        let hit = self.regional.contains_key(&tie_break);
        self.count(hit);
        self.regional
            .entry(tie_break)
            .or_insert_with(|| regional_metrics(set.records(), tie_break))
    }

    pub fn turnout(&mut self, set: &RecordSet) -> &[TurnoutStats] {
        self.sync(set);
        let hit = self.turnout.is_some();
        self.count(hit);
        self.turnout.get_or_insert_with(|| turnout(set.records()))
    }

    pub fn winners(&mut self, set: &RecordSet, tie_break: TieBreak) -> &[Winner] {
        self.sync(set);
        let hit = self.winners.contains_key(&tie_break);
        self.count(hit);
        self.winners
            .entry(tie_break)
            .or_insert_with(|| winners(set.records(), tie_break))
    }

    pub fn margins(&mut self, set: &RecordSet, tie_break: TieBreak) -> &[Margin] {
        self.sync(set);
        let hit = self.margins.contains_key(&tie_break);
        self.count(hit);
        self.margins
            .entry(tie_break)
            .or_insert_with(|| margins(set.records(), tie_break))
    }

    pub fn anomalies(&mut self, set: &RecordSet, z_threshold: f64) -> &[AnomalyRecord] {
        self.sync(set);
        let key = z_threshold.to_bits();
        let hit = self.anomalies.contains_key(&key);
        self.count(hit);
        self.anomalies
            .entry(key)
            .or_insert_with(|| detect_anomalies(set.records(), z_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn set(votes_a: i64) -> RecordSet {
        RecordSet::from_raw(&raw_records(&[
            ("North", "N1", "A", votes_a, 2000),
            ("North", "N1", "B", 400, 2000),
            ("South", "S1", "A", 100, 500),
        ]))
    }

    #[test]
    fn fingerprint_follows_content() {
        assert_eq!(set(600).fingerprint(), set(600).fingerprint());
        assert_ne!(set(600).fingerprint(), set(601).fingerprint());
        assert_eq!(set(600).fingerprint().len(), 64);
        assert_eq!(set(600).len(), 3);
    }

    #[test]
    fn hits_and_misses() {
        let s = set(600);
        let mut cache = AggregateCache::new();
        let first = cache.describe(&s, GroupKey::Party).to_vec();
        let second = cache.describe(&s, GroupKey::Party).to_vec();
        assert_eq!(first, second);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        cache.describe(&s, GroupKey::Region);
        assert_eq!(cache.misses(), 2);
        cache.anomalies(&s, 3.0);
        cache.anomalies(&s, 3.0);
        assert_eq!(cache.hits(), 2);
    }

    #[test]
    fn new_records_invalidate() {
        let mut cache = AggregateCache::new();
        let before = cache.winners(&set(600), TieBreak::FirstEncountered).to_vec();
        assert_eq!(before[0].party, "A");
        let after = cache.winners(&set(300), TieBreak::FirstEncountered).to_vec();
        assert_eq!(after[0].party, "B");
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn explicit_invalidation() {
        let s = set(600);
        let mut cache = AggregateCache::new();
        cache.turnout(&s);
        cache.invalidate();
        cache.turnout(&s);
        assert_eq!(cache.misses(), 2);
    }
}
