// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Progress of the count in a constituency, as reported by the data source.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CountingStatus {
    Complete,
    InProgress,
    Pending,
}

impl CountingStatus {
    pub const ALL: [CountingStatus; 3] = [
        CountingStatus::Complete,
        CountingStatus::InProgress,
        CountingStatus::Pending,
    ];
}

impl Display for CountingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountingStatus::Complete => write!(f, "Complete"),
            CountingStatus::InProgress => write!(f, "In Progress"),
            CountingStatus::Pending => write!(f, "Pending"),
        }
    }
}

impl FromStr for CountingStatus {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace(|c: char| c == '_' || c == '-', " ");
        match normalized.as_str() {
            "complete" => Ok(CountingStatus::Complete),
            "in progress" | "inprogress" => Ok(CountingStatus::InProgress),
            "pending" => Ok(CountingStatus::Pending),
            _ => Err(StatsError::MalformedInput {
                reason: format!("unknown counting status {:?}", s),
            }),
        }
    }
}

/// A row as handed over by a data source, before cleaning.
///
/// Every field the cleaning stage may reject is optional. Votes are signed so
/// that negative counts coming from a faulty source can be detected and
/// dropped instead of failing the parse.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct RawRecord {
    pub region: Option<String>,
    pub constituency_name: Option<String>,
    pub party: Option<String>,
    pub votes: Option<i64>,
    pub total_voters: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub counting_status: Option<CountingStatus>,
    pub counted_votes: Option<u64>,
}

/// One cleaned row: the votes of one party in one constituency.
#[derive(PartialEq, Debug, Clone)]
pub struct ElectionRecord {
    pub region: String,
    pub constituency_name: String,
    pub party: String,
    pub votes: u64,
    /// Registered electorate of the constituency.
    pub total_voters: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub counting_status: Option<CountingStatus>,
    pub counted_votes: Option<u64>,
    /// Sum of the votes of all the parties in the same constituency.
    pub total_constituency_votes: u64,
    /// NaN when the constituency has no votes at all.
    pub vote_share_pct: f64,
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct DescriptiveStats {
    pub group: String,
    pub total: u64,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: u64,
    pub max: u64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub coefficient_of_variation: f64,
    pub constituencies: usize,
    /// Share of this group in the grand total of votes.
    pub share_of_total_pct: f64,
    /// Share of the mean of this group in the sum of the means of all groups.
    /// Only meaningful for relative comparisons.
    pub mean_share_pct: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RegionalMetrics {
    pub region: String,
    pub party: String,
    pub total_votes: u64,
    pub average_vote_share_pct: f64,
    pub constituencies_won: usize,
    pub regional_vote_share_pct: f64,
    pub leading_party: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TurnoutStats {
    pub constituency_name: String,
    pub region: String,
    pub total_voters: u64,
    pub votes_cast: u64,
    pub turnout_pct: f64,
    pub category: Option<TurnoutCategory>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Winner {
    pub constituency_name: String,
    pub region: String,
    pub party: String,
    pub votes: u64,
    pub vote_share_pct: f64,
}

/// Comparison of the two best parties of a constituency.
///
/// The runner-up fields are `None` when only one party contested.
#[derive(PartialEq, Debug, Clone)]
pub struct Margin {
    pub constituency_name: String,
    pub region: String,
    pub winner: String,
    pub winner_votes: u64,
    pub runner_up: Option<String>,
    pub runner_up_votes: Option<u64>,
    pub margin_votes: Option<u64>,
    pub margin_pct: f64,
    pub category: Option<MarginCategory>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AnomalyRecord {
    pub region: String,
    pub constituency_name: String,
    pub party: String,
    pub votes: u64,
    pub party_mean: f64,
    pub party_std_dev: f64,
    pub z_score: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SwingRecord {
    pub constituency_name: String,
    pub region: String,
    pub party: String,
    pub current_votes: Option<u64>,
    pub previous_votes: Option<u64>,
    pub vote_change: i64,
    pub swing_pct: f64,
    pub current_share_pct: f64,
    pub previous_share_pct: f64,
    /// Difference of the constituency vote shares, in percentage points.
    pub share_change_pts: f64,
    pub category: SwingCategory,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PeriodAggregate {
    pub bucket_start: DateTime<Utc>,
    pub party: String,
    pub total_votes: u64,
    pub mean_votes: f64,
    pub record_count: usize,
}

// ******** Categories *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TurnoutCategory {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl TurnoutCategory {
    /// Bands are inclusive on their lower bound. Undefined turnouts have no category.
    pub fn from_pct(pct: f64) -> Option<TurnoutCategory> {
        if pct.is_nan() {
            None
        } else if pct >= 75.0 {
            Some(TurnoutCategory::VeryHigh)
        } else if pct >= 60.0 {
            Some(TurnoutCategory::High)
        } else if pct >= 45.0 {
            Some(TurnoutCategory::Medium)
        } else {
            Some(TurnoutCategory::Low)
        }
    }
}

impl Display for TurnoutCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnoutCategory::VeryHigh => write!(f, "Very High"),
            TurnoutCategory::High => write!(f, "High"),
            TurnoutCategory::Medium => write!(f, "Medium"),
            TurnoutCategory::Low => write!(f, "Low"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MarginCategory {
    Landslide,
    Comfortable,
    Moderate,
    Close,
}

impl MarginCategory {
    pub fn from_pct(pct: f64) -> Option<MarginCategory> {
        if pct.is_nan() {
            None
        } else if pct >= 20.0 {
            Some(MarginCategory::Landslide)
        } else if pct >= 10.0 {
            Some(MarginCategory::Comfortable)
        } else if pct >= 5.0 {
            Some(MarginCategory::Moderate)
        } else {
            Some(MarginCategory::Close)
        }
    }
}

impl Display for MarginCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarginCategory::Landslide => write!(f, "Landslide"),
            MarginCategory::Comfortable => write!(f, "Comfortable"),
            MarginCategory::Moderate => write!(f, "Moderate"),
            MarginCategory::Close => write!(f, "Close"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SwingCategory {
    StrongGain,
    Gain,
    Loss,
    StrongLoss,
}

impl SwingCategory {
    /// `> 5` strong gain, `(0, 5]` gain, `(-5, 0]` loss, `<= -5` strong loss.
    pub fn from_pct(pct: f64) -> SwingCategory {
        if pct > 5.0 {
            SwingCategory::StrongGain
        } else if pct > 0.0 {
            SwingCategory::Gain
        } else if pct > -5.0 {
            SwingCategory::Loss
        } else {
            SwingCategory::StrongLoss
        }
    }
}

impl Display for SwingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwingCategory::StrongGain => write!(f, "Strong Gain"),
            SwingCategory::Gain => write!(f, "Gain"),
            SwingCategory::Loss => write!(f, "Loss"),
            SwingCategory::StrongLoss => write!(f, "Strong Loss"),
        }
    }
}

/// Errors returned by the library.
///
/// The aggregation functions themselves do not fail: undefined arithmetic is
/// reported as NaN in their outputs.
#[derive(PartialEq, Debug, Clone)]
pub enum StatsError {
    MalformedInput { reason: String },
    InvalidParameter { name: String, value: String },
    EmptyElection,
}

impl Error for StatsError {}

impl Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::MalformedInput { reason } => write!(f, "malformed input: {}", reason),
            StatsError::InvalidParameter { name, value } => {
                write!(f, "invalid value {:?} for parameter {}", value, name)
            }
            StatsError::EmptyElection => write!(f, "no election records to analyse"),
        }
    }
}

// ********* Configuration **********

/// How to pick a single leader among parties with the same number of votes.
///
/// `FirstEncountered` keeps the order in which the records were supplied and
/// is the default. `PartyName` picks the lexicographically smallest party name
/// and does not depend on the input order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum TieBreak {
    #[default]
    FirstEncountered,
    PartyName,
}

impl FromStr for TieBreak {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firstEncountered" | "first" => Ok(TieBreak::FirstEncountered),
            "partyName" | "name" => Ok(TieBreak::PartyName),
            x => Err(StatsError::InvalidParameter {
                name: "tie_break".to_string(),
                value: x.to_string(),
            }),
        }
    }
}

/// The column used to group records in descriptive statistics.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum GroupKey {
    #[default]
    Party,
    Region,
    Constituency,
}

impl GroupKey {
    pub fn key_of<'a>(&self, record: &'a ElectionRecord) -> &'a str {
        match self {
            GroupKey::Party => &record.party,
            GroupKey::Region => &record.region,
            GroupKey::Constituency => &record.constituency_name,
        }
    }
}

impl FromStr for GroupKey {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "party" => Ok(GroupKey::Party),
            "region" => Ok(GroupKey::Region),
            "constituency" | "constituency_name" => Ok(GroupKey::Constituency),
            x => Err(StatsError::InvalidParameter {
                name: "group_key".to_string(),
                value: x.to_string(),
            }),
        }
    }
}

/// Width of the time buckets used by the period rollup.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Period {
    Hour,
    Day,
    /// ISO weeks, starting on Monday 00:00 UTC.
    Week,
}

impl FromStr for Period {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" | "H" => Ok(Period::Hour),
            "day" | "D" => Ok(Period::Day),
            "week" | "W" => Ok(Period::Week),
            x => Err(StatsError::InvalidParameter {
                name: "period".to_string(),
                value: x.to_string(),
            }),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Hour => write!(f, "hour"),
            Period::Day => write!(f, "day"),
            Period::Week => write!(f, "week"),
        }
    }
}
