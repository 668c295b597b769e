// Tabular form of the reports, written as JSON or CSV.

use std::fs;
use std::io::Write;
use std::path::Path;

use election_stats::prediction::PredictionResult;
use serde_json::Map as JSMap;

use crate::portal::*;

#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Missing,
}

impl Cell {
    fn to_json(&self) -> JSValue {
        match self {
            Cell::Text(s) => json!(s),
            Cell::Int(i) => json!(i),
            Cell::Float(f) if f.is_finite() => json!(f),
            Cell::Float(_) | Cell::Missing => JSValue::Null,
        }
    }

    fn to_csv(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.is_nan() => "NaN".to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Missing => "".to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<&String> for Cell {
    fn from(s: &String) -> Self {
        Cell::Text(s.clone())
    }
}

impl From<u64> for Cell {
    fn from(x: u64) -> Self {
        match i64::try_from(x) {
            Ok(i) => Cell::Int(i),
            Err(_) => Cell::Float(x as f64),
        }
    }
}

impl From<usize> for Cell {
    fn from(x: usize) -> Self {
        Cell::from(x as u64)
    }
}

impl From<i64> for Cell {
    fn from(x: i64) -> Self {
        Cell::Int(x)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl<T> From<Option<T>> for Cell
where
    Cell: From<T>,
{
    fn from(x: Option<T>) -> Self {
        x.map(Cell::from).unwrap_or(Cell::Missing)
    }
}

fn text<T: ToString>(x: Option<T>) -> Cell {
    x.map(|v| Cell::Text(v.to_string())).unwrap_or(Cell::Missing)
}

pub trait ToRow {
    const COLUMNS: &'static [&'static str];

    fn to_row(&self) -> Vec<Cell>;
}

#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_rows<T: ToRow>(name: &str, items: &[T]) -> Table {
        Table {
            name: name.to_string(),
            columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: items.iter().map(|x| x.to_row()).collect(),
        }
    }

    /// The votes of each party (columns) in each region (rows).
    pub fn cross_tab(name: &str, t: &CrossTab) -> Table {
        let mut columns = vec!["region".to_string()];
        columns.extend(t.parties.iter().cloned());
        let rows = t
            .regions
            .iter()
            .zip(t.cells.iter())
            .map(|(region, cells)| {
                let mut row = vec![Cell::from(region)];
                row.extend(cells.iter().map(|v| Cell::from(*v)));
                row
            })
            .collect();
        Table {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    pub fn counting(p: &CountingProgress) -> Vec<Table> {
        let status_name = |s: &Option<CountingStatus>| match s {
            Some(x) => Cell::Text(x.to_string()),
            None => Cell::from("Unknown"),
        };
        vec![
            Table {
                name: "counting_status".to_string(),
                columns: vec!["counting_status".to_string(), "rows".to_string()],
                rows: p
                    .by_status
                    .iter()
                    .map(|(s, n)| vec![status_name(s), Cell::from(*n)])
                    .collect(),
            },
            Table {
                name: "counting_by_region".to_string(),
                columns: vec![
                    "region".to_string(),
                    "counting_status".to_string(),
                    "rows".to_string(),
                ],
                rows: p
                    .by_region
                    .iter()
                    .map(|(r, s, n)| vec![Cell::from(r), status_name(s), Cell::from(*n)])
                    .collect(),
            },
            Table {
                name: "counted_by_party".to_string(),
                columns: vec!["party".to_string(), "counted_votes".to_string()],
                rows: p
                    .counted_by_party
                    .iter()
                    .map(|(party, v)| vec![Cell::from(party), Cell::from(*v)])
                    .collect(),
            },
        ]
    }

    pub fn prediction(name: &str, res: &PredictionResult) -> Table {
        let mut columns = vec!["model".to_string(), "confidence_level".to_string()];
        columns.extend(PREDICTION_COLUMNS.iter().map(|c| c.to_string()));
        let rows = res
            .parties
            .iter()
            .map(|p| {
                vec![
                    Cell::Text(res.model.to_string()),
                    Cell::from(res.confidence_level),
                    Cell::from(&p.party),
                    Cell::from(p.total_votes),
                    Cell::from(p.score),
                    Cell::from(p.win_probability_pct),
                    Cell::from(p.predicted_votes),
                    Cell::from(p.predicted_share_pct),
                    Cell::from(p.interval_low_pct),
                    Cell::from(p.interval_high_pct),
                ]
            })
            .collect();
        Table {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// An array with one object per row.
    pub fn to_json(&self) -> JSValue {
        let rows: Vec<JSValue> = self
            .rows
            .iter()
            .map(|row| {
                let mut obj: JSMap<String, JSValue> = JSMap::new();
                for (c, v) in self.columns.iter().zip(row.iter()) {
                    obj.insert(c.clone(), v.to_json());
                }
                JSValue::Object(obj)
            })
            .collect();
        JSValue::Array(rows)
    }

    pub fn write_csv<W: Write>(&self, w: W) -> PortalResult<()> {
        let mut writer = csv::Writer::from_writer(w);
        writer
            .write_record(self.columns.iter())
            .context(CsvWriteSnafu {})?;
        for row in self.rows.iter() {
            writer
                .write_record(row.iter().map(|c| c.to_csv()))
                .context(CsvWriteSnafu {})?;
        }
        writer.flush().context(WritingOutputSnafu {
            path: self.name.clone(),
        })?;
        Ok(())
    }
}

const PREDICTION_COLUMNS: [&str; 8] = [
    "party",
    "total_votes",
    "score",
    "win_probability_pct",
    "predicted_votes",
    "predicted_share_pct",
    "interval_low_pct",
    "interval_high_pct",
];

// ******** Row layouts of the reports *********

impl ToRow for Overview {
    const COLUMNS: &'static [&'static str] = &[
        "total_votes",
        "constituencies",
        "regions",
        "parties",
        "registered_voters",
        "turnout_pct",
        "leading_party",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.total_votes),
            Cell::from(self.constituencies),
            Cell::from(self.regions),
            Cell::from(self.parties),
            Cell::from(self.registered_voters),
            Cell::from(self.turnout_pct),
            text(self.leading_party.as_ref()),
        ]
    }
}

impl ToRow for DescriptiveStats {
    const COLUMNS: &'static [&'static str] = &[
        "group",
        "total",
        "count",
        "mean",
        "median",
        "std_dev",
        "min",
        "max",
        "q1",
        "q3",
        "iqr",
        "coefficient_of_variation",
        "constituencies",
        "share_of_total_pct",
        "mean_share_pct",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.group),
            Cell::from(self.total),
            Cell::from(self.count),
            Cell::from(self.mean),
            Cell::from(self.median),
            Cell::from(self.std_dev),
            Cell::from(self.min),
            Cell::from(self.max),
            Cell::from(self.q1),
            Cell::from(self.q3),
            Cell::from(self.iqr),
            Cell::from(self.coefficient_of_variation),
            Cell::from(self.constituencies),
            Cell::from(self.share_of_total_pct),
            Cell::from(self.mean_share_pct),
        ]
    }
}

impl ToRow for RegionalMetrics {
    const COLUMNS: &'static [&'static str] = &[
        "region",
        "party",
        "total_votes",
        "average_vote_share_pct",
        "constituencies_won",
        "regional_vote_share_pct",
        "leading_party",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.region),
            Cell::from(&self.party),
            Cell::from(self.total_votes),
            Cell::from(self.average_vote_share_pct),
            Cell::from(self.constituencies_won),
            Cell::from(self.regional_vote_share_pct),
            Cell::from(&self.leading_party),
        ]
    }
}

impl ToRow for TurnoutStats {
    const COLUMNS: &'static [&'static str] = &[
        "constituency_name",
        "region",
        "total_voters",
        "votes_cast",
        "turnout_pct",
        "category",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.constituency_name),
            Cell::from(&self.region),
            Cell::from(self.total_voters),
            Cell::from(self.votes_cast),
            Cell::from(self.turnout_pct),
            text(self.category),
        ]
    }
}

impl ToRow for Winner {
    const COLUMNS: &'static [&'static str] = &[
        "constituency_name",
        "region",
        "party",
        "votes",
        "vote_share_pct",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.constituency_name),
            Cell::from(&self.region),
            Cell::from(&self.party),
            Cell::from(self.votes),
            Cell::from(self.vote_share_pct),
        ]
    }
}

impl ToRow for Margin {
    const COLUMNS: &'static [&'static str] = &[
        "constituency_name",
        "region",
        "winner",
        "winner_votes",
        "runner_up",
        "runner_up_votes",
        "margin_votes",
        "margin_pct",
        "category",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.constituency_name),
            Cell::from(&self.region),
            Cell::from(&self.winner),
            Cell::from(self.winner_votes),
            text(self.runner_up.as_ref()),
            Cell::from(self.runner_up_votes),
            Cell::from(self.margin_votes),
            Cell::from(self.margin_pct),
            text(self.category),
        ]
    }
}

impl ToRow for AnomalyRecord {
    const COLUMNS: &'static [&'static str] = &[
        "region",
        "constituency_name",
        "party",
        "votes",
        "party_mean",
        "party_std_dev",
        "z_score",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.region),
            Cell::from(&self.constituency_name),
            Cell::from(&self.party),
            Cell::from(self.votes),
            Cell::from(self.party_mean),
            Cell::from(self.party_std_dev),
            Cell::from(self.z_score),
        ]
    }
}

impl ToRow for SwingRecord {
    const COLUMNS: &'static [&'static str] = &[
        "constituency_name",
        "region",
        "party",
        "current_votes",
        "previous_votes",
        "vote_change",
        "swing_pct",
        "current_share_pct",
        "previous_share_pct",
        "share_change_pts",
        "category",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.constituency_name),
            Cell::from(&self.region),
            Cell::from(&self.party),
            Cell::from(self.current_votes),
            Cell::from(self.previous_votes),
            Cell::from(self.vote_change),
            Cell::from(self.swing_pct),
            Cell::from(self.current_share_pct),
            Cell::from(self.previous_share_pct),
            Cell::from(self.share_change_pts),
            Cell::Text(self.category.to_string()),
        ]
    }
}

impl ToRow for PeriodAggregate {
    const COLUMNS: &'static [&'static str] = &[
        "bucket_start",
        "party",
        "total_votes",
        "mean_votes",
        "record_count",
    ];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.bucket_start.to_rfc3339()),
            Cell::from(&self.party),
            Cell::from(self.total_votes),
            Cell::from(self.mean_votes),
            Cell::from(self.record_count),
        ]
    }
}

impl ToRow for ConstituencyTotal {
    const COLUMNS: &'static [&'static str] = &["constituency_name", "region", "votes"];

    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(&self.constituency_name),
            Cell::from(&self.region),
            Cell::from(self.votes),
        ]
    }
}

// ******** Writers *********

/// One key per table, in order.
pub fn tables_to_json(tables: &[Table]) -> JSValue {
    let mut obj: JSMap<String, JSValue> = JSMap::new();
    for t in tables.iter() {
        obj.insert(t.name.clone(), t.to_json());
    }
    JSValue::Object(obj)
}

/// Writes one CSV file per table in the directory.
pub fn write_csv_dir(dir: &str, tables: &[Table]) -> PortalResult<()> {
    fs::create_dir_all(dir).context(WritingOutputSnafu { path: dir })?;
    for t in tables.iter() {
        let p = Path::new(dir).join(format!("{}.csv", t.name));
        let path = p.display().to_string();
        info!("Writing table {} to {:?}", t.name, path);
        let f = fs::File::create(&p).context(WritingOutputSnafu { path })?;
        t.write_csv(f)?;
    }
    Ok(())
}

/// Writes all the tables to the standard output, each one preceded by its name.
pub fn write_csv_stdout(tables: &[Table]) -> PortalResult<()> {
    let stdout = std::io::stdout();
    for t in tables.iter() {
        let mut handle = stdout.lock();
        writeln!(handle, "# {}", t.name).context(WritingOutputSnafu { path: "stdout" })?;
        t.write_csv(handle)?;
    }
    Ok(())
}
