use log::{debug, info, warn};

use election_stats::builder::Builder;
use election_stats::cache::{AggregateCache, RecordSet};
use election_stats::prediction::PredictionModel;
use election_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::portal::access::*;
use crate::portal::config_reader::*;
use crate::portal::export::*;

pub mod access;
pub mod config_reader;
pub mod export;
mod io_common;
mod io_csv;
mod io_excel;
mod synthetic;

#[derive(Debug, Snafu)]
pub enum PortalError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error serializing the reports"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error writing CSV"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Missing column {column} in the header"))]
    MissingColumn { column: String },
    #[snafu(display("Line {lineno}: cannot read {value:?} in column {column}"))]
    CellParse {
        lineno: usize,
        column: String,
        value: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    Stats { source: StatsError },
    #[snafu(display("Invalid credentials for user {user}"))]
    InvalidCredentials { user: String },
    #[snafu(display("User {user} is not allowed to {action}"))]
    AccessDenied { user: String, action: Action },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Difference detected between the computed reports and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PortalResult<T> = Result<T, PortalError>;

// ********* Settings ***********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
    Synthetic,
}

impl InputType {
    fn from_path(path: &str) -> InputType {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("xlsx") | Some("xlsm") => InputType::Xlsx,
            _ => InputType::Csv,
        }
    }
}

impl FromStr for InputType {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(InputType::Csv),
            "xlsx" | "excel" => Ok(InputType::Xlsx),
            "synthetic" => Ok(InputType::Synthetic),
            x => whatever!("Input type {:?} not implemented", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            x => whatever!("Output format {:?} not implemented", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReportKind {
    Overview,
    Describe,
    Regional,
    Turnout,
    Winners,
    Margins,
    Anomalies,
    Swing,
    Timeline,
    Top,
    CrossTab,
    Counting,
    Prediction,
}

impl ReportKind {
    pub const ALL: [ReportKind; 13] = [
        ReportKind::Overview,
        ReportKind::Describe,
        ReportKind::Regional,
        ReportKind::Turnout,
        ReportKind::Winners,
        ReportKind::Margins,
        ReportKind::Anomalies,
        ReportKind::Swing,
        ReportKind::Timeline,
        ReportKind::Top,
        ReportKind::CrossTab,
        ReportKind::Counting,
        ReportKind::Prediction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Overview => "overview",
            ReportKind::Describe => "describe",
            ReportKind::Regional => "regional",
            ReportKind::Turnout => "turnout",
            ReportKind::Winners => "winners",
            ReportKind::Margins => "margins",
            ReportKind::Anomalies => "anomalies",
            ReportKind::Swing => "swing",
            ReportKind::Timeline => "timeline",
            ReportKind::Top => "top",
            ReportKind::CrossTab => "crosstab",
            ReportKind::Counting => "counting",
            ReportKind::Prediction => "prediction",
        }
    }

    /// The reports that `--party` narrows down. The other reports compare the
    /// parties with each other and always see all of them.
    pub fn narrowed_by_party(&self) -> bool {
        matches!(
            self,
            ReportKind::Describe | ReportKind::Top | ReportKind::CrossTab
        )
    }
}

/// The options of a run, from the command line and the configuration file.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub input_type: InputType,
    pub input: Option<String>,
    pub constituencies: Option<String>,
    pub previous: Option<String>,
    /// Type of the previous results. An explicit file type applies to both inputs.
    pub previous_type: InputType,
    pub excel_worksheet_name: Option<String>,
    pub seed: u64,
    pub reports: Vec<String>,
    pub group_by: GroupKey,
    pub z_threshold: f64,
    pub period: Period,
    pub tie_break: TieBreak,
    pub model: PredictionModel,
    pub confidence: f64,
    pub top_n: usize,
    pub regions: Vec<String>,
    /// Only narrows the reports listed by `ReportKind::narrowed_by_party`.
    pub party: Option<String>,
    pub out: Option<String>,
    pub format: OutputFormat,
    pub reference: Option<String>,
}

impl Settings {
    fn writes_to_stdout(&self) -> bool {
        matches!(self.out.as_deref(), None | Some("") | Some("stdout"))
    }
}

fn pick<T: Clone>(cli: &Option<T>, config: &Option<T>) -> Option<T> {
    cli.clone().or_else(|| config.clone())
}

fn parse_opt<T>(x: Option<String>, default: T) -> PortalResult<T>
where
    T: FromStr<Err = StatsError>,
{
    match x {
        Some(s) => s.parse::<T>().context(StatsSnafu {}),
        None => Ok(default),
    }
}

/// Paths of the configuration file are relative to its directory.
fn config_path(root: &Path, p: &Option<String>) -> Option<String> {
    p.as_ref().map(|s| {
        let full: PathBuf = root.join(s);
        full.display().to_string()
    })
}

pub fn resolve_settings(args: &Args, config: &PortalConfig, root: &Path) -> PortalResult<Settings> {
    let ds = &config.data_sources;
    let an = &config.analysis;
    let os = &config.output_settings;

    let input = pick(&args.input, &config_path(root, &ds.results));
    let explicit_type = match pick(&args.input_type, &ds.input_type) {
        Some(s) => Some(s.parse::<InputType>()?),
        None => None,
    };
    let input_type = match (explicit_type, &input) {
        (Some(t), _) => t,
        (None, Some(p)) => InputType::from_path(p),
        (None, None) => InputType::Synthetic,
    };
    let previous = pick(&args.previous, &config_path(root, &ds.previous));
    let previous_type = match (explicit_type, &previous) {
        (Some(t), _) if t != InputType::Synthetic => t,
        (_, Some(p)) => InputType::from_path(p),
        (_, None) => InputType::Csv,
    };
    if input_type != InputType::Synthetic && input.is_none() {
        whatever!("Input type {:?} requires an input file", input_type);
    }

    let z_threshold = pick(&args.z_threshold, &an.z_threshold).unwrap_or(DEFAULT_Z_THRESHOLD);
    if !(z_threshold >= 0.0) {
        return Err(PortalError::Stats {
            source: StatsError::InvalidParameter {
                name: "z_threshold".to_string(),
                value: z_threshold.to_string(),
            },
        });
    }

    let reports = if !args.report.is_empty() {
        args.report.clone()
    } else {
        os.reports.clone().unwrap_or_else(|| vec!["all".to_string()])
    };

    let regions: Vec<String> = if !args.region.is_empty() {
        args.region
            .iter()
            .flat_map(|s| s.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        an.regions.clone().unwrap_or_default()
    };

    let model = match pick(&args.model, &an.model) {
        Some(s) => s.parse::<PredictionModel>().context(StatsSnafu {})?,
        None => PredictionModel::default(),
    };

    Ok(Settings {
        input_type,
        input,
        constituencies: pick(&args.constituencies, &config_path(root, &ds.constituencies)),
        previous,
        previous_type,
        excel_worksheet_name: pick(&args.excel_worksheet_name, &ds.excel_worksheet_name),
        seed: pick(&args.seed, &ds.seed).unwrap_or(synthetic::DEFAULT_SEED),
        reports,
        group_by: parse_opt(pick(&args.group_by, &an.group_by), GroupKey::Party)?,
        z_threshold,
        period: parse_opt(pick(&args.period, &an.period), Period::Day)?,
        tie_break: parse_opt(pick(&args.tie_break, &os.tie_break), TieBreak::default())?,
        model,
        confidence: pick(&args.confidence, &an.confidence).unwrap_or(0.95),
        top_n: pick(&args.top, &an.top_n).unwrap_or(10),
        regions,
        party: pick(&args.party, &an.party),
        out: pick(&args.out, &config_path(root, &os.out)),
        format: match pick(&args.format, &os.format) {
            Some(s) => s.parse::<OutputFormat>()?,
            None => OutputFormat::Json,
        },
        reference: args.reference.clone(),
    })
}

/// Expands the report names. `all` selects the swing report only when
/// previous results are available, and the prediction only when the role
/// allows it.
pub fn select_reports(
    names: &[String],
    has_previous: bool,
    role: Role,
) -> PortalResult<Vec<ReportKind>> {
    let mut res: Vec<ReportKind> = Vec::new();
    for name in names.iter().flat_map(|n| n.split(',')).map(|n| n.trim()) {
        if name.is_empty() {
            continue;
        }
        let selected: Vec<ReportKind> = if name == "all" {
            ReportKind::ALL
                .iter()
                .cloned()
                .filter(|r| *r != ReportKind::Swing || has_previous)
                .filter(|r| {
                    let allowed = *r != ReportKind::Prediction || permits(role, Action::Predict);
                    if !allowed {
                        warn!("select_reports: skipping the prediction report for role {:?}", role);
                    }
                    allowed
                })
                .collect()
        } else {
            match ReportKind::ALL.iter().find(|r| r.name() == name) {
                Some(r) => vec![*r],
                None => whatever!("Unknown report {:?}", name),
            }
        };
        for r in selected {
            if !res.contains(&r) {
                res.push(r);
            }
        }
    }
    if res.contains(&ReportKind::Swing) && !has_previous {
        whatever!("The swing report requires the results of a previous election (--previous)");
    }
    Ok(res)
}

// ********* Loading ***********

fn read_rows(path: &str, input_type: InputType, worksheet: Option<&str>) -> PortalResult<Vec<RawRecord>> {
    match input_type {
        InputType::Csv => io_csv::read_results_path(path),
        InputType::Xlsx => io_excel::read_excel_results(path, worksheet),
        InputType::Synthetic => whatever!("No file to read for a synthetic input"),
    }
}

fn load_current(settings: &Settings, now: DateTime<Utc>) -> PortalResult<RecordSet> {
    let (generated, mut rows) = match (settings.input_type, &settings.input) {
        (InputType::Synthetic, _) => synthetic::generate(settings.seed, now),
        (t, Some(path)) => (
            Vec::new(),
            read_rows(path, t, settings.excel_worksheet_name.as_deref())?,
        ),
        (t, None) => whatever!("Input type {:?} requires an input file", t),
    };
    let constituencies = match &settings.constituencies {
        Some(p) => io_csv::read_constituencies_path(p)?,
        None => generated,
    };
    io_csv::fill_total_voters(&mut rows, &constituencies);
    Ok(build_record_set(&rows, now))
}

fn load_previous(settings: &Settings, path: &str, now: DateTime<Utc>) -> PortalResult<RecordSet> {
    let rows = read_rows(
        path,
        settings.previous_type,
        settings.excel_worksheet_name.as_deref(),
    )?;
    Ok(build_record_set(&rows, now))
}

fn build_record_set(rows: &[RawRecord], now: DateTime<Utc>) -> RecordSet {
    let mut builder = Builder::new().ingestion_time(now);
    for r in rows.iter() {
        builder.add_raw(r);
    }
    let set = builder.build();
    info!(
        "Loaded {} records from {} rows (fingerprint {})",
        set.len(),
        rows.len(),
        set.fingerprint()
    );
    set
}

fn filter_regions(set: RecordSet, settings: &Settings) -> RecordSet {
    if settings.regions.is_empty() {
        return set;
    }
    let regions: Vec<&str> = settings.regions.iter().map(|s| s.as_str()).collect();
    RecordSet::new(filter(set.records(), &regions, None))
}

// ********* Reports ***********

pub fn compute_tables(
    settings: &Settings,
    reports: &[ReportKind],
    set: &RecordSet,
    previous: Option<&RecordSet>,
    cache: &mut AggregateCache,
) -> PortalResult<Vec<Table>> {
    let records = set.records();
    let narrowed: Option<Vec<ElectionRecord>> = settings
        .party
        .as_deref()
        .map(|p| filter(records, &[], Some(p)));
    let tb = settings.tie_break;
    let mut tables: Vec<Table> = Vec::new();
    for report in reports.iter() {
        let name = report.name();
        let view: &[ElectionRecord] = match &narrowed {
            Some(n) if report.narrowed_by_party() => n.as_slice(),
            _ => records,
        };
        debug!("compute_tables: {}", name);
        match report {
            ReportKind::Overview => {
                tables.push(Table::from_rows(name, &[overview(records, tb)]))
            }
            ReportKind::Describe => match &narrowed {
                // The cache only holds aggregates of the full record set.
                Some(_) => tables.push(Table::from_rows(name, &describe(view, settings.group_by))),
                None => tables.push(Table::from_rows(name, cache.describe(set, settings.group_by))),
            },
            ReportKind::Regional => {
                tables.push(Table::from_rows(name, cache.regional_metrics(set, tb)))
            }
            ReportKind::Turnout => tables.push(Table::from_rows(name, cache.turnout(set))),
            ReportKind::Winners => tables.push(Table::from_rows(name, cache.winners(set, tb))),
            ReportKind::Margins => tables.push(Table::from_rows(name, cache.margins(set, tb))),
            ReportKind::Anomalies => tables.push(Table::from_rows(
                name,
                cache.anomalies(set, settings.z_threshold),
            )),
            ReportKind::Swing => match previous {
                Some(p) => tables.push(Table::from_rows(name, &swing(records, p.records()))),
                None => whatever!("The swing report requires the results of a previous election"),
            },
            ReportKind::Timeline => tables.push(Table::from_rows(
                name,
                &aggregate_by_period(records, settings.period),
            )),
            ReportKind::Top => tables.push(Table::from_rows(
                name,
                &top_constituencies(view, settings.top_n),
            )),
            ReportKind::CrossTab => {
                tables.push(Table::cross_tab(name, &cross_regional(view)))
            }
            ReportKind::Counting => tables.extend(Table::counting(&counting_progress(records))),
            ReportKind::Prediction => {
                let res = settings
                    .model
                    .predict(records, settings.confidence)
                    .context(StatsSnafu {})?;
                info!(
                    "Predicted winner ({}): {}",
                    res.model, res.predicted_winner
                );
                tables.push(Table::prediction(name, &res));
            }
        }
    }
    debug!(
        "compute_tables: cache hits {} misses {}",
        cache.hits(),
        cache.misses()
    );
    Ok(tables)
}

fn login(gate: &dyn AccessGate, user: Option<&str>, password: Option<&str>) -> PortalResult<(String, Role)> {
    match user {
        None => {
            info!("No user given, running as guest");
            Ok(("guest".to_string(), Role::Guest))
        }
        Some(u) => {
            ensure!(
                gate.authenticate(u, password.unwrap_or("")),
                InvalidCredentialsSnafu { user: u }
            );
            let role = gate.role_of(u);
            info!("Logged in as {} ({:?})", u, role);
            Ok((u.to_string(), role))
        }
    }
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> PortalResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("The reports match the reference {:?}", reference_path);
    Ok(())
}

pub fn run_portal(args: &Args) -> PortalResult<()> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (PortalConfig::default(), PathBuf::new()),
    };
    let gate = match &config.users {
        Some(users) => StaticAccessGate::from_users(users)?,
        None => StaticAccessGate::default(),
    };
    let (user, role) = login(&gate, args.user.as_deref(), args.password.as_deref())?;

    let settings = resolve_settings(args, &config, &root)?;
    info!("settings: {:?}", settings);
    let reports = select_reports(&settings.reports, settings.previous.is_some(), role)?;
    require(&user, role, Action::View)?;
    if !settings.writes_to_stdout() {
        require(&user, role, Action::Export)?;
    }
    if reports.contains(&ReportKind::Prediction) {
        require(&user, role, Action::Predict)?;
    }

    let now = Utc::now();
    let current = filter_regions(load_current(&settings, now)?, &settings);
    let previous = match &settings.previous {
        Some(p) => Some(filter_regions(load_previous(&settings, p, now)?, &settings)),
        None => None,
    };
    if current.is_empty() {
        warn!("No election records left after cleaning and filtering");
    }

    let mut cache = AggregateCache::new();
    let tables = compute_tables(&settings, &reports, &current, previous.as_ref(), &mut cache)?;

    let result_js = tables_to_json(&tables);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;

    match (settings.format, settings.writes_to_stdout()) {
        (OutputFormat::Json, true) => println!("{}", pretty_js_stats),
        (OutputFormat::Json, false) => {
            let path = settings.out.clone().unwrap_or_default();
            info!("Writing reports to {:?}", path);
            fs::write(&path, &pretty_js_stats).context(WritingOutputSnafu { path: path.clone() })?;
        }
        (OutputFormat::Csv, true) => write_csv_stdout(&tables)?,
        (OutputFormat::Csv, false) => write_csv_dir(&settings.out.clone().unwrap_or_default(), &tables)?,
    }

    if let Some(reference_path) = &settings.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}
