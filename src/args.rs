use clap::Parser;

/// This is a statistical analysis program for constituency-level election results.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Options passed on the command line
    /// take precedence over the values of the configuration file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the expected reports in JSON format. If provided,
    /// the program checks that the computed reports match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, directory, 'stdout' or empty) Where to write the reports. With the csv format,
    /// this is a directory that receives one file per report.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (json or csv, default json) The format of the reports.
    #[clap(long, value_parser)]
    pub format: Option<String>,

    /// (file path or empty) The results table. Without an input, a synthetic election is generated.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv, xlsx or synthetic) The type of the input. By default, it is deduced from the
    /// extension of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, optional) The constituency table, used to complete the electorate of the results.
    #[clap(long, value_parser)]
    pub constituencies: Option<String>,

    /// (file path, optional) The results table of the previous election, for the swing report.
    #[clap(long, value_parser)]
    pub previous: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use (default: the first one).
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default 42) The seed of the synthetic election.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// The reports to produce. Can be repeated, or given as a comma-separated list.
    /// 'all' selects every report. See the manual for the list of reports.
    #[clap(long, value_parser)]
    pub report: Vec<String>,

    /// (party, region or constituency, default party) The grouping of the descriptive statistics.
    #[clap(long, value_parser)]
    pub group_by: Option<String>,

    /// (default 3.0) The absolute z-score above which a record is an anomaly.
    #[clap(long, value_parser)]
    pub z_threshold: Option<f64>,

    /// (hour, day or week, default day) The period of the timeline report.
    #[clap(long, value_parser)]
    pub period: Option<String>,

    /// (firstEncountered or partyName, default firstEncountered) How ties between parties are broken.
    #[clap(long, value_parser)]
    pub tie_break: Option<String>,

    /// (default Ensemble) The prediction model: Linear Regression, Random Forest, Bayesian or Ensemble.
    #[clap(long, value_parser)]
    pub model: Option<String>,

    /// (default 0.95) The confidence level of the prediction intervals.
    #[clap(long, value_parser)]
    pub confidence: Option<f64>,

    /// (default 10) The number of constituencies in the top report.
    #[clap(long, value_parser)]
    pub top: Option<usize>,

    /// Only analyse the results of these regions. Can be repeated, or given as a
    /// comma-separated list.
    #[clap(long, value_parser)]
    pub region: Vec<String>,

    /// Only show the results of this party in the describe, top and crosstab reports.
    #[clap(long, value_parser)]
    pub party: Option<String>,

    /// The user running the analysis. Without a user, the analysis runs as a guest.
    #[clap(long, value_parser)]
    pub user: Option<String>,

    /// The password of the user.
    #[clap(long, value_parser)]
    pub password: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
