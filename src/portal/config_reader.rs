use crate::portal::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub reports: Option<Vec<String>>,
    pub format: Option<String>,
    pub out: Option<String>,
    #[serde(rename = "tieBreak")]
    pub tie_break: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSources {
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    pub results: Option<String>,
    pub constituencies: Option<String>,
    pub previous: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub seed: Option<u64>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(rename = "groupBy")]
    pub group_by: Option<String>,
    #[serde(rename = "zThreshold")]
    pub z_threshold: Option<f64>,
    pub period: Option<String>,
    pub model: Option<String>,
    pub confidence: Option<f64>,
    #[serde(rename = "topN")]
    pub top_n: Option<usize>,
    pub regions: Option<Vec<String>>,
    pub party: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSources", default)]
    pub data_sources: DataSources,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    pub users: Option<Vec<UserEntry>>,
}

pub fn parse_config(contents: &str) -> PortalResult<PortalConfig> {
    let config: PortalConfig = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    debug!("parse_config: {:?}", config);
    Ok(config)
}

pub fn read_config(path: &str) -> PortalResult<PortalConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_config(&contents)
}

pub fn read_summary(path: &str) -> PortalResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config = parse_config(
            r#"{
              "outputSettings": { "reports": ["overview", "winners"], "format": "csv", "tieBreak": "partyName" },
              "dataSources": { "inputType": "csv", "results": "results.csv", "seed": 7 },
              "analysis": { "zThreshold": 2.5, "period": "week", "topN": 3, "regions": ["North"] },
              "users": [ { "username": "alice", "password": "secret", "role": "analyst" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.output_settings.reports,
            Some(vec!["overview".to_string(), "winners".to_string()])
        );
        assert_eq!(config.output_settings.tie_break.as_deref(), Some("partyName"));
        assert_eq!(config.data_sources.seed, Some(7));
        assert_eq!(config.analysis.z_threshold, Some(2.5));
        assert_eq!(config.analysis.top_n, Some(3));
        assert_eq!(config.analysis.regions, Some(vec!["North".to_string()]));
        assert_eq!(config.users.map(|u| u.len()), Some(1));
    }

    #[test]
    fn sections_are_optional() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, PortalConfig::default());
        assert!(matches!(
            parse_config("{ \"analysis\": 3 }"),
            Err(PortalError::ParsingJson { .. })
        ));
    }
}
