// Primitives for reading CSV files.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

use crate::portal::{
    io_common::{raw_record_from_cells, simplify_file_name, HeaderIndex, RESULT_COLUMNS},
    *,
};

/// One row of the constituency table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ConstituencyRow {
    pub region: String,
    pub constituency_id: Option<String>,
    pub constituency_name: String,
    pub total_voters: Option<u64>,
}

fn records_of<R: Read>(rdr: R) -> PortalResult<(HeaderIndex, csv::StringRecordsIntoIter<R>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(rdr);
    let header = reader.headers().context(CsvLineParseSnafu {})?;
    let index = HeaderIndex::new(&header.iter().collect::<Vec<&str>>());
    Ok((index, reader.into_records()))
}

pub fn read_results<R: Read>(rdr: R) -> PortalResult<Vec<RawRecord>> {
    let (header, records) = records_of(rdr)?;
    header.require_all(&RESULT_COLUMNS)?;
    let mut res: Vec<RawRecord> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        let r = raw_record_from_cells(&header, &cells, lineno)?;
        debug!("read_results: lineno: {:?} row: {:?}", lineno, r);
        res.push(r);
    }
    Ok(res)
}

pub fn read_constituencies<R: Read>(rdr: R) -> PortalResult<Vec<ConstituencyRow>> {
    let (header, records) = records_of(rdr)?;
    let region_idx = header.required("region")?;
    let name_idx = header.required("constituency_name")?;
    let voters_idx = header.required("total_voters")?;
    let id_idx = header.optional("constituency_id");
    let mut res: Vec<ConstituencyRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let text = |i: usize| line.get(i).map(|s| s.trim()).unwrap_or("");
        let total_voters = io_common::parse_count(
            lineno,
            "total_voters",
            Some(text(voters_idx)).filter(|s| !s.is_empty()),
        )?;
        res.push(ConstituencyRow {
            region: text(region_idx).to_string(),
            constituency_id: id_idx
                .map(text)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            constituency_name: text(name_idx).to_string(),
            total_voters,
        });
    }
    Ok(res)
}

fn open(path: &str) -> PortalResult<File> {
    info!("Attempting to read file {:?}", simplify_file_name(path));
    File::open(path).context(OpeningFileSnafu { path })
}

pub fn read_results_path(path: &str) -> PortalResult<Vec<RawRecord>> {
    read_results(open(path)?)
}

pub fn read_constituencies_path(path: &str) -> PortalResult<Vec<ConstituencyRow>> {
    read_constituencies(open(path)?)
}

/// Completes the results rows without an electorate from the constituency
/// table. Returns the number of completed rows.
pub fn fill_total_voters(rows: &mut [RawRecord], constituencies: &[ConstituencyRow]) -> usize {
    let electorates: HashMap<&str, u64> = constituencies
        .iter()
        .filter_map(|c| Some((c.constituency_name.as_str(), c.total_voters?)))
        .collect();
    let mut filled = 0;
    for r in rows.iter_mut() {
        if r.total_voters.is_some() {
            continue;
        }
        let found = r
            .constituency_name
            .as_deref()
            .and_then(|name| electorates.get(name.trim()))
            .cloned();
        if found.is_some() {
            r.total_voters = found;
            filled += 1;
        }
    }
    debug!("fill_total_voters: {} rows completed", filled);
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS: &str = "region,constituency_name,party,votes,total_voters,counting_status
North,X,Party A,600,2000,Complete
North,X,Party B,400,,Pending
North,Y,Party A,-5,1000,
";

    const CONSTITUENCIES: &str = "region,constituency_id,constituency_name,total_voters
North,1,X,2000
North,2,Y,1000
";

    #[test]
    fn results_table() {
        let rows = read_results(RESULTS.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].party.as_deref(), Some("Party A"));
        assert_eq!(rows[0].counting_status, Some(CountingStatus::Complete));
        assert_eq!(rows[1].total_voters, None);
        assert_eq!(rows[2].votes, Some(-5));
        // The cleaning stage drops the incomplete and the negative rows.
        assert_eq!(clean(&rows).len(), 1);
    }

    #[test]
    fn fills_from_constituencies() {
        let mut rows = read_results(RESULTS.as_bytes()).unwrap();
        let cs = read_constituencies(CONSTITUENCIES.as_bytes()).unwrap();
        assert_eq!(cs[0].constituency_id.as_deref(), Some("1"));
        assert_eq!(fill_total_voters(&mut rows, &cs), 1);
        assert_eq!(rows[1].total_voters, Some(2000));
        assert_eq!(clean(&rows).len(), 2);
    }

    #[test]
    fn missing_column() {
        let res = read_results("region,party,votes\nNorth,A,1\n".as_bytes());
        assert!(matches!(res, Err(PortalError::MissingColumn { .. })));
    }

    #[test]
    fn bad_cell_reports_line() {
        let res = read_results(
            "region,constituency_name,party,votes,total_voters\nNorth,X,A,1,2\nNorth,X,B,many,2\n"
                .as_bytes(),
        );
        assert!(matches!(
            res,
            Err(PortalError::CellParse { lineno: 3, .. })
        ));
    }
}
