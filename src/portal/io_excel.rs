// Reading the results table from an Excel workbook.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, SecondsFormat, TimeZone, Utc};

use crate::portal::{
    io_common::{raw_record_from_cells, simplify_file_name, HeaderIndex, RESULT_COLUMNS},
    *,
};

pub fn read_excel_results(path: &str, worksheet_name: Option<&str>) -> PortalResult<Vec<RawRecord>> {
    info!(
        "Attempting to read workbook {:?} (worksheet {:?})",
        simplify_file_name(path),
        worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    read_range(&wrange)
}

/// Reads the rows of a worksheet. The first row is the header.
pub fn read_range(wrange: &Range<DataType>) -> PortalResult<Vec<RawRecord>> {
    let mut iter = wrange.rows();
    let header_row = match iter.next() {
        Some(row) => row,
        None => whatever!("Empty worksheet: no header row"),
    };
    let header_cells: Vec<String> = header_row.iter().map(cell_text).collect();
    debug!("header: {:?}", header_cells);
    let header = HeaderIndex::new(&header_cells);
    header.require_all(&RESULT_COLUMNS)?;

    let mut res: Vec<RawRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        let r = raw_record_from_cells(&header, &cells, lineno)?;
        debug!("read_range: lineno: {:?} row: {:?}", lineno, r);
        res.push(r);
    }
    Ok(res)
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => excel_serial_to_rfc3339(*serial),
        DataType::Empty => "".to_string(),
        other => {
            warn!("cell_text: unsupported cell {:?}, treated as blank", other);
            "".to_string()
        }
    }
}

// Excel counts days from 1899-12-30.
fn excel_serial_to_rfc3339(serial: f64) -> String {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    match epoch {
        Some(e) => {
            let millis = (serial * 86_400_000.0).round() as i64;
            Utc.from_utc_datetime(&(e + Duration::milliseconds(millis)))
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        }
        None => "".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[Vec<DataType>]) -> Range<DataType> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), value.clone());
            }
        }
        range
    }

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    #[test]
    fn reads_typed_cells() {
        let range = sheet(&[
            vec![
                s("region"),
                s("constituency_name"),
                s("party"),
                s("votes"),
                s("total_voters"),
                s("timestamp"),
            ],
            vec![
                s("North"),
                s("X"),
                s("Party A"),
                DataType::Float(600.0),
                DataType::Int(2000),
                DataType::DateTime(45427.5),
            ],
            vec![
                DataType::Empty,
                DataType::Empty,
                DataType::Empty,
                DataType::Empty,
                DataType::Empty,
                DataType::Empty,
            ],
        ]);
        let rows = read_range(&range).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].votes, Some(600));
        assert_eq!(rows[0].total_voters, Some(2000));
        assert_eq!(
            rows[0].timestamp.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Some("2024-05-15T12:00:00Z".to_string())
        );
    }

    #[test]
    fn requires_header() {
        let range = sheet(&[vec![s("region"), s("votes")]]);
        assert!(matches!(
            read_range(&range),
            Err(PortalError::MissingColumn { .. })
        ));
    }
}
