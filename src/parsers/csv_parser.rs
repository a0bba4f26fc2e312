use crate::errors::ParseError;
use crate::models::{MeasurementPoint, SolarFields};
use crate::utils::{parse_combined_timestamp, parse_output, parse_split_timestamp, parse_temperature};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Column layouts observed in controller exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// `Time;Temperature1..4;Out1;Out2`
    CombinedTimestamp,
    /// `Datum;Zeit;Temp1..4;Ausg1;Ausg2;Dummy`
    SplitDateTime,
}

impl SchemaVariant {
    /// Picks the layout from the header row.
    pub fn detect(headers: &StringRecord) -> Option<Self> {
        let has = |name: &str| headers.iter().any(|h| h == name);
        if has("Time") {
            Some(SchemaVariant::CombinedTimestamp)
        } else if has("Datum") && has("Zeit") {
            Some(SchemaVariant::SplitDateTime)
        } else {
            None
        }
    }
}

// Struct for the E*.csv export with a single timestamp column
#[derive(Debug, Clone, Deserialize)]
pub struct CombinedTimeRow {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Temperature1")]
    pub temperature1: String,
    #[serde(rename = "Temperature2")]
    pub temperature2: String,
    #[serde(rename = "Temperature3")]
    pub temperature3: String,
    #[serde(rename = "Temperature4")]
    pub temperature4: String,
    #[serde(rename = "Out1")]
    pub out1: String,
    #[serde(rename = "Out2")]
    pub out2: String,
}

// Struct for the German export with separate date and time columns
#[derive(Debug, Clone, Deserialize)]
pub struct SplitDateTimeRow {
    #[serde(rename = "Datum")]
    pub datum: String,
    #[serde(rename = "Zeit")]
    pub zeit: String,
    #[serde(rename = "Temp1")]
    pub temp1: String,
    #[serde(rename = "Temp2")]
    pub temp2: String,
    #[serde(rename = "Temp3")]
    pub temp3: String,
    #[serde(rename = "Temp4")]
    pub temp4: String,
    #[serde(rename = "Ausg1")]
    pub ausg1: String,
    #[serde(rename = "Ausg2")]
    pub ausg2: String,
}

/// One decoded line of a source file.
#[derive(Debug, Clone)]
pub enum RawRow {
    Combined(CombinedTimeRow),
    Split(SplitDateTimeRow),
}

impl RawRow {
    pub fn variant(&self) -> SchemaVariant {
        match self {
            RawRow::Combined(_) => SchemaVariant::CombinedTimestamp,
            RawRow::Split(_) => SchemaVariant::SplitDateTime,
        }
    }

    /// Converts the text fields. Never fails: bad text becomes a defaulted value.
    pub fn to_point(&self) -> MeasurementPoint {
        match self {
            RawRow::Combined(r) => MeasurementPoint::new(
                parse_combined_timestamp(&r.time),
                SolarFields {
                    tcol: parse_temperature(&r.temperature1),
                    tboil: parse_temperature(&r.temperature2),
                    trl: parse_temperature(&r.temperature3),
                    tvl: parse_temperature(&r.temperature4),
                    psol: parse_output(&r.out1),
                    phe: parse_output(&r.out2),
                },
            ),
            RawRow::Split(r) => MeasurementPoint::new(
                parse_split_timestamp(&r.datum, &r.zeit),
                SolarFields {
                    tcol: parse_temperature(&r.temp1),
                    tboil: parse_temperature(&r.temp2),
                    trl: parse_temperature(&r.temp3),
                    tvl: parse_temperature(&r.temp4),
                    psol: parse_output(&r.ausg1),
                    phe: parse_output(&r.ausg2),
                },
            ),
        }
    }
}

/// Decodes a delimited table with a header row into raw rows.
///
/// The layout is chosen once from the headers. Any structurally broken record
/// (ragged column count, invalid UTF-8, missing column) fails the whole input.
/// Input without even a header line decodes to no rows.
pub fn decode_rows<R: Read>(input: R, delimiter: u8) -> Result<Vec<RawRow>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| ParseError::HeaderReadError {
            path: PathBuf::new(),
            source: e,
        })?
        .clone();

    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Ok(Vec::new());
    }

    let variant = SchemaVariant::detect(&headers).ok_or_else(|| ParseError::UnknownSchema {
        path: PathBuf::new(),
        headers: headers.iter().map(str::to_string).collect(),
    })?;

    let mut rows = Vec::new();
    // Row numbers are 1-based file lines; the header is line 1.
    let record_error = |index: usize, source: csv::Error| ParseError::RecordError {
        path: PathBuf::new(),
        row: index + 2,
        source,
    };

    match variant {
        SchemaVariant::CombinedTimestamp => {
            for (index, result) in reader.deserialize::<CombinedTimeRow>().enumerate() {
                rows.push(RawRow::Combined(result.map_err(|e| record_error(index, e))?));
            }
        }
        SchemaVariant::SplitDateTime => {
            for (index, result) in reader.deserialize::<SplitDateTimeRow>().enumerate() {
                rows.push(RawRow::Split(result.map_err(|e| record_error(index, e))?));
            }
        }
    }

    Ok(rows)
}

/// Reads one file into raw rows. The file is closed before returning.
pub fn read_file(file_path: &Path, delimiter: u8) -> Result<Vec<RawRow>, ParseError> {
    let file = File::open(file_path).map_err(|e| ParseError::IoError {
        path: file_path.to_path_buf(),
        source: e,
    })?;
    decode_rows(file, delimiter).map_err(|e| e.with_path(file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseOutcome;
    use chrono::{Local, TimeZone};

    const COMBINED: &str = "\
Time;Temperature1;Temperature2;Temperature3;Temperature4;Out1;Out2
2021-02-01 13:45:00;61,5;48,0;30,25;55,0;100;0
2021-02-01 13:46:00;N/A;48,1;30,5;55,1;95;1
";

    const SPLIT: &str = "\
Datum;Zeit;Temp1;Temp2;Temp3;Temp4;Ausg1;Ausg2;Dummy
01.02.21;13:45:00;61,5;48,0;30,25;55,0;100;0;
01.02.21;13:46:00;62,0;48,1;30,5;55,1;150;1;x
";

    #[test]
    fn test_detects_combined_layout_and_maps_columns() {
        let rows = decode_rows(COMBINED.as_bytes(), b';').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variant(), SchemaVariant::CombinedTimestamp);

        let point = rows[0].to_point();
        let expected = Local.with_ymd_and_hms(2021, 2, 1, 13, 45, 0).unwrap();
        assert_eq!(point.timestamp, ParseOutcome::Parsed(expected));
        assert_eq!(point.fields.tcol, ParseOutcome::Parsed(61.5));
        assert_eq!(point.fields.trl, ParseOutcome::Parsed(30.25));
        assert_eq!(point.fields.psol, ParseOutcome::Parsed(100));
        assert_eq!(point.fields.phe, ParseOutcome::Parsed(0));
    }

    #[test]
    fn test_bad_temperature_keeps_row() {
        let rows = decode_rows(COMBINED.as_bytes(), b';').unwrap();
        let point = rows[1].to_point();
        assert_eq!(point.fields.tcol, ParseOutcome::Defaulted(0.0));
        assert_eq!(point.fields.tboil, ParseOutcome::Parsed(48.1));
        assert_eq!(point.fields.psol, ParseOutcome::Parsed(95));
    }

    #[test]
    fn test_detects_split_layout_and_ignores_dummy() {
        let rows = decode_rows(SPLIT.as_bytes(), b';').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variant(), SchemaVariant::SplitDateTime);

        let point = rows[1].to_point();
        let expected = Local.with_ymd_and_hms(2021, 2, 1, 13, 46, 0).unwrap();
        assert_eq!(point.timestamp, ParseOutcome::Parsed(expected));
        assert_eq!(point.fields.tcol, ParseOutcome::Parsed(62.0));
        assert_eq!(point.fields.psol, ParseOutcome::Parsed(150));
        assert_eq!(point.fields.phe, ParseOutcome::Parsed(1));
    }

    #[test]
    fn test_header_only_and_empty_inputs_have_no_rows() {
        let header_only = "Time;Temperature1;Temperature2;Temperature3;Temperature4;Out1;Out2\n";
        assert!(decode_rows(header_only.as_bytes(), b';').unwrap().is_empty());
        assert!(decode_rows("".as_bytes(), b';').unwrap().is_empty());
    }

    #[test]
    fn test_unknown_headers_fail_the_file() {
        let input = "Zeitstempel;A;B\n1;2;3\n";
        match decode_rows(input.as_bytes(), b';') {
            Err(ParseError::UnknownSchema { headers, .. }) => {
                assert_eq!(headers, vec!["Zeitstempel", "A", "B"]);
            }
            other => panic!("expected UnknownSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_fails_the_whole_file() {
        let input = format!("{}2021-02-01 13:47:00;1;2\n", COMBINED);
        match decode_rows(input.as_bytes(), b';') {
            Err(ParseError::RecordError { row, .. }) => assert_eq!(row, 4),
            other => panic!("expected RecordError, got {:?}", other),
        }
    }

    #[test]
    fn test_bom_and_crlf_are_ignored() {
        let input = b"\xef\xbb\xbfTime;Temperature1;Temperature2;Temperature3;Temperature4;Out1;Out2\r\n\
2021-02-01 13:45:00;61,5;48,0;30,25;55,0;100;0\r\n";
        let rows = decode_rows(&input[..], b';').unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].variant(), SchemaVariant::CombinedTimestamp);

        let point = rows[0].to_point();
        assert!(!point.timestamp.is_defaulted());
        assert_eq!(point.fields.phe, ParseOutcome::Parsed(0));
    }

    #[test]
    fn test_invalid_utf8_fails_the_whole_file() {
        let input = b"Time;Temperature1;Temperature2;Temperature3;Temperature4;Out1;Out2\n\
2021-02-01 13:45:00;61,5;48,0;30,25;55,0;100;0\n\
2021-02-01 13:46:00;6\xff,5;48,0;30,25;55,0;100;0\n";
        match decode_rows(&input[..], b';') {
            Err(ParseError::RecordError { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected RecordError, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_delimiter_is_an_unknown_layout() {
        assert!(matches!(
            decode_rows(COMBINED.as_bytes(), b','),
            Err(ParseError::UnknownSchema { .. })
        ));
    }

    #[test]
    fn test_read_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("E0001.csv");
        std::fs::write(&path, "nope\n").unwrap();
        match read_file(&path, b';') {
            Err(ParseError::UnknownSchema { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected UnknownSchema, got {:?}", other),
        }
        assert!(matches!(
            read_file(&dir.path().join("missing.csv"), b';'),
            Err(ParseError::IoError { .. })
        ));
    }
}
