use crate::errors::{ParseError, PipelineError};
use crate::models::MeasurementPoint;
use crate::parsers;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Points decoded from one file plus how many values fell back to defaults.
#[derive(Debug, Default)]
pub struct FilePoints {
    pub points: Vec<MeasurementPoint>,
    pub defaulted_timestamps: u64,
    pub defaulted_fields: u64,
}

/// Decodes a file and converts every row to a point.
///
/// All points of the file are held in memory until the caller writes them, so
/// memory grows with the file's row count.
pub fn read_points(file_path: &Path, delimiter: u8) -> Result<FilePoints, ParseError> {
    let rows = parsers::read_file(file_path, delimiter)?;
    if let Some(first) = rows.first() {
        info!(
            "Decoded {} rows from {} ({:?} layout)",
            rows.len(),
            file_path.display(),
            first.variant()
        );
    }

    let mut result = FilePoints {
        points: Vec::with_capacity(rows.len()),
        ..Default::default()
    };
    for (index, row) in rows.iter().enumerate() {
        let point = row.to_point();
        // Data rows start on line 2.
        let line = index + 2;
        if point.timestamp.is_defaulted() {
            warn!(
                "Unparseable timestamp in {} at row {}, using epoch",
                file_path.display(),
                line
            );
            result.defaulted_timestamps += 1;
        }
        let defaulted = point.fields.defaulted_names();
        if !defaulted.is_empty() {
            warn!(
                "Unparseable value(s) for {:?} in {} at row {}, using 0",
                defaulted,
                file_path.display(),
                line
            );
            result.defaulted_fields += defaulted.len() as u64;
        }
        result.points.push(point);
    }
    Ok(result)
}

#[derive(Debug, Serialize)]
struct DebugRow {
    time: String,
    time_defaulted: bool,
    #[serde(rename = "Tcol")]
    tcol: f32,
    #[serde(rename = "Tboil")]
    tboil: f32,
    #[serde(rename = "Trl")]
    trl: f32,
    #[serde(rename = "Tvl")]
    tvl: f32,
    #[serde(rename = "Psol")]
    psol: i64,
    #[serde(rename = "Phe")]
    phe: i64,
    defaulted_fields: String,
}

/// Writes the decoded points of `source` to `<debug_dir>/<stem>.points.csv`.
pub fn write_debug_dump(
    debug_dir: &Path,
    source: &Path,
    points: &[MeasurementPoint],
) -> Result<PathBuf, PipelineError> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "points".to_string());
    let path = debug_dir.join(format!("{}.points.csv", stem));
    let dump_error = |source: csv::Error| PipelineError::DebugDump {
        path: path.clone(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&path)
        .map_err(dump_error)?;
    for point in points {
        let f = &point.fields;
        writer
            .serialize(DebugRow {
                time: point.timestamp.value().to_rfc3339(),
                time_defaulted: point.timestamp.is_defaulted(),
                tcol: f.tcol.value(),
                tboil: f.tboil.value(),
                trl: f.trl.value(),
                tvl: f.tvl.value(),
                psol: f.psol.value(),
                phe: f.phe.value(),
                defaulted_fields: f.defaulted_names().join(","),
            })
            .map_err(dump_error)?;
    }
    writer
        .flush()
        .map_err(|e| dump_error(csv::Error::from(e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseOutcome;

    const FILE: &str = "\
Time;Temperature1;Temperature2;Temperature3;Temperature4;Out1;Out2
2021-02-01 13:45:00;61,5;48,0;30,25;55,0;100;0
gestern;N/A;48,1;;55,1;95;x
";

    #[test]
    fn test_read_points_counts_defaults_and_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("E20210201.csv");
        std::fs::write(&path, FILE).unwrap();

        let result = read_points(&path, b';').unwrap();
        assert_eq!(result.points.len(), 2);
        assert_eq!(result.defaulted_timestamps, 1);
        assert_eq!(result.defaulted_fields, 3);
        assert_eq!(result.points[1].fields.tcol, ParseOutcome::Defaulted(0.0));
        assert_eq!(result.points[1].unix_seconds(), 0);
    }

    #[test]
    fn test_debug_dump_writes_one_line_per_point() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("E20210201.csv");
        std::fs::write(&source, FILE).unwrap();
        let points = read_points(&source, b';').unwrap().points;

        let dump = write_debug_dump(dir.path(), &source, &points).unwrap();
        assert_eq!(dump, dir.path().join("E20210201.points.csv"));
        let content = std::fs::read_to_string(&dump).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time;time_defaulted;Tcol;Tboil;Trl;Tvl;Psol;Phe"));
        assert!(lines[2].ends_with("Tcol,Trl,Phe"));
    }
}
