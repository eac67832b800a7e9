//! # Report Assembler
//!
//! Decides the report shape for a finished observation window and appends
//! rows to the appropriate CSV file.
//!
//! - exactly one deployment family produced logs → the single-deployment
//!   report gets one row per captured log file of that family;
//! - several families produced logs → the combined report gets exactly one
//!   wide row for the whole run, each family writing into its reserved
//!   columns;
//! - no family produced logs → nothing is written.
//!
//! Both CSV files are append-only across benchmark runs: the header is
//! written only when the file is missing or empty and never again.

use crate::{
    camera,
    dispatch,
    family::DeploymentFamily,
    hardware,
    metrics::{
        HardwareMetrics,
        MetricKind,
        MetricOutcome,
    },
};
use eyre::{
    eyre,
    Result,
    WrapErr,
};
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    fs,
    fs::OpenOptions,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::{
    debug,
    error,
    info,
};

/// Rows produced by one report-generation pass, kept for terminal display.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutput {
    /// No deployment family had any captured logs.
    NoneActive,
    /// Exactly one family was active; one row per captured log file.
    Single {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Several families were active; one wide row for the whole run.
    Combined {
        header: Vec<String>,
        row: Vec<String>,
    },
}

const HARDWARE_COLUMNS: [&str; 4] = ["VRAM (MB)", "RAM (GB)", "CPU (%)", "GPU (%)"];

fn single_header() -> Vec<String> {
    let mut header = vec!["Deployment Name".to_string(), "Camera Number".to_string()];
    header.extend(HARDWARE_COLUMNS.iter().map(|c| c.to_string()));
    for kind in [
        MetricKind::ServerLoad,
        MetricKind::SampleRate,
        MetricKind::QueueSize,
        MetricKind::Fps,
        MetricKind::MotionCount,
    ] {
        header.push(kind.to_string());
    }
    header
}

/// Column reservations of one family in the combined report.
#[derive(Debug, Clone)]
struct FamilySlots {
    camera: usize,
    metrics: Vec<(MetricKind, usize)>,
}

/// Column schema of the combined report.
///
/// Built once per pass; families reserve contiguous column groups in a fixed
/// order, so ownership is disjoint by construction and verified before use.
#[derive(Debug, Clone)]
struct ComboSchema {
    header: Vec<String>,
    slots: HashMap<DeploymentFamily, FamilySlots>,
}

impl ComboSchema {
    fn build() -> Result<Self> {
        let mut schema = Self {
            header: HARDWARE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            slots: HashMap::new(),
        };

        use DeploymentFamily::*;
        use MetricKind::*;
        schema.reserve(Ids, &[ServerLoad, MotionCount])?;
        schema.reserve(Ptd, &[ServerLoad])?;
        schema.reserve(Tfa, &[SampleRate])?;
        schema.reserve(Fds, &[QueueSize])?;
        schema.reserve(Frs, &[Fps])?;
        schema.reserve(Aod, &[ServerLoad])?;

        schema.validate()?;
        Ok(schema)
    }

    /// Append a camera column plus one column per metric for `family`.
    fn reserve(&mut self, family: DeploymentFamily, kinds: &[MetricKind]) -> Result<()> {
        if self.slots.contains_key(&family) {
            return Err(eyre!("combined schema: duplicate column reservation for {family}"));
        }

        let camera = self.header.len();
        self.header.push(format!("{family} - Camera Number"));

        let mut metrics = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            metrics.push((kind, self.header.len()));
            self.header.push(format!("{family} - {kind}"));
        }

        self.slots.insert(family, FamilySlots { camera, metrics });
        Ok(())
    }

    /// Every reserved index must be in range and owned by exactly one family.
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (family, slots) in &self.slots {
            let mut indices = vec![slots.camera];
            indices.extend(slots.metrics.iter().map(|(_, index)| *index));
            for index in indices {
                if index >= self.header.len() {
                    return Err(eyre!("combined schema: {family} column {index} out of range"));
                }
                if !seen.insert(index) {
                    return Err(eyre!("combined schema: column {index} owned by two families"));
                }
            }
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.header.len()
    }
}

/// Run the full extraction and report pass over a finished observation
/// window and append the result to the appropriate CSV file.
///
/// Only a report file that cannot be opened for append propagates an error;
/// everything upstream degrades to sentinel cells.
pub fn process_and_write_results(
    log_dir: &Path,
    single_results_file: &Path,
    combo_results_file: &Path,
) -> Result<ReportOutput> {
    let hardware_metrics = hardware::read_hardware_metrics(log_dir);
    let active = active_families(log_dir);
    debug!(count = active.len(), families = ?active, "active deployment families");

    let output = match active.as_slice() {
        [] => {
            debug!("no deployments were active during the window");
            ReportOutput::NoneActive
        }
        [family] => {
            let header = single_header();
            let rows = single_rows(log_dir, *family, &hardware_metrics);
            append_rows(single_results_file, &header, &rows)?;
            ReportOutput::Single { header, rows }
        }
        _ => {
            let schema = ComboSchema::build()?;
            let row = combined_row(log_dir, &active, &hardware_metrics, &schema);
            append_rows(combo_results_file, &schema.header, std::slice::from_ref(&row))?;
            ReportOutput::Combined {
                header: schema.header,
                row,
            }
        }
    };

    debug!("finished processing and writing results");
    Ok(output)
}

/// Families with at least one `{family}-*.log` file in the log directory.
/// Supplemental `info-*` logs never activate a family on their own.
fn active_families(log_dir: &Path) -> Vec<DeploymentFamily> {
    DeploymentFamily::all()
        .filter(|family| !family_log_files(log_dir, *family).is_empty())
        .collect()
}

/// All `{family}-*.log` files in the log directory, sorted by name.
fn family_log_files(log_dir: &Path, family: DeploymentFamily) -> Vec<PathBuf> {
    let prefix = family.log_prefix();
    let mut files: Vec<PathBuf> = match fs::read_dir(log_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".log"))
            })
            .collect(),
        Err(err) => {
            error!(dir = %log_dir.display(), %err, "cannot list log directory");
            Vec::new()
        }
    };
    files.sort();
    files
}

/// One single-report row per captured log file of the active family.
fn single_rows(
    log_dir: &Path,
    family: DeploymentFamily,
    hardware_metrics: &HardwareMetrics,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for log_path in family_log_files(log_dir, family) {
        debug!(file = %log_path.display(), "processing pod log file");
        let logs = fs::read_to_string(&log_path).unwrap_or_else(|err| {
            error!(path = %log_path.display(), %err, "failed to read log file");
            String::new()
        });

        let camera_number = camera::camera_count(&logs, family);
        info!(family = %family, camera = ?camera_number, "camera number");

        let metrics = dispatch::collect_metrics(family, &log_path, log_dir);

        let mut row = vec![
            family.to_string(),
            camera_number.unwrap_or_default(),
        ];
        row.extend(hardware_metrics.cells());
        for kind in [
            MetricKind::ServerLoad,
            MetricKind::SampleRate,
            MetricKind::QueueSize,
            MetricKind::Fps,
            MetricKind::MotionCount,
        ] {
            row.push(metric_cell(&metrics, kind));
        }
        rows.push(row);
    }

    rows
}

/// The one wide combined-report row for a multi-family run.
fn combined_row(
    log_dir: &Path,
    active: &[DeploymentFamily],
    hardware_metrics: &HardwareMetrics,
    schema: &ComboSchema,
) -> Vec<String> {
    let mut row = vec![String::new(); schema.width()];
    row[..4].clone_from_slice(&hardware_metrics.cells());

    for &family in active {
        // Only the first captured log file of each family feeds the combined
        // row; a family can still be measured even when it owns no columns.
        let Some(log_path) = family_log_files(log_dir, family).into_iter().next() else {
            continue;
        };
        let logs = fs::read_to_string(&log_path).unwrap_or_else(|err| {
            error!(path = %log_path.display(), %err, "failed to read log file");
            String::new()
        });

        let metrics = dispatch::collect_metrics(family, &log_path, log_dir);
        let camera_number = camera::camera_count(&logs, family);
        info!(family = %family, camera = ?camera_number, "camera number");

        let Some(slots) = schema.slots.get(&family) else {
            debug!(family = %family, "family has no combined-report columns");
            continue;
        };
        row[slots.camera] = camera_number.unwrap_or_default();
        for &(kind, index) in &slots.metrics {
            row[index] = metric_cell(&metrics, kind);
            debug!(family = %family, metric = %kind, column = index, "assigned combined cell");
        }
    }

    row
}

fn metric_cell(metrics: &HashMap<MetricKind, MetricOutcome>, kind: MetricKind) -> String {
    metrics.get(&kind).map(MetricOutcome::to_cell).unwrap_or_default()
}

/// Append `rows` to the CSV file at `path`, writing `header` first only when
/// the file is newly created or currently empty.
fn append_rows(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let needs_header = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
        Err(err) => {
            return Err(err).wrap_err_with(|| format!("cannot stat report file {}", path.display()))
        }
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("cannot open report file {} for append", path.display()))?;

    if needs_header {
        write_record(&mut file, header)?;
    }
    for row in rows {
        write_record(&mut file, row)?;
    }
    Ok(())
}

fn write_record(writer: &mut impl Write, cells: &[String]) -> Result<()> {
    let line = cells.iter().map(|cell| quote_cell(cell)).collect::<Vec<_>>().join(",");
    writeln!(writer, "{line}").wrap_err("failed to write report row")?;
    Ok(())
}

/// Standard CSV quoting: cells containing a comma, quote or line break are
/// wrapped in double quotes with inner quotes doubled.
fn quote_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn paths(dir: &TempDir) -> (PathBuf, PathBuf) {
        (
            dir.path().join("single_results.csv"),
            dir.path().join("combo_results.csv"),
        )
    }

    #[test]
    fn combo_schema_matches_the_published_layout() {
        let schema = ComboSchema::build().unwrap();
        assert_eq!(schema.width(), 17);
        assert_eq!(schema.header[0], "VRAM (MB)");
        assert_eq!(schema.header[4], "ids - Camera Number");
        assert_eq!(schema.header[5], "ids - Server Load (%)");
        assert_eq!(schema.header[6], "ids - Motion Count");
        assert_eq!(schema.header[7], "ptd - Camera Number");
        assert_eq!(schema.header[9], "tfa - Camera Number");
        assert_eq!(schema.header[10], "tfa - Num Samples");
        assert_eq!(schema.header[11], "fds - Camera Number");
        assert_eq!(schema.header[12], "fds - Queue Size");
        assert_eq!(schema.header[13], "frs - Camera Number");
        assert_eq!(schema.header[14], "frs - FPS");
        assert_eq!(schema.header[15], "aod - Camera Number");
        assert_eq!(schema.header[16], "aod - Server Load (%)");
    }

    #[test]
    fn combo_schema_ownership_is_disjoint() {
        let schema = ComboSchema::build().unwrap();
        let mut seen = HashSet::new();
        for slots in schema.slots.values() {
            assert!(seen.insert(slots.camera));
            for (_, index) in &slots.metrics {
                assert!(seen.insert(*index));
            }
        }
    }

    #[test]
    fn duplicate_reservation_is_rejected() {
        let mut schema = ComboSchema {
            header: HARDWARE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            slots: HashMap::new(),
        };
        schema.reserve(DeploymentFamily::Fds, &[MetricKind::QueueSize]).unwrap();
        assert!(schema
            .reserve(DeploymentFamily::Fds, &[MetricKind::QueueSize])
            .is_err());
    }

    #[test]
    fn zero_active_families_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        let output = process_and_write_results(dir.path(), &single, &combo).unwrap();
        assert_eq!(output, ReportOutput::NoneActive);
        assert!(!single.exists());
        assert!(!combo.exists());
    }

    #[test]
    fn single_family_produces_single_report() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        std::fs::write(dir.path().join("frs-pod-1.log"), "FPS:25.0\nFPS:35.0\n").unwrap();

        let output = process_and_write_results(dir.path(), &single, &combo).unwrap();
        let ReportOutput::Single { rows, .. } = output else {
            panic!("expected single report, got {output:?}");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "frs");
        assert_eq!(rows[0][1], ""); // frs never logs a camera count
        assert_eq!(rows[0][9], "30 (2)"); // FPS column
        assert_eq!(rows[0][6], ""); // server load not applicable

        let contents = std::fs::read_to_string(&single).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Deployment Name,Camera Number,VRAM (MB)"));
        assert!(!combo.exists());
    }

    #[test]
    fn header_is_never_duplicated_across_runs() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        std::fs::write(dir.path().join("frs-pod-1.log"), "FPS:25.0\n").unwrap();

        process_and_write_results(dir.path(), &single, &combo).unwrap();
        process_and_write_results(dir.path(), &single, &combo).unwrap();

        let contents = std::fs::read_to_string(&single).unwrap();
        let header_count = contents
            .lines()
            .filter(|line| line.starts_with("Deployment Name"))
            .count();
        assert_eq!(header_count, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn multiple_families_produce_one_combined_row() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        std::fs::write(
            dir.path().join("ids-pod-1.log"),
            "Batch size: 3\nServer load: 40%\nServer load: 60%\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("ptd-pod-1.log"),
            "Number of cameras: 7\nServer load: 20%\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("hw_output.txt"),
            "Average VRAM: 1024\nAverage RAM: 12\nAverage CPU: 50\nAverage GPU: 70\n",
        )
        .unwrap();

        let output = process_and_write_results(dir.path(), &single, &combo).unwrap();
        let ReportOutput::Combined { row, .. } = output else {
            panic!("expected combined report, got {output:?}");
        };
        assert_eq!(row.len(), 17);
        assert_eq!(&row[..4], ["1024", "12", "50", "70"]);
        assert_eq!(row[4], "3"); // ids camera (batch size)
        assert_eq!(row[5], "50% (2)"); // ids server load
        assert_eq!(row[6], ""); // ids motion: no info log captured
        assert_eq!(row[7], "7"); // ptd camera
        assert_eq!(row[8], "20% (1)"); // ptd server load
        for cell in &row[9..] {
            assert_eq!(cell, "");
        }

        assert!(!single.exists());
        assert_eq!(std::fs::read_to_string(&combo).unwrap().lines().count(), 2);
    }

    #[test]
    fn family_without_columns_still_leaves_row_intact() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        // rmd has no combined-report columns; ids does.
        std::fs::write(dir.path().join("rmd-pod-1.log"), "Server load: 30%\n").unwrap();
        std::fs::write(dir.path().join("ids-pod-1.log"), "Server load: 40%\n").unwrap();

        let output = process_and_write_results(dir.path(), &single, &combo).unwrap();
        let ReportOutput::Combined { row, .. } = output else {
            panic!("expected combined report");
        };
        assert_eq!(row[5], "40% (1)"); // ids server load
        // rmd contributed nothing anywhere.
        for cell in &row[7..] {
            assert_eq!(cell, "");
        }
    }

    #[test]
    fn missing_extractor_data_renders_the_error_sentinel() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        std::fs::write(dir.path().join("frs-pod-1.log"), "no fps lines at all\n").unwrap();

        let output = process_and_write_results(dir.path(), &single, &combo).unwrap();
        let ReportOutput::Single { rows, .. } = output else {
            panic!("expected single report");
        };
        assert_eq!(rows[0][9], "error");
    }

    #[test]
    fn cells_with_commas_and_newlines_are_quoted() {
        let mut buffer = Vec::new();
        write_record(
            &mut buffer,
            &["a,b".to_string(), "plain".to_string(), "{\n  \"k\": \"v\"\n}".to_string()],
        )
        .unwrap();
        let line = String::from_utf8(buffer).unwrap();
        assert_eq!(line, "\"a,b\",plain,\"{\n  \"\"k\"\": \"\"v\"\"\n}\"\n");
    }

    #[test]
    fn bucketed_cell_survives_csv_round_trip() {
        let dir = TempDir::new().unwrap();
        let (single, combo) = paths(&dir);
        std::fs::write(
            dir.path().join("tfa-pod-1.log"),
            "Num samples: 5\nServer load of inference 42%\n",
        )
        .unwrap();

        let output = process_and_write_results(dir.path(), &single, &combo).unwrap();
        let ReportOutput::Single { rows, .. } = output else {
            panic!("expected single report");
        };
        assert!(rows[0][7].contains("\"0 - 10\": \"42.00% (1)\""));

        let contents = std::fs::read_to_string(&single).unwrap();
        // The JSON cell spans lines but stays inside one quoted CSV field.
        assert!(contents.contains("\"\"0 - 10\"\""));
    }
}
