//! Parser for the hardware-metrics blob copied back from the remote host.

use crate::metrics::HardwareMetrics;
use std::path::Path;
use tracing::error;

/// File name of the probe output inside the log directory.
pub const HW_OUTPUT_FILE: &str = "hw_output.txt";

/// Read and parse `hw_output.txt` from the log directory.
///
/// A missing or unreadable file is logged and yields an empty mapping; the
/// report simply carries empty hardware cells in that case.
pub fn read_hardware_metrics(log_dir: &Path) -> HardwareMetrics {
    let path = log_dir.join(HW_OUTPUT_FILE);
    match std::fs::read_to_string(&path) {
        Ok(text) => parse_hardware_metrics(&text),
        Err(err) => {
            error!(path = %path.display(), %err, "hardware metrics file not readable");
            HardwareMetrics::default()
        }
    }
}

/// Parse the four-line `Average <NAME>: <value>` format produced by the
/// probe script. Unknown lines are ignored; a recognized line without a
/// colon is skipped.
pub fn parse_hardware_metrics(text: &str) -> HardwareMetrics {
    let mut metrics = HardwareMetrics::default();

    for line in text.lines() {
        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();

        if line.contains("Average VRAM") {
            metrics.vram = Some(value);
        } else if line.contains("Average RAM") {
            metrics.ram = Some(value);
        } else if line.contains("Average CPU") {
            metrics.cpu = Some(value);
        } else if line.contains("Average GPU") {
            metrics.gpu = Some(value);
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn parses_the_probe_format() {
        let blob = "\
Average VRAM usage: 1024 MB
Average RAM usage: 12.4 GB
Average CPU usage: 55.1 %
Average GPU usage: 71 %
";
        let metrics = parse_hardware_metrics(blob);
        assert_eq!(metrics.vram.as_deref(), Some("1024 MB"));
        assert_eq!(metrics.ram.as_deref(), Some("12.4 GB"));
        assert_eq!(metrics.cpu.as_deref(), Some("55.1 %"));
        assert_eq!(metrics.gpu.as_deref(), Some("71 %"));
    }

    #[test]
    fn ignores_unknown_and_malformed_lines() {
        let blob = "\
probe started
Average VRAM
Average CPU: 10 %
";
        let metrics = parse_hardware_metrics(blob);
        assert_eq!(metrics.vram, None);
        assert_eq!(metrics.cpu.as_deref(), Some("10 %"));
    }

    #[test]
    fn missing_file_yields_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let metrics = read_hardware_metrics(dir.path());
        assert!(metrics.is_empty());
    }
}
