//! Log-directory cleanup between benchmark runs.

use eyre::{
    Result,
    WrapErr,
};
use std::{
    fs,
    path::Path,
};
use tracing::debug;

/// Delete all captured `*.log` files and the hardware blob from the log
/// directory. Report CSVs are kept; they accumulate across runs. A missing
/// directory is created so the capture workers have somewhere to write.
pub fn clean_logs(log_dir: &Path) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .wrap_err_with(|| format!("cannot create log directory {}", log_dir.display()))?;
        debug!(dir = %log_dir.display(), "created log directory");
        return Ok(());
    }

    for entry in fs::read_dir(log_dir)
        .wrap_err_with(|| format!("cannot list log directory {}", log_dir.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.ends_with(".log") || name == crate::hardware::HW_OUTPUT_FILE {
            fs::remove_file(&path)
                .wrap_err_with(|| format!("cannot delete {}", path.display()))?;
            debug!(file = name, "deleted captured file");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    #[test]
    fn removes_logs_and_blob_but_keeps_reports() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ids-pod-1.log"), "x").unwrap();
        std::fs::write(dir.path().join("hw_output.txt"), "x").unwrap();
        std::fs::write(dir.path().join("single_results.csv"), "x").unwrap();

        clean_logs(dir.path()).unwrap();

        assert!(!dir.path().join("ids-pod-1.log").exists());
        assert!(!dir.path().join("hw_output.txt").exists());
        assert!(dir.path().join("single_results.csv").exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("bench");
        clean_logs(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
