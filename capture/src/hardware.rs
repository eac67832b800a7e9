//! Remote hardware probe over SSH.
//!
//! The probe is a shell script that samples VRAM/RAM/CPU/GPU usage on the
//! physical host for the duration of the observation window and writes the
//! averages to a text blob. This module copies the script over, runs it, and
//! copies the blob back into the log directory, using `sshpass` + `ssh`/`scp`
//! subprocesses for password authentication.

use eyre::{
    eyre,
    Result,
    WrapErr,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    process::Output,
    time::Duration,
};
use tokio::process::Command;
use tracing::{
    debug,
    error,
    info,
};

// The local blob must land exactly where the reporter looks for it, so the
// file name is the reporter's constant, not a copy.
pub use inference_bench_reporter::hardware::HW_OUTPUT_FILE;

const REMOTE_SCRIPT_PATH: &str = "/tmp/hw.sh";
const REMOTE_OUTPUT_PATH: &str = "/tmp/hw_output.txt";

/// Connection details of the physical host carrying the inference hardware.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    pub user: String,
    pub ip: String,
    pub password: String,
    /// Local path of the probe script to ship over.
    pub script: PathBuf,
}

impl RemoteHost {
    fn target(&self) -> String {
        format!("{}@{}", self.user, self.ip)
    }
}

/// Run the full probe cycle: clear stale remote files, ship the script, run
/// it for `duration`, and copy the output blob into `log_dir`.
pub async fn run_hardware_probe(log_dir: &Path, duration: Duration, host: &RemoteHost) -> Result<()> {
    let target = host.target();
    let local_output = log_dir.join(HW_OUTPUT_FILE);

    let cleanup = format!("rm -f {REMOTE_SCRIPT_PATH} {REMOTE_OUTPUT_PATH}");
    run_logged(ssh_command(host, &[&target, &cleanup])).await?;

    let script = host
        .script
        .to_str()
        .ok_or_else(|| eyre!("probe script path is not valid UTF-8"))?;
    run_logged(scp_command(host, &[script, &format!("{target}:{REMOTE_SCRIPT_PATH}")])).await?;

    let run_probe = format!("bash {REMOTE_SCRIPT_PATH} {}", duration.as_secs());
    run_logged(ssh_command(host, &[&target, &run_probe])).await?;

    let local = local_output
        .to_str()
        .ok_or_else(|| eyre!("log directory path is not valid UTF-8"))?;
    run_logged(scp_command(host, &[&format!("{target}:{REMOTE_OUTPUT_PATH}"), local])).await?;

    match tokio::fs::read_to_string(&local_output).await {
        Ok(blob) => info!("hardware metrics results:\n\n{blob}"),
        Err(err) => error!(path = %local_output.display(), %err, "probe output was not copied back"),
    }
    Ok(())
}

fn ssh_command(host: &RemoteHost, args: &[&str]) -> Command {
    let mut command = Command::new("sshpass");
    command
        .arg("-p")
        .arg(&host.password)
        .arg("ssh")
        .args(["-o", "StrictHostKeyChecking=no"])
        .args(args);
    command
}

fn scp_command(host: &RemoteHost, args: &[&str]) -> Command {
    let mut command = Command::new("sshpass");
    command
        .arg("-p")
        .arg(&host.password)
        .arg("scp")
        .args(args);
    command
}

/// Run a probe subprocess to completion, logging its streams: stdout at info
/// level, stderr at error level, matching how interactive runs are read.
async fn run_logged(mut command: Command) -> Result<Output> {
    debug!(command = ?command.as_std(), "running probe command");
    let output = command.output().await.wrap_err("failed to spawn probe command")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        info!("stdout: {stdout}");
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        error!("stderr: {stderr}");
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    #[test]
    fn probe_output_lands_where_the_reporter_reads() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(HW_OUTPUT_FILE), "Average CPU: 10 %\n").unwrap();

        let metrics = inference_bench_reporter::read_hardware_metrics(dir.path());
        assert_eq!(metrics.cpu.as_deref(), Some("10 %"));
    }
}
