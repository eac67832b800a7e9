//! Pod log capture for one deployment family.
//!
//! Each family runs in its own cluster namespace. For the duration of the
//! observation window every pod's log stream is followed into
//! `<log_dir>/<pod>.log` via the cluster CLI. Pods of `ids` deployments get
//! one extra best-effort fetch of their on-disk info log shortly before the
//! deadline, written to `<log_dir>/info-<pod>.log`; that file carries the
//! motion-alert lines the reporter's motion extractor feeds on.

use eyre::{
    eyre,
    Result,
    WrapErr,
};
use futures::future::join_all;
use inference_bench_reporter::DeploymentFamily;
use std::{
    path::{
        Path,
        PathBuf,
    },
    process::Stdio,
    time::Duration,
};
use tokio::{
    io::{
        AsyncBufReadExt,
        AsyncWriteExt,
        BufReader,
    },
    process::Command,
};
use tracing::{
    debug,
    error,
};

const IDS_INFO_LOG_PATH: &str = "/var/log/ids/scylla-info.log";

/// Capture logs for every pod of `family`'s namespace until the window
/// closes. Per-pod failures are logged and swallowed; log capture never
/// fails a benchmark run, it just leaves fewer files behind.
pub async fn capture_family_logs(
    family: DeploymentFamily,
    duration: Duration,
    log_dir: &Path,
) -> Result<()> {
    let namespace = family.to_string();
    let pods = list_pods(&namespace).await?;
    debug!(family = %family, pods = pods.len(), "starting log capture");

    let mut tasks = Vec::new();
    for pod in pods {
        let namespace = namespace.clone();
        let log_dir = log_dir.to_path_buf();
        let is_ids = family == DeploymentFamily::Ids;

        tasks.push(tokio::spawn(async move {
            let stream = stream_pod_logs(&namespace, &pod, duration, &log_dir);
            let info_fetch = is_ids.then(|| {
                debug!(%pod, "capturing additional ids info log");
                capture_info_log(&namespace, &pod, duration, &log_dir)
            });

            let (streamed, fetched) = capture_pod(stream, info_fetch).await;
            if let Err(err) = streamed {
                error!(%namespace, %pod, %err, "pod log capture failed");
            }
            if let Some(Err(err)) = fetched {
                error!(%namespace, %pod, %err, "ids info log capture failed");
            }
        }));
    }

    join_all(tasks).await;
    Ok(())
}

/// Drive one pod's capture futures to completion against the same window
/// deadline. The info-log fetch must run alongside the stream, not after it:
/// its internal sleep targets the last second of the window, so sequencing
/// it behind the stream would both double the wall time of an ids run and
/// fetch motion lines logged after the window closed.
async fn capture_pod(
    stream: impl std::future::Future<Output = Result<()>>,
    info_fetch: Option<impl std::future::Future<Output = Result<()>>>,
) -> (Result<()>, Option<Result<()>>) {
    match info_fetch {
        Some(info) => {
            let (streamed, fetched) = tokio::join!(stream, info);
            (streamed, Some(fetched))
        }
        None => (stream.await, None),
    }
}

/// Names of the pods currently running in `namespace`.
async fn list_pods(namespace: &str) -> Result<Vec<String>> {
    let output = Command::new("kubectl")
        .args(["get", "pods", "-n", namespace, "-o", "name"])
        .output()
        .await
        .wrap_err("failed to run kubectl")?;

    if !output.status.success() {
        return Err(eyre!(
            "kubectl get pods -n {namespace} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.trim().strip_prefix("pod/").map(str::to_string))
        .collect())
}

/// Follow one pod's log stream into `<log_dir>/<pod>.log` until the window
/// deadline. Deadline expiry is normal completion, not an error.
async fn stream_pod_logs(
    namespace: &str,
    pod: &str,
    duration: Duration,
    log_dir: &Path,
) -> Result<()> {
    let log_path = log_dir.join(format!("{pod}.log"));
    let mut file = tokio::fs::File::create(&log_path)
        .await
        .wrap_err_with(|| format!("cannot create {}", log_path.display()))?;

    let mut child = Command::new("kubectl")
        .args(["logs", "--follow", pod, "-n", namespace])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .wrap_err("failed to spawn kubectl logs")?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| eyre!("kubectl logs produced no stdout handle"))?;
    let mut lines = BufReader::new(stdout).lines();

    let streamed = tokio::time::timeout(duration, async {
        while let Some(line) = lines.next_line().await? {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await?;
        }
        Ok::<_, eyre::Report>(())
    })
    .await;

    let _ = child.kill().await;
    match streamed {
        // Window closed while the stream was still live: the normal case.
        Err(_elapsed) => Ok(()),
        Ok(result) => result,
    }
}

/// Fetch the pod's on-disk info log just before the window closes.
async fn capture_info_log(
    namespace: &str,
    pod: &str,
    duration: Duration,
    log_dir: &Path,
) -> Result<()> {
    if duration > Duration::from_secs(1) {
        tokio::time::sleep(duration - Duration::from_secs(1)).await;
    }

    let output = Command::new("kubectl")
        .args(["exec", pod, "-n", namespace, "--", "cat", IDS_INFO_LOG_PATH])
        .output()
        .await
        .wrap_err("failed to run kubectl exec")?;

    if !output.status.success() {
        return Err(eyre!(
            "kubectl exec cat {IDS_INFO_LOG_PATH} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let info_path = info_log_path(log_dir, pod);
    tokio::fs::write(&info_path, &output.stdout)
        .await
        .wrap_err_with(|| format!("cannot write {}", info_path.display()))?;
    Ok(())
}

fn info_log_path(log_dir: &Path, pod: &str) -> PathBuf {
    log_dir.join(format!("info-{pod}.log"))
}
