//! # Deployment Metric Dispatcher
//!
//! Maps each deployment family to its ordered list of applicable pattern
//! extractors and runs them against the family's captured log, collecting
//! outcomes keyed by [`MetricKind`].

use crate::{
    extract,
    family::DeploymentFamily,
    metrics::{
        MetricKind,
        MetricOutcome,
    },
};
use std::{
    collections::HashMap,
    fs,
    path::Path,
};
use tracing::{
    error,
    info,
};

/// The ordered extractor list applicable to a deployment family.
pub fn extractors_for(family: DeploymentFamily) -> &'static [MetricKind] {
    use DeploymentFamily::*;
    use MetricKind::*;

    match family {
        Ids => &[ServerLoad, MotionCount],
        Tfa => &[SampleRate],
        Fds | Sfds | Snfds | Tds => &[QueueSize],
        Frs => &[Fps],
        Ptd | Rmd | Aod => &[ServerLoad],
    }
}

/// Run every applicable extractor for `family` against its primary log file.
///
/// The motion-count extractor is special-cased: it reads the separately
/// captured `info-ids-*.log` file rather than the primary pod log, and when
/// no such file exists the outcome is `NotApplicable`. Every outcome is
/// logged so interactive runs show the numbers without opening the CSV.
pub fn collect_metrics(
    family: DeploymentFamily,
    log_path: &Path,
    log_dir: &Path,
) -> HashMap<MetricKind, MetricOutcome> {
    let primary = read_log(log_path);
    let mut results = HashMap::new();

    for &kind in extractors_for(family) {
        let outcome = match kind {
            MetricKind::MotionCount => match info_log_path(log_dir, family) {
                Some(info_path) => match read_log(&info_path) {
                    Some(text) => extract::motion_count(&text),
                    None => MetricOutcome::NoData,
                },
                None => MetricOutcome::NotApplicable,
            },
            _ => match &primary {
                Some(text) => run_extractor(kind, text),
                None => MetricOutcome::NoData,
            },
        };

        match &outcome {
            MetricOutcome::Buckets(_) => {
                info!(family = %family, metric = %kind, "result:\n\n{}\n", outcome.to_cell());
            }
            _ => info!(family = %family, metric = %kind, result = %outcome.to_cell()),
        }
        results.insert(kind, outcome);
    }

    results
}

fn run_extractor(kind: MetricKind, log: &str) -> MetricOutcome {
    match kind {
        MetricKind::ServerLoad => extract::average_load(log),
        MetricKind::SampleRate => extract::sample_rate_buckets(log),
        MetricKind::QueueSize => extract::queue_size(log),
        MetricKind::Fps => extract::fps(log),
        MetricKind::MotionCount => extract::motion_count(log),
    }
}

fn read_log(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            error!(path = %path.display(), %err, "failed to read log file");
            None
        }
    }
}

/// First `info-{family}-*.log` file in the log directory, if any. Sorted for
/// determinism since directory order is arbitrary.
fn info_log_path(log_dir: &Path, family: DeploymentFamily) -> Option<std::path::PathBuf> {
    let prefix = format!("info-{family}-");
    let mut matches: Vec<_> = fs::read_dir(log_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".log"))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}
