//! # Pattern Extractors
//!
//! Pure functions over captured log text, one per metric kind. Each scans
//! the block line by line for one textual pattern and reduces the matches to
//! a summary [`MetricOutcome`]. None of them fail: a block without matches
//! yields `NoData` (or `NotApplicable` for motion alerts, where absence is
//! the normal case for non-ids logs).

use crate::metrics::MetricOutcome;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{
    BTreeMap,
    HashMap,
};
use tracing::warn;

/// Bucket width for the sample-rate correlation.
const SAMPLE_BUCKET_STEP: usize = 10;
/// Number of sample-rate buckets, covering `[0, 200)`.
const SAMPLE_BUCKET_COUNT: usize = 20;

lazy_static! {
    static ref LOAD_PERCENT: Regex = Regex::new(r"(\d+)%").unwrap();
    static ref QUEUE_SIZE: Regex = Regex::new(r"Inference queue size: (\d+(?:\.\d+)?)").unwrap();
    static ref FPS: Regex = Regex::new(r"FPS:(\d+\.\d+)").unwrap();
    static ref MOTION_ALERTS: Regex =
        Regex::new(r"\[.*\] Number of motion alerts from camera: \[(.*?)\](\d+)").unwrap();
    static ref INFERENCE_LOAD: Regex = Regex::new(r"Server load of inference (\d+)%").unwrap();
    static ref NUM_SAMPLES: Regex = Regex::new(r"Num samples: (\d+(?:\.\d+)?)").unwrap();
}

fn mean(sum: f64, count: usize) -> f64 {
    sum / count as f64
}

/// Round to two decimal places, Display-formatted without trailing zeros.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average server load: every line is scanned for a percentage token; the
/// result is `"{mean rounded to 2 decimals}% ({count})"`.
pub fn average_load(log: &str) -> MetricOutcome {
    let loads: Vec<i64> = log
        .lines()
        .filter_map(|line| LOAD_PERCENT.captures(line))
        .filter_map(|caps| caps[1].parse().ok())
        .collect();

    if loads.is_empty() {
        warn!("no server load data found in log block");
        return MetricOutcome::NoData;
    }

    let avg = mean(loads.iter().sum::<i64>() as f64, loads.len());
    MetricOutcome::Value(format!("{}% ({})", round2(avg), loads.len()))
}

/// Average inference queue size, `"{mean} ({count})"`. The mean is reported
/// in its raw float form, deliberately unrounded.
pub fn queue_size(log: &str) -> MetricOutcome {
    let sizes: Vec<f64> = log
        .lines()
        .filter_map(|line| QUEUE_SIZE.captures(line))
        .filter_map(|caps| caps[1].parse().ok())
        .collect();

    if sizes.is_empty() {
        warn!("no queue size data found in log block");
        return MetricOutcome::NoData;
    }

    let avg = mean(sizes.iter().sum(), sizes.len());
    MetricOutcome::Value(format!("{} ({})", avg, sizes.len()))
}

/// Average frame rate from strict `FPS:<digits>.<digits>` tokens.
pub fn fps(log: &str) -> MetricOutcome {
    let values: Vec<f64> = log
        .lines()
        .filter_map(|line| FPS.captures(line))
        .filter_map(|caps| caps[1].parse().ok())
        .collect();

    if values.is_empty() {
        warn!("no FPS data found in log block");
        return MetricOutcome::NoData;
    }

    let avg = mean(values.iter().sum(), values.len());
    MetricOutcome::Value(format!("{} ({})", avg, values.len()))
}

/// Motion alert count from the ids info log: per-camera alert counts are
/// averaged, and the result is the rounded sum of those averages.
///
/// A block without any motion lines is `NotApplicable`, not `NoData`:
/// absence of motion data is normal outside ids deployments.
pub fn motion_count(log: &str) -> MetricOutcome {
    let mut per_camera: HashMap<String, Vec<i64>> = HashMap::new();

    for line in log.lines() {
        if let Some(caps) = MOTION_ALERTS.captures(line) {
            if let Ok(count) = caps[2].parse::<i64>() {
                per_camera.entry(caps[1].to_string()).or_default().push(count);
            }
        }
    }

    if per_camera.is_empty() {
        return MetricOutcome::NotApplicable;
    }

    let sum_of_averages: f64 = per_camera
        .values()
        .map(|counts| mean(counts.iter().sum::<i64>() as f64, counts.len()))
        .sum();
    MetricOutcome::Count(sum_of_averages.round() as i64)
}

/// Sample-rate bucketing: a lag-one correlation between `Num samples` values
/// and the `Server load of inference N%` line that follows them.
///
/// Sample values accumulate into a running chunk. Each load line closes the
/// current chunk: the chunk's mean selects one of 20 width-10 buckets and the
/// load value that closed it is attributed to that bucket. Sample values seen
/// after the final load line are discarded. Each non-empty bucket renders as
/// `"{mean load}% ({count})"`, keyed `"{lo} - {hi}"`, ascending.
pub fn sample_rate_buckets(log: &str) -> MetricOutcome {
    let mut buckets: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
    let mut chunk_sum = 0.0;
    let mut chunk_count = 0usize;

    for line in log.lines() {
        let line = line.trim();

        if let Some(caps) = INFERENCE_LOAD.captures(line) {
            if let Ok(load) = caps[1].parse::<i64>() {
                if chunk_count > 0 {
                    let chunk_avg = mean(chunk_sum, chunk_count);
                    chunk_sum = 0.0;
                    chunk_count = 0;

                    if let Some(index) = bucket_index(chunk_avg) {
                        buckets.entry(index).or_default().push(load);
                    }
                }
            }
        }

        if let Some(caps) = NUM_SAMPLES.captures(line) {
            if let Ok(value) = caps[1].parse::<f64>() {
                chunk_sum += value;
                chunk_count += 1;
            }
        }
    }

    if buckets.is_empty() {
        warn!("no inference load / sample pairs found in log block");
        return MetricOutcome::NoData;
    }

    let formatted = buckets
        .into_iter()
        .map(|(index, loads)| {
            let label = format!(
                "{} - {}",
                index * SAMPLE_BUCKET_STEP,
                (index + 1) * SAMPLE_BUCKET_STEP
            );
            let avg = mean(loads.iter().sum::<i64>() as f64, loads.len());
            (label, format!("{:.2}% ({})", avg, loads.len()))
        })
        .collect();
    MetricOutcome::Buckets(formatted)
}

/// Index of the width-10 bucket containing `value`, or `None` if the value
/// falls outside the covered `[0, 200)` range.
fn bucket_index(value: f64) -> Option<usize> {
    (0..SAMPLE_BUCKET_COUNT).find(|i| {
        (i * SAMPLE_BUCKET_STEP) as f64 <= value && value < ((i + 1) * SAMPLE_BUCKET_STEP) as f64
    })
}
