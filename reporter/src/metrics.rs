//! Metric kinds, extraction outcomes and the hardware-metrics mapping.

use serde::Serialize;
use strum::{
    Display,
    EnumIter,
};

/// Identity of a pattern extractor. The display form doubles as the metric's
/// report column title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MetricKind {
    #[strum(serialize = "Server Load (%)")]
    ServerLoad,
    #[strum(serialize = "Num Samples")]
    SampleRate,
    #[strum(serialize = "Queue Size")]
    QueueSize,
    #[strum(serialize = "FPS")]
    Fps,
    #[strum(serialize = "Motion Count")]
    MotionCount,
}

/// Outcome of a single pattern extraction.
///
/// Extractors never fail with an `Err`: malformed or absent input degrades to
/// one of the sentinel variants so that one bad log can never abort the
/// processing of other deployments.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricOutcome {
    /// A formatted display value, e.g. `"42.5% (12)"`.
    Value(String),
    /// Ordered bucket-label → display-value pairs from the sample-rate
    /// correlation, ascending by bucket lower bound.
    Buckets(Vec<(String, String)>),
    /// An integer count (motion alerts).
    Count(i64),
    /// The extractor's pattern matched nothing at all.
    NoData,
    /// The metric does not apply to this log (normal, not a failure).
    NotApplicable,
}

impl MetricOutcome {
    /// Render the outcome into a report cell.
    ///
    /// `NoData` keeps the literal `"error"` sentinel of the historical report
    /// format; `NotApplicable` renders empty. Buckets are serialized as a
    /// pretty-printed JSON object in bucket order.
    pub fn to_cell(&self) -> String {
        match self {
            MetricOutcome::Value(value) => value.clone(),
            MetricOutcome::Buckets(buckets) => {
                let map: serde_json::Map<String, serde_json::Value> = buckets
                    .iter()
                    .map(|(label, value)| (label.clone(), serde_json::Value::String(value.clone())))
                    .collect();
                serde_json::to_string_pretty(&serde_json::Value::Object(map))
                    .unwrap_or_else(|_| "error".to_string())
            }
            MetricOutcome::Count(count) => count.to_string(),
            MetricOutcome::NoData => "error".to_string(),
            MetricOutcome::NotApplicable => String::new(),
        }
    }
}

/// Hardware telemetry averages parsed from the remote probe's output blob.
///
/// Absent keys render as empty report cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HardwareMetrics {
    pub vram: Option<String>,
    pub ram: Option<String>,
    pub cpu: Option<String>,
    pub gpu: Option<String>,
}

impl HardwareMetrics {
    /// The four hardware cells in report column order (VRAM, RAM, CPU, GPU).
    pub fn cells(&self) -> [String; 4] {
        [
            self.vram.clone().unwrap_or_default(),
            self.ram.clone().unwrap_or_default(),
            self.cpu.clone().unwrap_or_default(),
            self.gpu.clone().unwrap_or_default(),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.vram.is_none() && self.ram.is_none() && self.cpu.is_none() && self.gpu.is_none()
    }
}
