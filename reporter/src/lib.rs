//! # Inference Bench Reporter
//!
//! The metrics extraction and report-assembly pipeline of the benchmark
//! harness. Consumes the log files and the hardware-metrics blob that the
//! capture workers have already materialized in the log directory, derives
//! per-deployment performance metrics and appends them to CSV report files.
//!
//! ## Architecture
//!
//! - **`family`**: the closed set of deployment families under benchmark
//! - **`metrics`**: metric kinds, extraction outcomes and hardware metrics
//! - **`extract`**: pure pattern extractors over captured log text
//! - **`camera`**: camera/batch count extraction, keyed by family
//! - **`dispatch`**: maps each family to its applicable extractors
//! - **`hardware`**: parser for the remote host's hardware-metrics blob
//! - **`report`**: report-shape selection, column schemas and CSV appending
//! - **`summary`**: terminal rendering of the rows that were just written
//!
//! ## Report shapes
//!
//! When exactly one deployment family produced logs during the observation
//! window, each of its log files becomes one row of the single-deployment
//! report. When several families were active, the whole run becomes one wide
//! row of the combined report, with every family writing into its reserved
//! columns. Extractor failures never abort the pipeline; they degrade to
//! sentinel cells (see [`metrics::MetricOutcome`]).

pub mod camera;
pub mod dispatch;
pub mod extract;
pub mod family;
pub mod hardware;
pub mod metrics;
pub mod report;
pub mod summary;

pub use family::DeploymentFamily;
pub use hardware::read_hardware_metrics;
pub use metrics::{
    HardwareMetrics,
    MetricKind,
    MetricOutcome,
};
pub use report::{
    process_and_write_results,
    ReportOutput,
};
