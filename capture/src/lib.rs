//! # Inference Bench Capture
//!
//! The data-gathering collaborators of the benchmark harness. Everything in
//! this crate only materializes raw text into the log directory; all
//! interpretation happens in `inference-bench-reporter`.
//!
//! - **`logs`**: streams pod logs from the cluster into per-pod files for
//!   the duration of the observation window
//! - **`hardware`**: runs the hardware probe script on a remote physical
//!   host over SSH and copies its output blob back
//! - **`cleanup`**: clears captured logs between runs

pub mod cleanup;
pub mod hardware;
pub mod logs;

pub use cleanup::clean_logs;
pub use hardware::{
    run_hardware_probe,
    RemoteHost,
};
pub use logs::capture_family_logs;
