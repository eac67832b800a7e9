//! Camera/batch count extraction, keyed by deployment family.

use crate::family::DeploymentFamily;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMBER_OF_CAMERAS: Regex = Regex::new(r"Number of cameras: (\d+)").unwrap();
    static ref TOTAL_NUMBER_OF_CAMERAS: Regex = Regex::new(r"Total number of cameras:(\d+)").unwrap();
    static ref BATCH_SIZE: Regex = Regex::new(r"Batch size: (\d+)").unwrap();
}

/// Extract the deployment's camera (or batch) count from its log text.
///
/// Each family logs the count in its own format; `frs` never logs one. For
/// `tfa` the logged value is a batch size covering two cameras each, so the
/// parsed value is doubled.
pub fn camera_count(log: &str, family: DeploymentFamily) -> Option<String> {
    use DeploymentFamily::*;

    match family {
        Ptd | Rmd | Aod => first_capture(&NUMBER_OF_CAMERAS, log),
        Fds | Snfds | Sfds | Tds => first_capture(&TOTAL_NUMBER_OF_CAMERAS, log),
        Ids => first_capture(&BATCH_SIZE, log),
        Tfa => BATCH_SIZE
            .captures(log)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .map(|batch| (batch * 2).to_string()),
        Frs => None,
    }
}

fn first_capture(pattern: &Regex, log: &str) -> Option<String> {
    pattern.captures(log).map(|caps| caps[1].to_string())
}
