use strum::{
    Display,
    EnumIter,
    EnumString,
};

/// The closed set of workload deployment families under benchmark.
///
/// The variant order matches the order in which capture workers are spawned;
/// the lowercase string form is both the cluster namespace of the family and
/// the prefix of its captured log files (`{family}-*.log`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DeploymentFamily {
    /// Restricted-movement detection.
    Rmd,
    /// Intruder detection.
    Ids,
    /// People/thing detection.
    Ptd,
    /// Thermal/fire analytics (batched).
    Tfa,
    /// Face detection service.
    Fds,
    /// Secondary face detection service.
    Sfds,
    /// Night face detection service.
    Snfds,
    /// Thermal detection service.
    Tds,
    /// Abandoned-object detection.
    Aod,
    /// Face recognition service.
    Frs,
}

impl DeploymentFamily {
    /// Glob-style prefix of this family's captured log files.
    pub fn log_prefix(&self) -> String {
        format!("{self}-")
    }

    /// Every family, in capture order.
    pub fn all() -> impl Iterator<Item = DeploymentFamily> {
        use strum::IntoEnumIterator;
        Self::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn lowercase_round_trip() {
        for family in DeploymentFamily::iter() {
            let name = family.to_string();
            assert_eq!(name, name.to_lowercase());
            assert_eq!(DeploymentFamily::from_str(&name).unwrap(), family);
        }
    }

    #[test]
    fn unknown_family_does_not_parse() {
        assert!(DeploymentFamily::from_str("ads").is_err());
        assert!(DeploymentFamily::from_str("").is_err());
    }

    #[test]
    fn log_prefix_has_trailing_dash() {
        assert_eq!(DeploymentFamily::Ids.log_prefix(), "ids-");
    }
}
