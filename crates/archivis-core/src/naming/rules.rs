/// Naming-rules configuration document.
///
/// ```json
/// {
///   "large_drive_threshold_tb": 4.0,
///   "medium_drive_threshold_tb": 1.0,
///   "large_names": ["ATLAS", ...],
///   "medium_names": ["ORION", ...],
///   "small_names": ["PIXEL", ...]
/// }
/// ```
///
/// Thresholds are in tebibytes. Each pool is ordered by priority.
use crate::error::CatalogError;
use crate::model::registry::check_id;
use crate::model::size::bytes_to_tib;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity tier a drive falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Large,
    Medium,
    Small,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Large => "large",
            Self::Medium => "medium",
            Self::Small => "small",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingRules {
    pub large_drive_threshold_tb: f64,
    pub medium_drive_threshold_tb: f64,
    pub large_names: Vec<String>,
    pub medium_names: Vec<String>,
    pub small_names: Vec<String>,
}

impl NamingRules {
    /// Reject thresholds that would make tier selection meaningless.
    ///
    /// Empty pools are accepted here; they surface as an exhausted tier the
    /// first time a drive of that size shows up.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (label, value) in [
            ("large_drive_threshold_tb", self.large_drive_threshold_tb),
            ("medium_drive_threshold_tb", self.medium_drive_threshold_tb),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CatalogError::NamingRulesInvalid(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.large_drive_threshold_tb < self.medium_drive_threshold_tb {
            return Err(CatalogError::NamingRulesInvalid(format!(
                "large_drive_threshold_tb ({}) is below medium_drive_threshold_tb ({})",
                self.large_drive_threshold_tb, self.medium_drive_threshold_tb
            )));
        }
        for tier in [Tier::Large, Tier::Medium, Tier::Small] {
            if self.pool(tier).is_empty() {
                tracing::warn!("Naming rules: the {tier} name pool is empty");
            }
            if let Some((name, why)) = self
                .pool(tier)
                .iter()
                .find_map(|name| check_id(name).err().map(|why| (name, why)))
            {
                return Err(CatalogError::NamingRulesInvalid(format!(
                    "'{name}' in the {tier} pool cannot be a drive name: {why}"
                )));
            }
        }
        Ok(())
    }

    /// Tier for a drive of `capacity_bytes`. Checked largest first.
    pub fn tier_for(&self, capacity_bytes: u64) -> Tier {
        let tib = bytes_to_tib(capacity_bytes);
        if tib >= self.large_drive_threshold_tb {
            Tier::Large
        } else if tib >= self.medium_drive_threshold_tb {
            Tier::Medium
        } else {
            Tier::Small
        }
    }

    pub fn pool(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Large => &self.large_names,
            Tier::Medium => &self.medium_names,
            Tier::Small => &self.small_names,
        }
    }

    /// Starter rules written by `archivis init`.
    pub fn starter() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            large_drive_threshold_tb: 4.0,
            medium_drive_threshold_tb: 1.0,
            large_names: names(&["ATLAS", "TITAN", "KRONOS", "HYPERION", "OCEANUS", "RHEA"]),
            medium_names: names(&[
                "ORION", "LYRA", "VEGA", "SIRIUS", "ALTAIR", "DENEB", "RIGEL", "CASTOR",
            ]),
            small_names: names(&[
                "PIXEL", "SPARK", "EMBER", "FLINT", "PEBBLE", "QUILL", "ACORN", "TWIG",
            ]),
        }
    }
}
