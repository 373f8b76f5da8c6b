use serde::{Deserialize, Serialize};

/// Risk score boundaries for the SAFE / CAUTION / RISKY tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_safe_removal")]
    pub safe_removal: f64,

    #[serde(default = "default_caution_zone")]
    pub caution_zone: f64,
}

/// Defaults of 0.2 and 0.6 keep a deprecated, unused library (risk 1.0)
/// in CAUTION. Set `safe_removal: 1.0` to have such libraries removed
/// immediately.
impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            safe_removal: default_safe_removal(),
            caution_zone: default_caution_zone(),
        }
    }
}

impl RiskThresholds {
    /// Thresholds must satisfy `0 <= safe_removal <= caution_zone <= 1`.
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.safe_removal) {
            return Err(format!(
                "safe_removal must be between 0 and 1, got {}",
                self.safe_removal
            ));
        }
        if !in_range(self.caution_zone) {
            return Err(format!(
                "caution_zone must be between 0 and 1, got {}",
                self.caution_zone
            ));
        }
        if self.safe_removal > self.caution_zone {
            return Err(format!(
                "safe_removal ({}) must not exceed caution_zone ({})",
                self.safe_removal, self.caution_zone
            ));
        }
        Ok(())
    }
}

/// Impact assessment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Depth bound for indirect dependency traversal
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_safe_removal() -> f64 {
    0.2
}
fn default_caution_zone() -> f64 {
    0.6
}
fn default_max_depth() -> usize {
    3
}
