// Per-instrument alarm thresholds
use serde::{Deserialize, Serialize};

/// Alarm tiers, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Warning,
    Alert,
    Shutdown,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Warning => "Warning",
            Tier::Alert => "Alert",
            Tier::Shutdown => "Shutdown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Tier::Warning => "yellow",
            Tier::Alert => "orange",
            Tier::Shutdown => "red",
        }
    }
}

/// Threshold magnitudes, applied symmetrically as ±value bands.
///
/// A tier that is missing, zero, negative or not finite is treated as
/// "no threshold" and never triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub alert: Option<f64>,
    #[serde(default)]
    pub warning: Option<f64>,
    #[serde(default)]
    pub shutdown: Option<f64>,
}

impl Thresholds {
    pub fn new(alert: Option<f64>, warning: Option<f64>, shutdown: Option<f64>) -> Self {
        Self {
            alert,
            warning,
            shutdown,
        }
    }

    pub fn get(&self, tier: Tier) -> Option<f64> {
        let value = match tier {
            Tier::Warning => self.warning,
            Tier::Alert => self.alert,
            Tier::Shutdown => self.shutdown,
        };
        value.filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Configured tiers and their values, sorted by ascending value.
    pub fn active(&self) -> Vec<(Tier, f64)> {
        let mut tiers: Vec<(Tier, f64)> = [Tier::Warning, Tier::Alert, Tier::Shutdown]
            .into_iter()
            .filter_map(|tier| self.get(tier).map(|v| (tier, v)))
            .collect();
        tiers.sort_by(|a, b| a.1.total_cmp(&b.1));
        tiers
    }

    /// Largest configured threshold, or 0 when none is set.
    pub fn max(&self) -> f64 {
        self.active().into_iter().map(|(_, v)| v).fold(0.0, f64::max)
    }

    /// Whether a magnitude meets or exceeds any configured tier. NaN never does.
    pub fn is_exceeded_by(&self, magnitude: f64) -> bool {
        self.active().into_iter().any(|(_, v)| magnitude >= v)
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }
}
