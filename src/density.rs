use serde::{Deserialize, Serialize};

const DEFAULT_LOW: f64 = 2.0;
const DEFAULT_HIGH: f64 = 4.0;

/// Qualitative risk classification of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Safe,
    Warning,
    Danger,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Safe, Tier::Warning, Tier::Danger];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Safe => "Safe",
            Tier::Warning => "Warning",
            Tier::Danger => "Danger",
        }
    }
}

/// Density boundaries in people/m². `low` opens Warning, `high` opens Danger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_high")]
    pub high: f64,
}

fn default_low() -> f64 {
    DEFAULT_LOW
}
fn default_high() -> f64 {
    DEFAULT_HIGH
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::PRODUCER
    }
}

impl Thresholds {
    /// Pair the upstream simulator classifies with when it reports
    /// `danger_zones`. Also the renderer's default.
    pub const PRODUCER: Thresholds = Thresholds {
        low: DEFAULT_LOW,
        high: DEFAULT_HIGH,
    };

    pub fn new(low: f64, high: f64) -> Option<Self> {
        let candidate = Self { low, high };
        candidate.is_valid().then_some(candidate)
    }

    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low >= 0.0 && self.low < self.high
    }
}

/// Result of classifying one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Density {
    pub value: f64,
    pub tier: Tier,
}

/// Occupants per m² and the tier it falls into. Non-positive or non-finite
/// areas yield a density of zero instead of dividing.
pub fn classify(occupant_count: u64, area: f64, thresholds: Thresholds) -> Density {
    let value = if area.is_finite() && area > 0.0 {
        occupant_count as f64 / area
    } else {
        0.0
    };

    let tier = if value >= thresholds.high {
        Tier::Danger
    } else if value >= thresholds.low {
        Tier::Warning
    } else {
        Tier::Safe
    };

    Density { value, tier }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundaries_are_inclusive_on_the_upper_tier() {
        let t = Thresholds::default();
        assert_eq!(classify(199, 100.0, t).tier, Tier::Safe);
        assert_eq!(classify(200, 100.0, t).tier, Tier::Warning);
        assert_eq!(classify(399, 100.0, t).tier, Tier::Warning);
        assert_eq!(classify(400, 100.0, t).tier, Tier::Danger);
    }

    #[test]
    fn degenerate_area_reads_as_empty() {
        let t = Thresholds::default();
        for area in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let d = classify(1000, area, t);
            assert_eq!(d.value, 0.0);
            assert_eq!(d.tier, Tier::Safe);
        }
    }

    #[test]
    fn rejects_inverted_thresholds() {
        assert!(Thresholds::new(4.0, 2.0).is_none());
        assert!(Thresholds::new(3.0, 3.0).is_none());
        assert!(Thresholds::new(f64::NAN, 3.0).is_none());
        assert_eq!(
            Thresholds::new(3.0, 3.5),
            Some(Thresholds { low: 3.0, high: 3.5 })
        );
    }

    proptest! {
        #[test]
        fn density_is_count_over_area(count in 0u64..100_000, area in 0.01f64..10_000.0) {
            let d = classify(count, area, Thresholds::default());
            prop_assert_eq!(d.value, count as f64 / area);
        }

        #[test]
        fn tier_is_monotonic_in_count(count in 0u64..10_000, area in 1.0f64..500.0, low in 0.1f64..5.0, gap in 0.1f64..5.0) {
            let t = Thresholds { low, high: low + gap };
            let a = classify(count, area, t).tier;
            let b = classify(count + 1, area, t).tier;
            prop_assert!(a <= b);
        }
    }
}
