use crate::density::Tier;

/// Which overlay layers a view shows. Views receive this by value and ask
/// for changes through [`ViewMessage`]; nothing here is global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub show_grid: bool,
    pub show_labels: bool,
    pub show_badges: bool,
    pub show_legend: bool,
    pub show_stats: bool,
    /// Zones below this tier are dimmed.
    pub min_tier: Option<Tier>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_labels: true,
            show_badges: true,
            show_legend: true,
            show_stats: true,
            min_tier: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMessage {
    ToggleGrid,
    ToggleLabels,
    ToggleBadges,
    ToggleLegend,
    ToggleStats,
    SetMinTier(Option<Tier>),
}

impl ViewOptions {
    pub fn update(self, message: ViewMessage) -> Self {
        match message {
            ViewMessage::ToggleGrid => Self {
                show_grid: !self.show_grid,
                ..self
            },
            ViewMessage::ToggleLabels => Self {
                show_labels: !self.show_labels,
                ..self
            },
            ViewMessage::ToggleBadges => Self {
                show_badges: !self.show_badges,
                ..self
            },
            ViewMessage::ToggleLegend => Self {
                show_legend: !self.show_legend,
                ..self
            },
            ViewMessage::ToggleStats => Self {
                show_stats: !self.show_stats,
                ..self
            },
            ViewMessage::SetMinTier(min_tier) => Self { min_tier, ..self },
        }
    }

    pub fn is_dimmed(&self, tier: Tier) -> bool {
        self.min_tier.is_some_and(|min| tier < min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_flip_one_flag() {
        let base = ViewOptions::default();
        let next = base.update(ViewMessage::ToggleLegend);
        assert!(!next.show_legend);
        assert_eq!(next.update(ViewMessage::ToggleLegend), base);
    }

    #[test]
    fn min_tier_dims_lower_tiers() {
        let view = ViewOptions::default().update(ViewMessage::SetMinTier(Some(Tier::Warning)));
        assert!(view.is_dimmed(Tier::Safe));
        assert!(!view.is_dimmed(Tier::Warning));
        assert!(!view.is_dimmed(Tier::Danger));
        assert!(!ViewOptions::default().is_dimmed(Tier::Safe));
    }
}
