use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::PremiumBandThresholds;
use crate::domain::change::Severity;
use crate::domain::snapshot::Coverage;

/// Qualitative size of a premium move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumBand {
    /// Flat or decreasing.
    Improvement,
    Minor,
    Moderate,
    Severe,
}

impl PremiumBand {
    /// `<= info` improvement, `< warning` minor, `<= critical` moderate,
    /// anything above critical severe.
    pub fn classify(percent: Decimal, thresholds: &PremiumBandThresholds) -> Self {
        if percent <= thresholds.info {
            Self::Improvement
        } else if percent < thresholds.warning {
            Self::Minor
        } else if percent <= thresholds.critical {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Improvement => Severity::MaterialPositive,
            Self::Minor => Severity::Info,
            Self::Moderate => Severity::Warning,
            Self::Severe => Severity::Critical,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumDelta {
    pub baseline: Decimal,
    pub renewal: Decimal,
    pub delta_amount: Decimal,
    /// Percent of baseline, two decimals. `None` when baseline is zero.
    pub delta_percent: Option<Decimal>,
    pub band: Option<PremiumBand>,
}

impl PremiumDelta {
    pub fn from_totals(
        baseline: Option<Decimal>,
        renewal: Option<Decimal>,
        thresholds: &PremiumBandThresholds,
    ) -> Self {
        let baseline = baseline.unwrap_or(Decimal::ZERO);
        let renewal = renewal.unwrap_or(Decimal::ZERO);
        let delta_amount = renewal - baseline;

        let exact_percent = if baseline.is_zero() {
            None
        } else {
            (delta_amount * Decimal::ONE_HUNDRED).checked_div(baseline)
        };
        // Band on the exact ratio; only the reported figure is rounded.
        let band = exact_percent.map(|percent| PremiumBand::classify(percent, thresholds));
        let delta_percent = exact_percent
            .map(|percent| percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));

        Self { baseline, renewal, delta_amount, delta_percent, band }
    }

    /// Severity of the move; `None` when nothing changed.
    pub fn severity(&self) -> Option<Severity> {
        if self.delta_amount.is_zero() {
            return None;
        }
        Some(self.band.map(|band| band.severity()).unwrap_or(Severity::Info))
    }
}

/// Sum of `premium`, treating missing premiums as zero.
pub fn sum_premiums<'a, I>(coverages: I) -> Decimal
where
    I: IntoIterator<Item = &'a Coverage>,
{
    coverages.into_iter().filter_map(|coverage| coverage.premium).sum()
}

pub fn coverage_premium_delta<'a, B, R>(
    baseline: B,
    renewal: R,
    thresholds: &PremiumBandThresholds,
) -> PremiumDelta
where
    B: IntoIterator<Item = &'a Coverage>,
    R: IntoIterator<Item = &'a Coverage>,
{
    PremiumDelta::from_totals(Some(sum_premiums(baseline)), Some(sum_premiums(renewal)), thresholds)
}
