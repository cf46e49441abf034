//! Claim and violation surcharge aging.
//!
//! Everything here is a pure function of (claim date, now, window years).

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::snapshot::Claim;

/// Average Gregorian month length used for month counts.
pub const DAYS_PER_MONTH: f64 = 30.44;

const SECONDS_PER_DAY: f64 = 86_400.0;

const VIOLATION_KEYWORDS: [&str; 4] = ["violation", "ticket", "speeding", "dui"];
const HOME_KEYWORDS: [&str; 9] =
    ["home", "property", "dwelling", "water", "wind", "fire", "hail", "liability", "theft"];

/// Lifecycle of a claim's rating impact. Variants are declared in the only
/// order they can occur for a fixed claim as time advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingStatus {
    Active,
    Approaching,
    NearFalloff,
    Expired,
}

impl AgingStatus {
    pub fn affects_rate(&self) -> bool {
        !matches!(self, Self::Expired)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimGroup {
    HomeClaims,
    AutoViolations,
    AutoClaims,
}

impl ClaimGroup {
    /// Keyword classification of a claim's free-text type and hint.
    pub fn classify(claim: &Claim) -> Self {
        let text = [claim.claim_type.as_deref(), claim.category_hint.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if VIOLATION_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            Self::AutoViolations
        } else if HOME_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            Self::HomeClaims
        } else {
            Self::AutoClaims
        }
    }
}

/// Timing of one claim against its surcharge window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgingWindow {
    pub fall_off_date: NaiveDate,
    pub months_remaining: u32,
    pub progress_percent: f64,
    pub status: AgingStatus,
}

impl AgingWindow {
    pub fn compute(claim_date: NaiveDate, now: DateTime<Utc>, window_years: u32) -> Self {
        let fall_off_date = fall_off_date(claim_date, window_years);
        let start = start_of_day(claim_date);
        let end = start_of_day(fall_off_date);

        let remaining_secs = (end - now).num_seconds();
        let months_remaining = if remaining_secs <= 0 {
            0
        } else {
            let days = remaining_secs as f64 / SECONDS_PER_DAY;
            (days / DAYS_PER_MONTH).ceil() as u32
        };

        let total_secs = (end - start).num_seconds();
        let elapsed_secs = (now - start).num_seconds();
        let progress_percent = if total_secs <= 0 {
            100.0
        } else {
            let raw = elapsed_secs as f64 / total_secs as f64 * 100.0;
            (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
        };

        let status = if now >= end {
            AgingStatus::Expired
        } else if months_remaining <= 12 {
            AgingStatus::NearFalloff
        } else if months_remaining <= 24 {
            AgingStatus::Approaching
        } else {
            AgingStatus::Active
        };

        Self { fall_off_date, months_remaining, progress_percent, status }
    }
}

/// Claim date plus the window, clamped to month end (Feb 29 + 1y = Feb 28).
pub fn fall_off_date(claim_date: NaiveDate, window_years: u32) -> NaiveDate {
    claim_date
        .checked_add_months(Months::new(window_years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MAX)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClaimAging {
    pub label: String,
    pub claim_number: Option<String>,
    pub claim_type: Option<String>,
    pub claim_date: NaiveDate,
    pub group: ClaimGroup,
    #[serde(flatten)]
    pub window: AgingWindow,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimGroupSummary {
    pub group: ClaimGroup,
    pub claim_count: usize,
    pub rate_driver_count: usize,
    pub near_falloff_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimsAgingReport {
    /// Ranked: by group, then rate-affecting claims by soonest fall-off, then
    /// expired claims.
    pub claims: Vec<ClaimAging>,
    pub groups: Vec<ClaimGroupSummary>,
    pub rate_driver_count: usize,
    pub near_falloff_count: usize,
    /// Claims without a date cannot be aged and are only counted.
    pub undated_count: usize,
}

pub fn assess_claim(claim: &Claim, now: DateTime<Utc>, window_years: u32) -> Option<ClaimAging> {
    let claim_date = claim.claim_date?;
    Some(ClaimAging {
        label: claim.label(),
        claim_number: claim.claim_number.clone(),
        claim_type: claim.claim_type.clone(),
        claim_date,
        group: ClaimGroup::classify(claim),
        window: AgingWindow::compute(claim_date, now, window_years),
    })
}

pub fn assess_claims<'a, I>(claims: I, now: DateTime<Utc>, window_years: u32) -> ClaimsAgingReport
where
    I: IntoIterator<Item = &'a Claim>,
{
    let mut report = ClaimsAgingReport::default();

    for claim in claims {
        match assess_claim(claim, now, window_years) {
            Some(aging) => report.claims.push(aging),
            None => report.undated_count += 1,
        }
    }

    report.claims.sort_by(|left, right| {
        left.group
            .cmp(&right.group)
            .then_with(|| right.window.status.affects_rate().cmp(&left.window.status.affects_rate()))
            .then_with(|| left.window.fall_off_date.cmp(&right.window.fall_off_date))
    });

    for group in [ClaimGroup::HomeClaims, ClaimGroup::AutoViolations, ClaimGroup::AutoClaims] {
        let members: Vec<&ClaimAging> =
            report.claims.iter().filter(|claim| claim.group == group).collect();
        report.groups.push(ClaimGroupSummary {
            group,
            claim_count: members.len(),
            rate_driver_count: members.iter().filter(|c| c.window.status.affects_rate()).count(),
            near_falloff_count: members
                .iter()
                .filter(|c| c.window.status == AgingStatus::NearFalloff)
                .count(),
        });
    }

    report.rate_driver_count = report.groups.iter().map(|group| group.rate_driver_count).sum();
    report.near_falloff_count = report.groups.iter().map(|group| group.near_falloff_count).sum();
    report
}
