//! Deterministic change sentences. Same input, same bytes.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::change::ChangeCategory;

/// Rendered for absent values.
pub const ABSENT: &str = "none";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increased,
    Decreased,
    Changed,
}

impl Direction {
    pub fn of(old: Option<Decimal>, new: Option<Decimal>) -> Self {
        match (old, new) {
            (Some(old), Some(new)) if new > old => Self::Increased,
            (Some(old), Some(new)) if new < old => Self::Decreased,
            _ => Self::Changed,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
            Self::Changed => "changed",
        }
    }
}

/// `Bodily Injury limit decreased from $100,000 to $50,000`
pub fn field_change(subject: &str, direction: Direction, old: Option<&str>, new: Option<&str>) -> String {
    format!(
        "{subject} {} from {} to {}",
        direction.verb(),
        old.unwrap_or(ABSENT),
        new.unwrap_or(ABSENT)
    )
}

/// Sentence for an entity that appeared or disappeared between terms.
pub fn presence_change(category: ChangeCategory, label: &str, detail: Option<&str>) -> String {
    let sentence = match category {
        ChangeCategory::CoverageAdded => format!("{label} coverage added"),
        ChangeCategory::CoverageRemoved => format!("{label} coverage removed"),
        ChangeCategory::VehicleAdded => format!("Vehicle added: {label}"),
        ChangeCategory::VehicleRemoved => format!("Vehicle removed: {label}"),
        ChangeCategory::DriverAdded => format!("Driver added: {label}"),
        ChangeCategory::DriverRemoved => format!("Driver removed: {label}"),
        ChangeCategory::DiscountAdded => format!("Discount added: {label}"),
        ChangeCategory::DiscountRemoved => format!("Discount removed: {label}"),
        ChangeCategory::EndorsementAdded => format!("Endorsement added: {label}"),
        ChangeCategory::EndorsementRemoved => format!("Endorsement removed: {label}"),
        ChangeCategory::MortgageeAdded => format!("Mortgagee added: {label}"),
        ChangeCategory::MortgageeRemoved => format!("Mortgagee removed: {label}"),
        ChangeCategory::Claim => format!("Claim on record: {label}"),
        other => format!("{label} ({})", other.as_str()),
    };

    match detail {
        Some(detail) => format!("{sentence} ({detail})"),
        None => sentence,
    }
}

/// `Policy premium increased from $1,200 to $1,260 (+$60, +5.0%)`
pub fn premium_change(
    subject: &str,
    baseline: Decimal,
    renewal: Decimal,
    delta_percent: Option<Decimal>,
) -> String {
    let delta = renewal - baseline;
    let direction = Direction::of(Some(baseline), Some(renewal));
    let base = field_change(
        subject,
        direction,
        Some(&money(baseline)),
        Some(&money(renewal)),
    );
    match delta_percent {
        Some(percent) => format!("{base} ({}, {})", signed_money(delta), signed_percent(percent)),
        None => format!("{base} ({})", signed_money(delta)),
    }
}

/// `$1,260` for whole amounts, `$1,260.50` otherwise.
pub fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * Decimal::ONE_HUNDRED).trunc();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if cents.is_zero() {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{:0>2}", cents.to_string())
    }
}

pub fn signed_money(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        money(amount)
    } else {
        format!("+{}", money(amount))
    }
}

/// One decimal place with explicit sign: `+5.0%`, `-2.5%`.
pub fn signed_percent(percent: Decimal) -> String {
    let rounded = percent.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "+" };
    let abs = rounded.abs();
    let whole = abs.trunc();
    let tenth = ((abs - whole) * Decimal::TEN).trunc();
    format!("{sign}{whole}.{tenth}%")
}

pub fn percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}
