use crate::domain::snapshot::Claim;
use crate::matching::MatchOutcome;

/// Claim number equality when both carry one, else exact (date, type).
/// Each baseline claim pairs with at most one renewal claim, first fit.
pub fn match_claims<'a>(baseline: &'a [Claim], renewal: &'a [Claim]) -> MatchOutcome<&'a Claim> {
    let mut baseline_taken = vec![false; baseline.len()];
    let mut pairs: Vec<(usize, &Claim)> = Vec::new();
    let mut added = Vec::new();

    for candidate in renewal {
        let found = baseline
            .iter()
            .enumerate()
            .position(|(index, claim)| !baseline_taken[index] && same_claim(claim, candidate));
        match found {
            Some(index) => {
                baseline_taken[index] = true;
                pairs.push((index, candidate));
            }
            None => added.push(candidate),
        }
    }

    pairs.sort_by_key(|(index, _)| *index);

    MatchOutcome {
        matched: pairs.into_iter().map(|(index, claim)| (&baseline[index], claim)).collect(),
        removed: baseline
            .iter()
            .enumerate()
            .filter(|(index, _)| !baseline_taken[*index])
            .map(|(_, claim)| claim)
            .collect(),
        added,
    }
}

fn same_claim(baseline: &Claim, renewal: &Claim) -> bool {
    if let (Some(left), Some(right)) = (baseline.number_key(), renewal.number_key()) {
        return left == right;
    }

    match (baseline.claim_date, renewal.claim_date, baseline.type_key(), renewal.type_key()) {
        (Some(left_date), Some(right_date), Some(left_type), Some(right_type)) => {
            left_date == right_date && left_type == right_type
        }
        _ => false,
    }
}
