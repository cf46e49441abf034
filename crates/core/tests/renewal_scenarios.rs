use chrono::{TimeZone, Utc};
use renewal_core::{
    toggle_review, AgingStatus, ChangeCategory, ComparisonReport, EngineConfig, EntityStatus,
    FixedClock, PolicySnapshot, PremiumBand, RenewalComparisonEngine, Severity, ToggleOutcome,
    ToggleRequest,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn engine() -> RenewalComparisonEngine<FixedClock> {
    RenewalComparisonEngine::new(EngineConfig::default())
        .expect("default config should validate")
        .with_clock(FixedClock(
            Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).single().expect("valid now"),
        ))
}

fn snapshot(value: Value) -> PolicySnapshot {
    serde_json::from_value(value).expect("fixture should decode into a snapshot")
}

fn compare(baseline: Value, renewal: Value) -> ComparisonReport {
    engine().compare(&snapshot(baseline), &snapshot(renewal), None)
}

#[test]
fn bodily_injury_limit_cut_is_material_negative() {
    let report = compare(
        json!({ "coverages": [{ "type": "bodily_injury", "limit_amount": "100000", "premium": "300" }] }),
        json!({ "coverages": [{ "type": "bodily_injury", "limit_amount": "50000", "premium": "300" }] }),
    );

    assert_eq!(report.material_change_count, 1);
    let change = &report.material_changes[0];
    assert_eq!(change.category, ChangeCategory::CoverageLimit);
    assert_eq!(change.severity, Severity::MaterialNegative);
    assert_eq!(change.field_path, "policy.coverages.bodily_injury.limit");
    assert_eq!(change.old_value.as_deref(), Some("$100,000"));
    assert_eq!(change.new_value.as_deref(), Some("$50,000"));
}

#[test]
fn five_percent_premium_increase_is_a_warning() {
    let report = compare(json!({ "term_premium": "1200" }), json!({ "term_premium": "1260" }));

    let summary = &report.premium_summary;
    assert_eq!(summary.delta_amount, Decimal::new(60, 0));
    assert_eq!(summary.delta_percent, Some(Decimal::new(500, 2)));
    assert_eq!(summary.band, Some(PremiumBand::Moderate));

    let premium = report
        .material_changes
        .iter()
        .find(|change| change.category == ChangeCategory::Premium)
        .expect("premium change recorded");
    assert_eq!(premium.severity, Severity::Warning);
    assert_eq!(
        premium.description,
        "Policy premium increased from $1,200 to $1,260 (+$60, +5.0%)"
    );
}

#[test]
fn claim_exactly_one_window_old_is_expired() {
    let claims = json!([{ "claim_number": "C-1", "claim_date": "2023-10-17", "claim_type": "Collision" }]);
    let report = compare(json!({ "claims": claims }), json!({ "claims": claims }));

    assert_eq!(report.claims_aging.claims.len(), 1);
    let aging = &report.claims_aging.claims[0];
    assert_eq!(aging.window.status, AgingStatus::Expired);
    assert_eq!(aging.window.months_remaining, 0);
    assert_eq!(report.claims_aging.rate_driver_count, 0);
    assert_eq!(report.material_change_count, 0);
}

#[test]
fn removed_vehicle_skips_coverage_level_changes() {
    let report = compare(
        json!({
            "vehicles": [{
                "vin": "1FTFW1E50MFA00001",
                "year": 2021, "make": "Ford", "model": "F-150",
                "coverages": [
                    { "type": "collision", "deductible": "500", "premium": "410" },
                    { "type": "comprehensive", "deductible": "250", "premium": "120" }
                ]
            }]
        }),
        json!({ "vehicles": [] }),
    );

    let vehicle_changes: Vec<_> = report
        .material_changes
        .iter()
        .filter(|change| change.field_path.starts_with("vehicles["))
        .collect();
    assert_eq!(vehicle_changes.len(), 1);
    assert_eq!(vehicle_changes[0].category, ChangeCategory::VehicleRemoved);
    assert_eq!(vehicle_changes[0].severity, Severity::Removed);

    assert_eq!(report.vehicles.len(), 1);
    assert_eq!(report.vehicles[0].status, EntityStatus::Removed);
    assert_eq!(report.vehicles[0].material_change_count, 1);
    assert!(report
        .coverage_rows
        .iter()
        .filter(|row| row.scope == "vehicles[1FTFW1E50MFA00001]")
        .all(|row| row.severity == Severity::Removed && row.renewal.is_none()));
}

#[test]
fn vehicle_without_vin_matches_on_year_make_model() {
    let report = compare(
        json!({ "vehicles": [{ "vin": "1HGCV1F30LA000002", "year": 2020, "make": "Honda", "model": "Accord" }] }),
        json!({ "vehicles": [{ "year": 2020, "make": "honda", "model": "ACCORD" }] }),
    );

    assert_eq!(report.vehicles.len(), 1);
    assert_eq!(report.vehicles[0].status, EntityStatus::Matched);
    assert_eq!(report.material_change_count, 0);
}

#[test]
fn shared_vehicle_labels_get_vin_suffixes() {
    let pair = json!({
        "vehicles": [
            { "vin": "1FTFW1E50MFA00001", "year": 2021, "make": "Ford", "model": "F-150" },
            { "vin": "1FTFW1E50MFA00777", "year": 2021, "make": "Ford", "model": "F-150" }
        ]
    });
    let report = compare(pair.clone(), pair);

    let labels: Vec<&str> = report.vehicles.iter().map(|vehicle| vehicle.label.as_str()).collect();
    assert_eq!(labels, vec!["2021 Ford F-150 (…0001)", "2021 Ford F-150 (…0777)"]);
}

#[test]
fn middle_initial_does_not_split_a_driver() {
    let report = compare(
        json!({ "drivers": [{ "name": "John A Smith", "date_of_birth": "1990-03-02" }] }),
        json!({ "drivers": [{ "name": "John Smith", "date_of_birth": "1990-03-02" }] }),
    );

    assert_eq!(report.drivers.len(), 1);
    let driver = &report.drivers[0];
    assert_eq!(driver.status, EntityStatus::Matched);
    assert_eq!(driver.key, "john smith");
    assert_eq!(driver.renewal_age, Some(36));
    assert_eq!(report.material_change_count, 0);
}

#[test]
fn vehicle_line_overrides_policy_line_and_is_diffed_per_vehicle() {
    let report = compare(
        json!({
            "coverages": [{ "type": "collision", "deductible": "1000" }],
            "vehicles": [{
                "vin": "1FTFW1E50MFA00001", "year": 2021, "make": "Ford", "model": "F-150",
                "coverages": [{ "type": "collision", "deductible": "500" }]
            }]
        }),
        json!({
            "coverages": [{ "type": "collision", "deductible": "1000" }],
            "vehicles": [{
                "vin": "1FTFW1E50MFA00001", "year": 2021, "make": "Ford", "model": "F-150",
                "coverages": [{ "type": "collision", "deductible": "750" }]
            }]
        }),
    );

    assert_eq!(report.material_change_count, 1);
    let change = &report.material_changes[0];
    assert_eq!(change.field_path, "vehicles[1FTFW1E50MFA00001].coverages.collision.deductible");
    assert_eq!(change.category, ChangeCategory::Deductible);
    assert_eq!(change.severity, Severity::MaterialNegative);
}

#[test]
fn non_material_fields_are_recorded_but_not_counted() {
    let report = compare(
        json!({ "vehicles": [{ "vin": "1FTFW1E50MFA00001", "annual_mileage": 12000 }] }),
        json!({ "vehicles": [{ "vin": "1FTFW1E50MFA00001", "annual_mileage": 9000 }] }),
    );

    assert_eq!(report.material_changes.len(), 1);
    assert_eq!(report.material_changes[0].severity, Severity::Unchanged);
    assert_eq!(report.material_change_count, 0);
    assert_eq!(report.review_progress.total_reviewable, 0);
    assert!(report.can_approve);
}

#[test]
fn mortgagee_swap_is_reported_both_ways() {
    let report = compare(
        json!({ "property": { "mortgagees": [{ "name": "First Bank", "loan_number": "L-1" }] } }),
        json!({ "property": { "mortgagees": [{ "name": "Second Bank", "loan_number": "L-9" }] } }),
    );

    let categories: Vec<ChangeCategory> =
        report.material_changes.iter().map(|change| change.category).collect();
    assert_eq!(categories, vec![ChangeCategory::MortgageeAdded, ChangeCategory::MortgageeRemoved]);
}

#[test]
fn approval_unlocks_after_every_change_is_reviewed() {
    let baseline = snapshot(json!({
        "term_premium": "1000",
        "coverages": [{ "type": "bodily_injury", "limit_amount": "100000" }]
    }));
    let renewal = snapshot(json!({
        "term_premium": "1200",
        "coverages": [{ "type": "bodily_injury", "limit_amount": "50000" }]
    }));
    let engine = engine();

    let first = engine.compare(&baseline, &renewal, None);
    assert_eq!(first.check_results.len(), 2);
    assert!(first.check_summary.halted);
    assert!(!first.can_approve);

    let at = Utc.with_ymd_and_hms(2026, 10, 17, 16, 0, 0).single().expect("valid time");
    let mut results = first.check_results.clone();
    for target in first.check_results.iter() {
        let request = ToggleRequest {
            rule_id: target.rule_id.clone(),
            field: target.field.clone(),
            reviewed: true,
            reviewer_id: "agent-3".to_string(),
        };
        results = match toggle_review(&results, &request, at) {
            ToggleOutcome::Updated { results, .. } => results,
            ToggleOutcome::NotFound { .. } => panic!("derived result should be found"),
        };
    }

    let second = engine.compare(&baseline, &renewal, Some(results.as_slice()));
    assert_eq!(second.review_progress.progress_percent, Decimal::ONE_HUNDRED);
    assert!(!second.check_summary.halted);
    assert!(second.can_approve);
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn identical_keyless_claims_each_get_their_own_review_key() {
    let hail = json!({ "claim_date": "2025-05-01", "claim_type": "Hail" });
    let baseline = snapshot(json!({}));
    let renewal = snapshot(json!({ "claims": [hail.clone(), hail], "drivers": [{ "name": "" }, { "name": " " }] }));
    let engine = engine();

    let first = engine.compare(&baseline, &renewal, None);
    let fields: Vec<&str> = first.check_results.iter().map(|result| result.field.as_str()).collect();
    assert_eq!(fields, vec!["drivers[]", "drivers[]#2", "claims[2025-05-01|hail]", "claims[2025-05-01|hail]#2"]);

    let at = Utc.with_ymd_and_hms(2026, 10, 17, 16, 0, 0).single().expect("valid time");
    let mut results = first.check_results.clone();
    for target in first.check_results.iter() {
        let request = ToggleRequest {
            rule_id: target.rule_id.clone(),
            field: target.field.clone(),
            reviewed: true,
            reviewer_id: "agent-3".to_string(),
        };
        results = match toggle_review(&results, &request, at) {
            ToggleOutcome::Updated { results, .. } => results,
            ToggleOutcome::NotFound { .. } => panic!("derived result should be found"),
        };
    }

    let second = engine.compare(&baseline, &renewal, Some(results.as_slice()));
    assert_eq!(second.review_progress.reviewed_count, 4);
    assert!(second.can_approve);
}
