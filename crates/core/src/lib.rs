pub mod aging;
pub mod catalog;
pub mod clock;
pub mod comparison;
pub mod config;
pub mod coverage;
pub mod diff;
pub mod domain;
pub mod errors;
pub mod matching;
pub mod premium;
pub mod review;

pub use aging::{AgingStatus, AgingWindow, ClaimAging, ClaimGroup, ClaimsAgingReport};
pub use catalog::CoverageCatalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use comparison::{
    ComparisonReport, CoverageRow, DriverComparison, EntityStatus, RenewalComparisonEngine,
    VehicleComparison,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions};
pub use diff::ChangeClassifier;
pub use domain::change::{ChangeCategory, MaterialChange, Severity};
pub use domain::check::{CheckResult, CheckSummary};
pub use domain::snapshot::{
    Adjustment, Claim, Coverage, Driver, Mortgagee, PolicySnapshot, PropertyContext, Vehicle,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use matching::{MatchOutcome, VehicleIdentity};
pub use premium::{PremiumBand, PremiumDelta};
pub use review::{
    can_approve, compute_progress, derive_check_results, toggle_review, ReviewProgress,
    ToggleOutcome, ToggleRequest,
};
