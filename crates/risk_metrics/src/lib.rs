//! # Risk Metrics (application layer)
//!
//! The forward-looking side of the engine: scenario construction,
//! portfolio exposure aggregation and distributional risk metrics.
//!
//! - `scenarios/` — Monte Carlo, historical and stress scenario sets
//! - `portfolio` — positions, netting sets and netting rules
//! - `market` / `reval` — the `MarketSnapshot` and `RevaluationBridge`
//!   seams to external market data and pricing
//! - `aggregate` — scenario-by-scenario revaluation into exposure
//!   distributions per netting set and time index
//! - `var` / `pfe` — Value-at-Risk (historical, parametric, Monte Carlo)
//!   and Potential Future Exposure profiles
//! - `engine` — high-level Monte Carlo drivers wiring simulation,
//!   scenarios, aggregation and metrics together
//!
//! All metric failures are typed ([`MetricError`], [`ScenarioError`]) and
//! abort the run: no partial results, no NaNs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod market;
pub mod pfe;
pub mod portfolio;
pub mod result;
pub mod reval;
pub mod scenarios;
pub mod var;

pub use aggregate::{aggregate, aggregate_with, ExposureDistribution, ExposureReport, ExposureSample};
pub use engine::{
    monte_carlo_pfe_profile, monte_carlo_pfe_profile_with, monte_carlo_var, monte_carlo_var_with,
    RiskRunConfig, MAX_PATHS,
};
pub use error::{MetricError, ScenarioError};
pub use market::{InMemorySnapshot, MarketSnapshot};
pub use pfe::{
    analytic_pfe_profile, expected_exposure_profile, netting_set_pfe_profile, pfe_profile,
    scenario_pfe, ProfileDirection, RollupPolicy,
};
pub use portfolio::{NettingRule, Portfolio, PortfolioBuilder, PortfolioError, Position};
pub use result::{PfeMethod, PfePoint, PfeProfileResult, VarMethod, VarResult};
pub use var::{
    historical_var, monte_carlo_var_from_distribution, parametric_var, parametric_var_from_moments,
};
pub use reval::{RevaluationBridge, RevaluationError};
pub use scenarios::{
    historical_scenarios, stress_scenarios, HistoricalOptions, ReturnKind, Scenario,
    ScenarioMethod, ScenarioSet, Shock, ShockKind, ShockSet,
};
