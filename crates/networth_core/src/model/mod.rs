mod accounts;
mod market;
mod policies;
mod property;
mod results;
mod tax_config;

pub use accounts::{AccountState, Bucket, ShortfallEvent};
pub use market::{HistoricalReturns, InflationProfile, ReturnProfile, periodic_rate};
pub use policies::{
    CashFlowStream, ContributionPolicy, PeriodFrequency, WithdrawalOrder, WithdrawalPolicy,
    WithdrawalStrategy,
};
pub use property::{Loan, LoanService, Property, PropertyState, appreciate, service_loan};
pub use results::{
    AccumulatorKind, DistributionSummary, Goal, MonteCarloConfig, MonteCarloProgress,
    MonteCarloResult, OutcomeStatistics, PercentileBand, Trajectory,
};
pub use tax_config::{TaxBracket, TaxPolicy};
