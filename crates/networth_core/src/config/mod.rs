//! Simulation parameters
//!
//! `SimulationParameters` holds everything a run needs: the asset buckets,
//! cash flow schedules, contribution and withdrawal policies, properties and
//! the inflation / tax assumptions. It is immutable during a run and is
//! validated once before any path is simulated.
//!
//! # Builder DSL
//!
//! ```ignore
//! use networth_core::config::ParametersBuilder;
//! use networth_core::model::ReturnProfile;
//!
//! let params = ParametersBuilder::new()
//!     .monthly()
//!     .years(30)
//!     .bucket("Stocks", 50_000.0, 0.8, ReturnProfile::EQUITY_NORMAL)
//!     .bucket("Bonds", 20_000.0, 0.2, ReturnProfile::BOND_NORMAL)
//!     .income("Salary", 4_000.0)
//!     .expense("Rent", 1_500.0)
//!     .build()?;
//! ```

pub mod builder;

pub use builder::ParametersBuilder;

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidParameterError, Result};
use crate::model::{
    AccountState, Bucket, CashFlowStream, ContributionPolicy, InflationProfile, PeriodFrequency,
    Property, TaxPolicy, WithdrawalOrder, WithdrawalPolicy, WithdrawalStrategy,
};

/// Allowed deviation of the bucket weight sum from one
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

fn default_horizon() -> usize {
    30
}

/// Complete input of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Number of periods simulated
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default)]
    pub frequency: PeriodFrequency,
    /// Calendar date of period 0, used only to label periods
    #[serde(default)]
    pub start_date: Option<Date>,

    // === Holdings ===
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub properties: Vec<Property>,

    // === Plan ===
    #[serde(default)]
    pub income: Vec<CashFlowStream>,
    #[serde(default)]
    pub expenses: Vec<CashFlowStream>,
    #[serde(default)]
    pub contribution: ContributionPolicy,
    #[serde(default)]
    pub withdrawal: WithdrawalPolicy,
    /// Restore target weights after growth each period
    #[serde(default)]
    pub rebalance: bool,

    // === World assumptions ===
    #[serde(default)]
    pub inflation: InflationProfile,
    #[serde(default)]
    pub tax: TaxPolicy,

    /// Seed used when the caller does not supply one
    #[serde(default)]
    pub seed: u64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            frequency: PeriodFrequency::default(),
            start_date: None,
            buckets: Vec::new(),
            properties: Vec::new(),
            income: Vec::new(),
            expenses: Vec::new(),
            contribution: ContributionPolicy::default(),
            withdrawal: WithdrawalPolicy::default(),
            rebalance: false,
            inflation: InflationProfile::default(),
            tax: TaxPolicy::default(),
            seed: 0,
        }
    }
}

impl SimulationParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn periods_per_year(&self) -> f64 {
        self.frequency.periods_per_year()
    }

    /// Calendar date at the end of period `k`, if a start date is set
    #[must_use]
    pub fn period_date(&self, k: usize) -> Option<Date> {
        self.start_date
            .map(|start| start.saturating_add(self.frequency.span(k as i64)))
    }

    /// State at period 0
    #[must_use]
    pub fn initial_state(&self) -> AccountState {
        AccountState {
            period: 0,
            balances: self.buckets.iter().map(|b| b.initial_balance).collect(),
            properties: self.properties.iter().map(Property::initial_state).collect(),
            price_index: 1.0,
            cumulative_contributions: 0.0,
            cumulative_withdrawals: 0.0,
            cumulative_taxes: 0.0,
            net_cash_flow: 0.0,
            shortfall: None,
        }
    }

    /// Bucket name to index
    #[must_use]
    pub fn bucket_indices(&self) -> FxHashMap<&str, usize> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), i))
            .collect()
    }

    /// Bucket indices in the order they are drawn down.
    ///
    /// For pro-rata withdrawals this is the declared order, which decides
    /// where a deficit is carried as debt. Unknown names are skipped here and
    /// rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn withdrawal_priority(&self) -> Vec<usize> {
        match &self.withdrawal.order {
            WithdrawalOrder::Declared | WithdrawalOrder::ProRata => {
                (0..self.buckets.len()).collect()
            }
            WithdrawalOrder::Custom(names) => {
                let indices = self.bucket_indices();
                let mut order: Vec<usize> = Vec::with_capacity(self.buckets.len());
                let listed = names.iter().filter_map(|n| indices.get(n.as_str()).copied());
                for idx in listed.chain(0..self.buckets.len()) {
                    if !order.contains(&idx) {
                        order.push(idx);
                    }
                }
                order
            }
        }
    }

    // === Variant helpers ===

    /// Copy with a different horizon
    #[must_use]
    pub fn with_horizon(&self, horizon: usize) -> Self {
        let mut params = self.clone();
        params.horizon = horizon;
        params
    }

    /// Copy with a different fixed contribution per period
    #[must_use]
    pub fn with_contribution_amount(&self, amount: f64) -> Self {
        let mut params = self.clone();
        params.contribution.amount = amount;
        params
    }

    /// Copy with a different withdrawal strategy
    #[must_use]
    pub fn with_withdrawal_strategy(&self, strategy: WithdrawalStrategy) -> Self {
        let mut params = self.clone();
        params.withdrawal.strategy = strategy;
        params
    }

    // === Validation ===

    /// Reject malformed input before anything is simulated
    pub fn validate(&self) -> Result<()> {
        self.validate_buckets()?;

        for stream in self.income.iter().chain(&self.expenses) {
            check_amount(&stream.name, stream.amount)?;
            check_window(&stream.name, stream.start_period, stream.end_period)?;
        }

        let contribution = &self.contribution;
        check_amount("contribution", contribution.amount)?;
        check_probability("surplus_fraction", contribution.surplus_fraction)?;
        check_window(
            "contribution",
            contribution.start_period,
            contribution.end_period,
        )?;

        self.validate_withdrawal()?;

        for property in &self.properties {
            validate_property(property)?;
        }

        self.inflation.validate()?;
        self.validate_tax()
    }

    fn validate_buckets(&self) -> Result<()> {
        if self.buckets.is_empty() {
            return Err(InvalidParameterError::NoBuckets);
        }

        let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
        let mut weight_sum = 0.0;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            if seen.insert(bucket.name.as_str(), idx).is_some() {
                return Err(InvalidParameterError::DuplicateBucket(bucket.name.clone()));
            }
            if !bucket.weight.is_finite() || bucket.weight < 0.0 {
                return Err(InvalidParameterError::InvalidWeight {
                    bucket: bucket.name.clone(),
                    weight: bucket.weight,
                });
            }
            check_amount(&bucket.name, bucket.initial_balance)?;
            bucket.returns.validate()?;
            weight_sum += bucket.weight;
        }

        if (weight_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(InvalidParameterError::WeightsDoNotSumToOne { sum: weight_sum });
        }
        Ok(())
    }

    fn validate_withdrawal(&self) -> Result<()> {
        match self.withdrawal.strategy {
            WithdrawalStrategy::None => {}
            WithdrawalStrategy::Fixed { amount, .. } => check_amount("withdrawal", amount)?,
            WithdrawalStrategy::PercentOfBalance { rate } => {
                check_probability("withdrawal rate", rate)?;
            }
        }

        if let WithdrawalOrder::Custom(names) = &self.withdrawal.order {
            let indices = self.bucket_indices();
            if let Some(unknown) = names.iter().find(|n| !indices.contains_key(n.as_str())) {
                return Err(InvalidParameterError::UnknownBucket(unknown.clone()));
            }
        }
        Ok(())
    }

    fn validate_tax(&self) -> Result<()> {
        match &self.tax {
            TaxPolicy::None => Ok(()),
            TaxPolicy::Flat { rate } => check_probability("tax rate", *rate),
            TaxPolicy::Progressive { brackets } => {
                for bracket in brackets {
                    check_probability("tax bracket rate", bracket.rate)?;
                    check_finite("tax bracket threshold", bracket.threshold)?;
                }
                if brackets.windows(2).any(|w| w[0].threshold > w[1].threshold) {
                    return Err(InvalidParameterError::UnsortedTaxBrackets);
                }
                Ok(())
            }
        }
    }
}

fn validate_property(property: &Property) -> Result<()> {
    check_amount(&property.name, property.value)?;
    check_amount(&format!("{} purchase costs", property.name), property.purchase_costs)?;
    check_amount(&format!("{} selling costs", property.name), property.selling_costs)?;
    check_amount(&format!("{} carrying costs", property.name), property.carrying_costs)?;
    check_finite(&format!("{} appreciation", property.name), property.appreciation)?;

    if let Some(sale) = property.sale_period {
        let purchase = property.purchase_period.unwrap_or(0);
        if property.purchase_period.is_some() && sale <= purchase {
            return Err(InvalidParameterError::InvalidPropertyDates {
                name: property.name.clone(),
                purchase,
                sale,
            });
        }
    }

    if let Some(loan) = &property.loan {
        check_amount(&format!("{} loan principal", property.name), loan.principal)?;
        check_finite(&format!("{} loan rate", property.name), loan.annual_rate)?;
        if loan.term_periods == 0 {
            return Err(InvalidParameterError::InvalidLoan {
                property: property.name.clone(),
                reason: "term must be at least one period",
            });
        }
        if loan.annual_rate < 0.0 {
            return Err(InvalidParameterError::InvalidLoan {
                property: property.name.clone(),
                reason: "interest rate must be non-negative",
            });
        }
        if loan.principal > property.value + property.purchase_costs {
            return Err(InvalidParameterError::InvalidLoan {
                property: property.name.clone(),
                reason: "principal exceeds the purchase price",
            });
        }
    }
    Ok(())
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidParameterError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(InvalidParameterError::NegativeAmount {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_probability(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InvalidParameterError::InvalidProbability { field, value })
    }
}

fn check_window(name: &str, start: usize, end: Option<usize>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(InvalidParameterError::InvalidWindow {
            name: name.to_string(),
            start,
            end,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Loan, ReturnProfile};

    fn two_buckets() -> SimulationParameters {
        SimulationParameters {
            horizon: 10,
            buckets: vec![
                Bucket::new("Stocks", 1_000.0, 0.6).with_returns(ReturnProfile::EQUITY_NORMAL),
                Bucket::new("Bonds", 1_000.0, 0.4),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_parameters() {
        assert_eq!(two_buckets().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_missing_buckets() {
        let params = SimulationParameters::default();
        assert_eq!(params.validate(), Err(InvalidParameterError::NoBuckets));
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut params = two_buckets();
        params.buckets[1].weight = 0.5;
        assert!(matches!(
            params.validate(),
            Err(InvalidParameterError::WeightsDoNotSumToOne { .. })
        ));

        params.buckets[1].weight = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(InvalidParameterError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_and_unknown_buckets() {
        let mut params = two_buckets();
        params.buckets[1].name = "Stocks".into();
        assert_eq!(
            params.validate(),
            Err(InvalidParameterError::DuplicateBucket("Stocks".into()))
        );

        let mut params = two_buckets();
        params.withdrawal.order = WithdrawalOrder::Custom(vec!["Cash".into()]);
        assert_eq!(
            params.validate(),
            Err(InvalidParameterError::UnknownBucket("Cash".into()))
        );
    }

    #[test]
    fn test_rejects_negative_volatility() {
        let mut params = two_buckets();
        params.buckets[0].returns = ReturnProfile::Normal {
            mean: 0.05,
            std_dev: -0.1,
        };
        assert!(matches!(
            params.validate(),
            Err(InvalidParameterError::NegativeVolatility { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut params = two_buckets();
        params.income.push(CashFlowStream {
            start_period: 5,
            end_period: Some(2),
            ..CashFlowStream::new("Salary", 100.0)
        });
        assert!(matches!(
            params.validate(),
            Err(InvalidParameterError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_property() {
        let mut params = two_buckets();
        params.properties.push(Property {
            purchase_period: Some(4),
            sale_period: Some(4),
            ..Property::new("Flat", 100_000.0)
        });
        assert!(matches!(
            params.validate(),
            Err(InvalidParameterError::InvalidPropertyDates { .. })
        ));

        params.properties[0].sale_period = None;
        params.properties[0].loan = Some(Loan {
            principal: 150_000.0,
            annual_rate: 0.03,
            term_periods: 20,
        });
        assert!(matches!(
            params.validate(),
            Err(InvalidParameterError::InvalidLoan { .. })
        ));
    }

    #[test]
    fn test_custom_priority_appends_unlisted_buckets() {
        let mut params = two_buckets();
        params.buckets.push(Bucket::new("Cash", 0.0, 0.0));
        params.withdrawal.order = WithdrawalOrder::Custom(vec!["Cash".into(), "Stocks".into()]);
        assert_eq!(params.withdrawal_priority(), vec![2, 0, 1]);
    }

    #[test]
    fn test_period_dates() {
        let params = SimulationParameters {
            start_date: Some(jiff::civil::date(2025, 1, 31)),
            frequency: PeriodFrequency::Monthly,
            ..two_buckets()
        };
        assert_eq!(params.period_date(1), Some(jiff::civil::date(2025, 2, 28)));
        assert_eq!(params.period_date(12), Some(jiff::civil::date(2026, 1, 31)));
        assert_eq!(two_buckets().period_date(3), None);
    }

    #[test]
    fn test_initial_state() {
        let state = two_buckets().initial_state();
        assert_eq!(state.period, 0);
        assert_eq!(state.balances, vec![1_000.0, 1_000.0]);
        assert_eq!(state.price_index, 1.0);
        assert!(state.shortfall.is_none());
    }
}
