//! Parameters Builder
//!
//! Fluent construction of [`SimulationParameters`]. `build` validates the
//! result, so a built value is always ready to simulate.

use super::SimulationParameters;
use crate::error::Result;
use crate::model::{
    Bucket, CashFlowStream, InflationProfile, PeriodFrequency, Property, ReturnProfile, TaxPolicy,
    WithdrawalOrder, WithdrawalStrategy,
};

/// Builder for [`SimulationParameters`]
#[derive(Debug, Clone, Default)]
pub struct ParametersBuilder {
    params: SimulationParameters,
    /// Horizon in years, resolved against the frequency at build time
    years: Option<usize>,
}

impl ParametersBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Timeline
    // =========================================================================

    /// Set the horizon in periods
    #[must_use]
    pub fn horizon(mut self, periods: usize) -> Self {
        self.params.horizon = periods;
        self.years = None;
        self
    }

    /// Set the horizon in years (converted to periods on build)
    #[must_use]
    pub fn years(mut self, years: usize) -> Self {
        self.years = Some(years);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: PeriodFrequency) -> Self {
        self.params.frequency = frequency;
        self
    }

    #[must_use]
    pub fn monthly(self) -> Self {
        self.frequency(PeriodFrequency::Monthly)
    }

    #[must_use]
    pub fn yearly(self) -> Self {
        self.frequency(PeriodFrequency::Yearly)
    }

    /// Set the calendar date of period 0
    #[must_use]
    pub fn start(mut self, year: i16, month: i8, day: i8) -> Self {
        self.params.start_date = Some(jiff::civil::date(year, month, day));
        self
    }

    // =========================================================================
    // Holdings
    // =========================================================================

    /// Add an asset bucket
    #[must_use]
    pub fn bucket(
        mut self,
        name: impl Into<String>,
        initial_balance: f64,
        weight: f64,
        returns: ReturnProfile,
    ) -> Self {
        self.params
            .buckets
            .push(Bucket::new(name, initial_balance, weight).with_returns(returns));
        self
    }

    #[must_use]
    pub fn add_bucket(mut self, bucket: Bucket) -> Self {
        self.params.buckets.push(bucket);
        self
    }

    #[must_use]
    pub fn property(mut self, property: Property) -> Self {
        self.params.properties.push(property);
        self
    }

    // =========================================================================
    // Cash flows
    // =========================================================================

    /// Add an open-ended income stream of `amount` per period
    #[must_use]
    pub fn income(self, name: impl Into<String>, amount: f64) -> Self {
        self.income_stream(CashFlowStream::new(name, amount))
    }

    #[must_use]
    pub fn income_stream(mut self, stream: CashFlowStream) -> Self {
        self.params.income.push(stream);
        self
    }

    /// Add an open-ended expense of `amount` per period
    #[must_use]
    pub fn expense(self, name: impl Into<String>, amount: f64) -> Self {
        self.expense_stream(CashFlowStream::new(name, amount))
    }

    #[must_use]
    pub fn expense_stream(mut self, stream: CashFlowStream) -> Self {
        self.params.expenses.push(stream);
        self
    }

    // =========================================================================
    // Policies
    // =========================================================================

    /// Fixed deposit per period
    #[must_use]
    pub fn contribution(mut self, amount: f64) -> Self {
        self.params.contribution.amount = amount;
        self
    }

    /// Share of surplus cash flow that is invested
    #[must_use]
    pub fn surplus_fraction(mut self, fraction: f64) -> Self {
        self.params.contribution.surplus_fraction = fraction;
        self
    }

    #[must_use]
    pub fn withdraw_fixed(mut self, amount: f64, inflation_indexed: bool) -> Self {
        self.params.withdrawal.strategy = WithdrawalStrategy::Fixed {
            amount,
            inflation_indexed,
        };
        self
    }

    #[must_use]
    pub fn withdraw_percent(mut self, rate: f64) -> Self {
        self.params.withdrawal.strategy = WithdrawalStrategy::PercentOfBalance { rate };
        self
    }

    /// First period in which the withdrawal strategy applies
    #[must_use]
    pub fn withdraw_from(mut self, period: usize) -> Self {
        self.params.withdrawal.start_period = period;
        self
    }

    #[must_use]
    pub fn withdrawal_order(mut self, order: WithdrawalOrder) -> Self {
        self.params.withdrawal.order = order;
        self
    }

    #[must_use]
    pub fn allow_debt(mut self, allow: bool) -> Self {
        self.params.withdrawal.allow_debt = allow;
        self
    }

    #[must_use]
    pub fn rebalance(mut self, rebalance: bool) -> Self {
        self.params.rebalance = rebalance;
        self
    }

    // =========================================================================
    // World assumptions
    // =========================================================================

    #[must_use]
    pub fn inflation(mut self, inflation: InflationProfile) -> Self {
        self.params.inflation = inflation;
        self
    }

    #[must_use]
    pub fn tax(mut self, tax: TaxPolicy) -> Self {
        self.params.tax = tax;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Resolve the horizon and validate the parameters
    pub fn build(self) -> Result<SimulationParameters> {
        let mut params = self.params;
        if let Some(years) = self.years {
            params.horizon = years * params.frequency.periods_per_year() as usize;
        }
        params.validate()?;
        Ok(params)
    }
}
