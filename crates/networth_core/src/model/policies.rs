//! Cash flow schedules and the contribution / withdrawal policies
//!
//! All amounts are per period. Schedules are active for
//! `start_period <= k < end_period` (open-ended when `end_period` is `None`).

use serde::{Deserialize, Serialize};

/// Length of one simulated period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodFrequency {
    Monthly,
    #[default]
    Yearly,
}

impl PeriodFrequency {
    #[must_use]
    pub fn periods_per_year(self) -> f64 {
        match self {
            PeriodFrequency::Monthly => 12.0,
            PeriodFrequency::Yearly => 1.0,
        }
    }

    /// Calendar span covered by `n` periods
    #[must_use]
    pub fn span(self, n: i64) -> jiff::Span {
        match self {
            PeriodFrequency::Monthly => jiff::Span::new().months(n),
            PeriodFrequency::Yearly => jiff::Span::new().years(n),
        }
    }
}

/// A named recurring income or expense.
///
/// Starting and ending a stream mid-horizon models "add income" / "remove
/// expense" life events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStream {
    pub name: String,
    /// Amount per period in period-0 currency
    pub amount: f64,
    #[serde(default)]
    pub start_period: usize,
    #[serde(default)]
    pub end_period: Option<usize>,
    /// Scale the amount by the cumulative price index
    #[serde(default)]
    pub inflation_indexed: bool,
    /// Subject to the income tax policy (ignored for expenses)
    #[serde(default = "default_true")]
    pub taxable: bool,
}

fn default_true() -> bool {
    true
}

fn default_surplus_fraction() -> f64 {
    1.0
}

impl CashFlowStream {
    #[must_use]
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            start_period: 0,
            end_period: None,
            inflation_indexed: false,
            taxable: true,
        }
    }

    #[must_use]
    pub fn is_active(&self, period: usize) -> bool {
        is_within(period, self.start_period, self.end_period)
    }

    /// Nominal amount due in `period` given the current price index
    #[must_use]
    pub fn amount_at(&self, period: usize, price_index: f64) -> f64 {
        if !self.is_active(period) {
            return 0.0;
        }
        if self.inflation_indexed {
            self.amount * price_index
        } else {
            self.amount
        }
    }
}

/// How savings are put to work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPolicy {
    /// Fixed deposit per period while active
    #[serde(default)]
    pub amount: f64,
    /// Share of a positive net cash flow that is invested; the rest is spent
    #[serde(default = "default_surplus_fraction")]
    pub surplus_fraction: f64,
    #[serde(default)]
    pub start_period: usize,
    #[serde(default)]
    pub end_period: Option<usize>,
    #[serde(default)]
    pub inflation_indexed: bool,
}

impl Default for ContributionPolicy {
    fn default() -> Self {
        Self {
            amount: 0.0,
            surplus_fraction: 1.0,
            start_period: 0,
            end_period: None,
            inflation_indexed: false,
        }
    }
}

impl ContributionPolicy {
    #[must_use]
    pub fn is_active(&self, period: usize) -> bool {
        is_within(period, self.start_period, self.end_period)
    }

    /// Fixed deposit due in `period`
    #[must_use]
    pub fn fixed_amount_at(&self, period: usize, price_index: f64) -> f64 {
        if !self.is_active(period) {
            return 0.0;
        }
        if self.inflation_indexed {
            self.amount * price_index
        } else {
            self.amount
        }
    }
}

/// Amount drawn from the portfolio for spending each period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum WithdrawalStrategy {
    #[default]
    None,
    Fixed {
        amount: f64,
        #[serde(default)]
        inflation_indexed: bool,
    },
    /// Fraction of the portfolio balance at the start of the period
    PercentOfBalance { rate: f64 },
}

/// Priority in which buckets are drawn down
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum WithdrawalOrder {
    /// Buckets in the order they were declared
    #[default]
    Declared,
    /// Proportionally to current balances
    ProRata,
    /// Bucket names, highest priority first; unlisted buckets follow in
    /// declared order
    Custom(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalPolicy {
    #[serde(default)]
    pub strategy: WithdrawalStrategy,
    /// First period in which the strategy withdraws (deficits are always covered)
    #[serde(default)]
    pub start_period: usize,
    #[serde(default)]
    pub order: WithdrawalOrder,
    /// Carry an uncovered deficit as a negative balance instead of stopping at zero
    #[serde(default)]
    pub allow_debt: bool,
}

impl WithdrawalPolicy {
    /// Spending withdrawal requested for `period`
    #[must_use]
    pub fn amount_at(&self, period: usize, portfolio_balance: f64, price_index: f64) -> f64 {
        if period < self.start_period {
            return 0.0;
        }
        match self.strategy {
            WithdrawalStrategy::None => 0.0,
            WithdrawalStrategy::Fixed {
                amount,
                inflation_indexed,
            } => {
                if inflation_indexed {
                    amount * price_index
                } else {
                    amount
                }
            }
            WithdrawalStrategy::PercentOfBalance { rate } => (portfolio_balance * rate).max(0.0),
        }
    }
}

fn is_within(period: usize, start: usize, end: Option<usize>) -> bool {
    period >= start && end.is_none_or(|end| period < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_window() {
        let stream = CashFlowStream {
            start_period: 2,
            end_period: Some(4),
            ..CashFlowStream::new("Salary", 100.0)
        };
        assert_eq!(stream.amount_at(1, 1.0), 0.0);
        assert_eq!(stream.amount_at(2, 1.0), 100.0);
        assert_eq!(stream.amount_at(3, 1.0), 100.0);
        assert_eq!(stream.amount_at(4, 1.0), 0.0);
    }

    #[test]
    fn test_indexed_stream_scales_with_price_index() {
        let stream = CashFlowStream {
            inflation_indexed: true,
            ..CashFlowStream::new("Rent", 1_000.0)
        };
        assert!((stream.amount_at(5, 1.1) - 1_100.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_of_balance_withdrawal() {
        let policy = WithdrawalPolicy {
            strategy: WithdrawalStrategy::PercentOfBalance { rate: 0.04 },
            start_period: 10,
            ..Default::default()
        };
        assert_eq!(policy.amount_at(9, 100_000.0, 1.0), 0.0);
        assert!((policy.amount_at(10, 100_000.0, 1.0) - 4_000.0).abs() < 1e-9);
        assert_eq!(policy.amount_at(10, -500.0, 1.0), 0.0);
    }

    #[test]
    fn test_monthly_span() {
        let date = jiff::civil::date(2025, 1, 31);
        let next = date.saturating_add(PeriodFrequency::Monthly.span(1));
        assert_eq!(next, jiff::civil::date(2025, 2, 28));
    }
}
