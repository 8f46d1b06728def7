//! Asset buckets and the per-period account state

use serde::{Deserialize, Serialize};

use super::market::ReturnProfile;
use super::property::PropertyState;

/// One asset-class sub-account with its own return model and target weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub initial_balance: f64,
    /// Target allocation weight; all bucket weights sum to one
    pub weight: f64,
    #[serde(default)]
    pub returns: ReturnProfile,
}

impl Bucket {
    #[must_use]
    pub fn new(name: impl Into<String>, initial_balance: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            initial_balance,
            weight,
            returns: ReturnProfile::None,
        }
    }

    #[must_use]
    pub fn with_returns(mut self, returns: ReturnProfile) -> Self {
        self.returns = returns;
        self
    }
}

/// A period in which spending needs could not be met from the portfolio.
///
/// Recorded as data on the state, never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortfallEvent {
    pub period: usize,
    /// Amount that the buckets could not cover
    pub unmet: f64,
    /// Whether the unmet amount was carried as debt
    pub carried_as_debt: bool,
}

/// Snapshot of one path at the end of a period (period 0 is the initial state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub period: usize,
    /// Balance per bucket, in parameter order
    pub balances: Vec<f64>,
    /// Ownership state per property, in parameter order
    pub properties: Vec<PropertyState>,
    /// Cumulative inflation factor since period 0
    pub price_index: f64,
    pub cumulative_contributions: f64,
    pub cumulative_withdrawals: f64,
    pub cumulative_taxes: f64,
    /// Household cash flow of the period that produced this state, before
    /// withdrawals and contributions; positive is a surplus
    #[serde(default)]
    pub net_cash_flow: f64,
    /// Set when the period that produced this state ran short
    pub shortfall: Option<ShortfallEvent>,
}

impl AccountState {
    /// Total portfolio balance across buckets
    #[must_use]
    pub fn total_balance(&self) -> f64 {
        self.balances.iter().sum()
    }

    #[must_use]
    pub fn property_equity(&self) -> f64 {
        self.properties.iter().map(PropertyState::equity).sum()
    }

    /// Portfolio plus property equity, nominal
    #[must_use]
    pub fn net_worth(&self) -> f64 {
        self.total_balance() + self.property_equity()
    }

    /// Net worth in period-0 currency
    #[must_use]
    pub fn real_net_worth(&self) -> f64 {
        self.net_worth() / self.price_index
    }

    #[must_use]
    pub fn is_shortfall(&self) -> bool {
        self.shortfall.is_some()
    }
}
