//! Real-estate holdings and their financing

use serde::{Deserialize, Serialize};

use super::market::periodic_rate;

/// Fixed-rate amortizing loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub principal: f64,
    pub annual_rate: f64,
    /// Number of periods until the loan is repaid
    pub term_periods: usize,
}

impl Loan {
    /// Interest rate applied to the outstanding debt each period
    #[must_use]
    pub fn period_rate(&self, periods_per_year: f64) -> f64 {
        self.annual_rate / periods_per_year
    }

    /// Constant annuity payment per period
    #[must_use]
    pub fn payment(&self, periods_per_year: f64) -> f64 {
        if self.term_periods == 0 {
            return 0.0;
        }
        let n = self.term_periods as f64;
        let r = self.period_rate(periods_per_year);
        if r == 0.0 {
            self.principal / n
        } else {
            self.principal * r / (1.0 - (1.0 + r).powf(-n))
        }
    }
}

/// A property that is owned at the start or bought/sold during the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Market value at purchase (or at period 0 if already owned)
    pub value: f64,
    /// Annual appreciation rate
    #[serde(default)]
    pub appreciation: f64,
    /// Period in which the property is bought; `None` means owned from the start
    #[serde(default)]
    pub purchase_period: Option<usize>,
    #[serde(default)]
    pub sale_period: Option<usize>,
    /// Transaction taxes and fees paid on purchase
    #[serde(default)]
    pub purchase_costs: f64,
    /// Fees deducted from the proceeds on sale
    #[serde(default)]
    pub selling_costs: f64,
    /// Recurring per-period ownership costs (property tax, condo charges)
    #[serde(default)]
    pub carrying_costs: f64,
    #[serde(default)]
    pub loan: Option<Loan>,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            appreciation: 0.0,
            purchase_period: None,
            sale_period: None,
            purchase_costs: 0.0,
            selling_costs: 0.0,
            carrying_costs: 0.0,
            loan: None,
        }
    }

    /// State at period 0
    #[must_use]
    pub fn initial_state(&self) -> PropertyState {
        if self.purchase_period.is_some() {
            PropertyState::default()
        } else {
            PropertyState {
                owned: true,
                value: self.value,
                debt: self.loan.map_or(0.0, |l| l.principal),
                loan_periods_remaining: self.loan.map_or(0, |l| l.term_periods),
            }
        }
    }

    /// Cash needed at purchase: price plus costs, less the financed part
    #[must_use]
    pub fn down_payment(&self) -> f64 {
        self.value + self.purchase_costs - self.loan.map_or(0.0, |l| l.principal)
    }
}

/// Per-path ownership snapshot of one property
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyState {
    pub owned: bool,
    pub value: f64,
    pub debt: f64,
    pub loan_periods_remaining: usize,
}

impl PropertyState {
    #[must_use]
    pub fn equity(&self) -> f64 {
        if self.owned { self.value - self.debt } else { 0.0 }
    }
}

/// Outcome of servicing a loan for one period
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoanService {
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
}

/// Service one period of the loan on `state`, returning the cash paid.
///
/// The final payment clears whatever debt is left so rounding never leaves a
/// residual balance.
pub fn service_loan(state: &mut PropertyState, loan: &Loan, periods_per_year: f64) -> LoanService {
    if !state.owned || state.loan_periods_remaining == 0 || state.debt <= 0.0 {
        state.debt = state.debt.max(0.0);
        state.loan_periods_remaining = 0;
        return LoanService::default();
    }

    let interest = state.debt * loan.period_rate(periods_per_year);
    let scheduled = loan.payment(periods_per_year);
    let payment = if state.loan_periods_remaining == 1 {
        state.debt + interest
    } else {
        scheduled.min(state.debt + interest)
    };
    let principal = payment - interest;

    state.debt -= principal;
    state.loan_periods_remaining -= 1;
    if state.loan_periods_remaining == 0 {
        state.debt = 0.0;
    }

    LoanService {
        payment,
        interest,
        principal,
    }
}

/// Grow the property value by one period of appreciation
pub fn appreciate(state: &mut PropertyState, property: &Property, periods_per_year: f64) {
    if state.owned {
        state.value *= 1.0 + periodic_rate(property.appreciation, periods_per_year);
    }
}
