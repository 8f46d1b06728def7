//! Period stepper: advances one account state by one period
//!
//! Within period `k` the order is fixed:
//!
//! 1. cash flows: property purchases and sales, loan service, carrying
//!    costs, income net of tax and expenses; any deficit plus the spending
//!    withdrawal is drawn from the buckets
//! 2. contributions: the fixed deposit plus the invested share of any surplus,
//!    spread by target weight; skipped entirely in a period that ends in a
//!    shortfall
//! 3. growth: bucket returns and property appreciation, then optional
//!    rebalancing. A return below -100% wipes a bucket out but never pushes
//!    it negative; only an unmet withdrawal with `allow_debt` creates debt
//! 4. inflation: the price index moves by the period's inflation draw

use crate::config::SimulationParameters;
use crate::liquidation::{deposit, rebalance, withdraw};
use crate::model::{
    AccountState, PropertyState, ShortfallEvent, WithdrawalOrder, appreciate, service_loan,
};
use crate::scenario::PeriodDraw;
use crate::taxes::tax_for_period;

/// Money moving through the household in one period, before the portfolio
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodCashFlow {
    pub income: f64,
    pub tax: f64,
    pub expenses: f64,
    /// Down payments, loan payments and carrying costs
    pub property_outflows: f64,
    /// Sale proceeds net of debt and selling costs
    pub property_inflows: f64,
}

impl PeriodCashFlow {
    /// Positive for a surplus, negative for a deficit
    #[must_use]
    pub fn net(&self) -> f64 {
        self.income - self.tax - self.expenses + self.property_inflows - self.property_outflows
    }
}

/// Advance `state` through period `k`. Pure: the input state is untouched.
///
/// `draw` must carry one return per bucket; missing entries are treated as a
/// zero return.
#[must_use]
pub fn step(
    state: &AccountState,
    k: usize,
    params: &SimulationParameters,
    draw: &PeriodDraw,
) -> AccountState {
    let ppy = params.periods_per_year();
    let mut next = state.clone();
    next.period = k + 1;
    next.shortfall = None;

    // (a) cash flows
    let flows = settle_cash_flows(&mut next.properties, k, state.price_index, params);
    let net = flows.net();
    next.net_cash_flow = net;

    let spending = params
        .withdrawal
        .amount_at(k, state.total_balance(), state.price_index);
    let priority = params.withdrawal_priority();
    let outcome = withdraw(
        &mut next.balances,
        (-net).max(0.0) + spending,
        &priority,
        matches!(params.withdrawal.order, WithdrawalOrder::ProRata),
        params.withdrawal.allow_debt,
    );
    if outcome.is_shortfall() {
        next.shortfall = Some(ShortfallEvent {
            period: k,
            unmet: outcome.unmet,
            carried_as_debt: outcome.carried_as_debt,
        });
    }

    // (b) contributions
    let contribution = &params.contribution;
    let invested = if contribution.is_active(k) && !outcome.is_shortfall() {
        contribution.fixed_amount_at(k, state.price_index)
            + contribution.surplus_fraction * net.max(0.0)
    } else {
        0.0
    };
    deposit(
        &mut next.balances,
        invested,
        params.buckets.iter().map(|b| b.weight),
    );

    // (c) growth
    for (balance, rate) in next.balances.iter_mut().zip(&draw.returns) {
        if *balance > 0.0 {
            *balance *= (1.0 + rate).max(0.0);
        }
    }
    for (property_state, property) in next.properties.iter_mut().zip(&params.properties) {
        appreciate(property_state, property, ppy);
    }
    if params.rebalance {
        rebalance(&mut next.balances, params.buckets.iter().map(|b| b.weight));
    }

    // (d) inflation
    next.price_index *= 1.0 + draw.inflation;

    next.cumulative_contributions += invested;
    next.cumulative_withdrawals += outcome.withdrawn;
    next.cumulative_taxes += flows.tax;
    next
}

/// Apply property events and collect the period's household cash flow
pub fn settle_cash_flows(
    properties: &mut [PropertyState],
    k: usize,
    price_index: f64,
    params: &SimulationParameters,
) -> PeriodCashFlow {
    let ppy = params.periods_per_year();
    let mut flows = PeriodCashFlow::default();

    for (property_state, property) in properties.iter_mut().zip(&params.properties) {
        if property.purchase_period == Some(k) {
            *property_state = PropertyState {
                owned: true,
                value: property.value,
                debt: property.loan.map_or(0.0, |l| l.principal),
                loan_periods_remaining: property.loan.map_or(0, |l| l.term_periods),
            };
            flows.property_outflows += property.down_payment();
        }
        if !property_state.owned {
            continue;
        }
        if property.sale_period == Some(k) {
            flows.property_inflows +=
                property_state.value - property_state.debt - property.selling_costs;
            *property_state = PropertyState::default();
            continue;
        }
        if let Some(loan) = &property.loan {
            flows.property_outflows += service_loan(property_state, loan, ppy).payment;
        }
        flows.property_outflows += property.carrying_costs;
    }

    let mut taxable = 0.0;
    for stream in &params.income {
        let amount = stream.amount_at(k, price_index);
        flows.income += amount;
        if stream.taxable {
            taxable += amount;
        }
    }
    flows.tax = tax_for_period(&params.tax, taxable, ppy);
    flows.expenses = params
        .expenses
        .iter()
        .map(|s| s.amount_at(k, price_index))
        .sum();

    flows
}
