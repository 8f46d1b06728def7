//! Moving money in and out of the asset buckets
//!
//! Withdrawals follow the policy's priority order (or pro-rata); deposits and
//! rebalancing follow the target allocation weights.

/// Amounts below this are treated as fully covered
const EPSILON: f64 = 1e-9;

/// Result of drawing an amount from the buckets
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WithdrawalOutcome {
    /// Total removed from the buckets, including any amount carried as debt
    pub withdrawn: f64,
    /// Part of the request the non-negative balances could not cover
    pub unmet: f64,
    /// Whether `unmet` was booked as a negative balance
    pub carried_as_debt: bool,
}

impl WithdrawalOutcome {
    #[must_use]
    pub fn is_shortfall(&self) -> bool {
        self.unmet > EPSILON
    }
}

/// Withdraw `amount` from `balances`.
///
/// Only positive balances are drawn. With `pro_rata` each bucket gives in
/// proportion to its balance; otherwise buckets are emptied one after another
/// in `priority` order. Whatever remains is unmet; with `allow_debt` it is
/// subtracted from the last bucket in `priority`, otherwise balances stay at
/// zero.
pub fn withdraw(
    balances: &mut [f64],
    amount: f64,
    priority: &[usize],
    pro_rata: bool,
    allow_debt: bool,
) -> WithdrawalOutcome {
    if amount <= 0.0 {
        return WithdrawalOutcome::default();
    }

    let mut remaining = amount;
    if pro_rata {
        let available: f64 = balances.iter().map(|b| b.max(0.0)).sum();
        if available > 0.0 {
            let take = remaining.min(available);
            let emptied = take >= available;
            for balance in balances.iter_mut().filter(|b| **b > 0.0) {
                if emptied {
                    *balance = 0.0;
                } else {
                    *balance -= take * (*balance / available);
                }
            }
            remaining -= take;
        }
    } else {
        for &idx in priority {
            if remaining <= EPSILON {
                break;
            }
            let available = balances[idx].max(0.0);
            let take = remaining.min(available);
            balances[idx] -= take;
            remaining -= take;
        }
    }

    if remaining <= EPSILON {
        return WithdrawalOutcome {
            withdrawn: amount,
            unmet: 0.0,
            carried_as_debt: false,
        };
    }

    match priority.last() {
        Some(&last) if allow_debt => {
            balances[last] -= remaining;
            WithdrawalOutcome {
                withdrawn: amount,
                unmet: remaining,
                carried_as_debt: true,
            }
        }
        _ => WithdrawalOutcome {
            withdrawn: amount - remaining,
            unmet: remaining,
            carried_as_debt: false,
        },
    }
}

/// Spread `amount` across buckets by target weight
pub fn deposit(balances: &mut [f64], amount: f64, weights: impl Iterator<Item = f64>) {
    if amount <= 0.0 {
        return;
    }
    for (balance, weight) in balances.iter_mut().zip(weights) {
        *balance += amount * weight;
    }
}

/// Reset buckets to their target weights of the current total.
///
/// Skipped when the total is not positive, so a net debt position is left
/// where it was booked.
pub fn rebalance(balances: &mut [f64], weights: impl Iterator<Item = f64>) {
    let total: f64 = balances.iter().sum();
    if total <= 0.0 {
        return;
    }
    for (balance, weight) in balances.iter_mut().zip(weights) {
        *balance = total * weight;
    }
}
