//! Income tax calculation for the pluggable tax policy

use crate::model::{TaxBracket, TaxPolicy};

/// Calculate income tax using progressive brackets.
/// Returns the total tax owed on the given annual income.
pub fn calculate_income_tax(income: f64, brackets: &[TaxBracket]) -> f64 {
    if income <= 0.0 || brackets.is_empty() {
        return 0.0;
    }

    let mut tax = 0.0;
    for (i, bracket) in brackets.iter().enumerate() {
        if income <= bracket.threshold {
            break;
        }
        let next_threshold = brackets
            .get(i + 1)
            .map(|b| b.threshold)
            .unwrap_or(f64::INFINITY);
        let taxable_in_bracket = income.min(next_threshold) - bracket.threshold;
        tax += taxable_in_bracket * bracket.rate;
    }

    tax
}

/// Tax due on one period's taxable income.
///
/// Progressive brackets are annual, so the period income is annualized,
/// taxed, and the result spread back over the year's periods.
pub fn tax_for_period(policy: &TaxPolicy, taxable_income: f64, periods_per_year: f64) -> f64 {
    if taxable_income <= 0.0 {
        return 0.0;
    }
    match policy {
        TaxPolicy::None => 0.0,
        TaxPolicy::Flat { rate } => taxable_income * rate,
        TaxPolicy::Progressive { brackets } => {
            calculate_income_tax(taxable_income * periods_per_year, brackets) / periods_per_year
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket {
                threshold: 0.0,
                rate: 0.10,
            },
            TaxBracket {
                threshold: 10_000.0,
                rate: 0.20,
            },
            TaxBracket {
                threshold: 50_000.0,
                rate: 0.40,
            },
        ]
    }

    #[test]
    fn test_progressive_tax() {
        assert_eq!(calculate_income_tax(0.0, &brackets()), 0.0);
        assert!((calculate_income_tax(5_000.0, &brackets()) - 500.0).abs() < 1e-9);
        // 10k @ 10% + 40k @ 20% + 10k @ 40%
        assert!((calculate_income_tax(60_000.0, &brackets()) - 13_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_progressive_matches_annual() {
        let policy = TaxPolicy::Progressive {
            brackets: brackets(),
        };
        let monthly = tax_for_period(&policy, 5_000.0, 12.0);
        assert!((monthly * 12.0 - 13_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_and_none() {
        assert_eq!(tax_for_period(&TaxPolicy::None, 1_000.0, 1.0), 0.0);
        let flat = TaxPolicy::Flat { rate: 0.3 };
        assert!((tax_for_period(&flat, 1_000.0, 1.0) - 300.0).abs() < 1e-9);
        assert_eq!(tax_for_period(&TaxPolicy::Flat { rate: 0.3 }, -5.0, 1.0), 0.0);
    }
}
