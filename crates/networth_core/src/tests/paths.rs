//! Tests for whole-path simulation
//!
//! These tests verify that:
//! - Fixed per-period returns compound as expected
//! - Trajectories have one state per period plus the initial state
//! - The same seed always yields the same trajectory
//! - Larger contributions never lower the terminal balance
//! - Losses beyond -100% leave a bucket empty, not negative
//! - Malformed draw sequences are rejected

use crate::config::SimulationParameters;
use crate::error::InvalidParameterError;
use crate::model::{
    Bucket, CashFlowStream, InflationProfile, PeriodFrequency, ReturnProfile,
};
use crate::scenario::{DrawSequence, generate_path};
use crate::simulation::{simulate, simulate_path};

fn single_bucket(balance: f64, returns: ReturnProfile, horizon: usize) -> SimulationParameters {
    SimulationParameters {
        horizon,
        buckets: vec![Bucket::new("Portfolio", balance, 1.0).with_returns(returns)],
        ..Default::default()
    }
}

#[test]
fn test_period_fixed_compounding() {
    let params = single_bucket(10_000.0, ReturnProfile::PeriodFixed(0.01), 12);
    let trajectory = simulate(&params, 1).unwrap();

    assert_eq!(trajectory.len(), 13);
    let terminal = trajectory.terminal().total_balance();
    assert!(
        (terminal - 11_268.25).abs() < 0.01,
        "Expected ~11268.25, got {terminal:.4}"
    );
}

#[test]
fn test_annual_rate_converted_to_monthly() {
    let mut params = single_bucket(10_000.0, ReturnProfile::Fixed(0.12), 12);
    params.frequency = PeriodFrequency::Monthly;
    let trajectory = simulate(&params, 1).unwrap();

    let terminal = trajectory.terminal().total_balance();
    assert!((terminal - 11_200.0).abs() < 1e-6, "got {terminal}");
}

#[test]
fn test_zero_horizon() {
    let params = single_bucket(5_000.0, ReturnProfile::EQUITY_NORMAL, 0);
    let trajectory = simulate(&params, 9).unwrap();

    assert_eq!(trajectory.len(), 1);
    assert_eq!(trajectory.horizon(), 0);
    assert_eq!(trajectory.initial(), trajectory.terminal());
    assert_eq!(trajectory.terminal().total_balance(), 5_000.0);
}

#[test]
fn test_same_seed_same_trajectory() {
    let mut params = single_bucket(50_000.0, ReturnProfile::EQUITY_NORMAL, 40);
    params.inflation = InflationProfile::US_HISTORICAL_NORMAL;
    params.expenses.push(CashFlowStream {
        inflation_indexed: true,
        ..CashFlowStream::new("Living", 2_000.0)
    });

    let a = simulate(&params, 2024).unwrap();
    let b = simulate(&params, 2024).unwrap();
    let c = simulate(&params, 2025).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_simulate_path_matches_generated_draws() {
    let params = single_bucket(1_000.0, ReturnProfile::BOND_NORMAL, 10);
    let draws = generate_path(&params, 0, 77).unwrap();
    assert_eq!(
        simulate_path(&params, &draws).unwrap(),
        simulate(&params, 77).unwrap()
    );
}

#[test]
fn test_larger_contribution_never_lowers_terminal() {
    let base = single_bucket(
        10_000.0,
        ReturnProfile::LogNormal {
            mean: 0.07,
            std_dev: 0.2,
        },
        25,
    );
    for seed in 0..20 {
        let low = simulate(&base.with_contribution_amount(100.0), seed).unwrap();
        let high = simulate(&base.with_contribution_amount(500.0), seed).unwrap();
        assert!(
            high.terminal().total_balance() >= low.terminal().total_balance(),
            "seed {seed}"
        );
    }
}

#[test]
fn test_fat_tails_never_drive_balances_negative() {
    let params = single_bucket(
        10_000.0,
        ReturnProfile::StudentT {
            mean: 0.07,
            scale: 0.3,
            df: 2.0,
        },
        30,
    );
    for seed in 0..200 {
        let trajectory = simulate(&params, seed).unwrap();
        for state in trajectory.states() {
            assert!(
                state.balances.iter().all(|&b| b >= 0.0),
                "seed {seed}, period {}: {:?}",
                state.period,
                state.balances
            );
        }
        assert!(!trajectory.had_shortfall());
    }
}

#[test]
fn test_short_draw_sequence_rejected() {
    let params = single_bucket(1_000.0, ReturnProfile::None, 10);
    let draws = DrawSequence::constant(9, &[0.0], 0.0);
    assert_eq!(
        simulate_path(&params, &draws),
        Err(InvalidParameterError::DrawSequenceTooShort {
            expected: 10,
            actual: 9
        })
    );
}

#[test]
fn test_bucket_count_mismatch_rejected() {
    let params = single_bucket(1_000.0, ReturnProfile::None, 3);
    let draws = DrawSequence::constant(3, &[0.0, 0.0], 0.0);
    assert!(matches!(
        simulate_path(&params, &draws),
        Err(InvalidParameterError::DrawBucketMismatch { .. })
    ));
}

#[test]
fn test_shortfall_periods_and_floor() {
    let mut params = single_bucket(1_000.0, ReturnProfile::None, 5);
    params.expenses.push(CashFlowStream::new("Living", 400.0));
    let trajectory = simulate(&params, 0).unwrap();

    // 1000 -> 600 -> 200 -> short in periods 2, 3 and 4
    assert_eq!(trajectory.shortfall_periods(), vec![2, 3, 4]);
    assert!(trajectory.had_shortfall());
    assert!(trajectory.balances().all(|b| b >= 0.0));
    assert_eq!(trajectory.min_balance(), 0.0);
}

#[test]
fn test_debt_allowed_goes_negative() {
    let mut params = single_bucket(1_000.0, ReturnProfile::Fixed(0.05), 5);
    params.expenses.push(CashFlowStream::new("Living", 400.0));
    params.withdrawal.allow_debt = true;
    let trajectory = simulate(&params, 0).unwrap();

    assert!(trajectory.terminal().total_balance() < 0.0);
    assert!(trajectory.shortfalls().all(|s| s.carried_as_debt));
}

#[test]
fn test_trajectory_helpers() {
    let params = single_bucket(100.0, ReturnProfile::None, 3);
    let draws = DrawSequence::new(
        [0.5, -0.5, 0.2]
            .into_iter()
            .map(|r| crate::scenario::PeriodDraw {
                returns: vec![r],
                inflation: 0.0,
            })
            .collect(),
    );
    let trajectory = simulate_path(&params, &draws).unwrap();

    // 100 -> 150 -> 75 -> 90
    assert!((trajectory.max_drawdown() - 0.5).abs() < 1e-12);
    assert_eq!(trajectory.min_balance(), 75.0);

    let dates = trajectory.period_dates(jiff::civil::date(2025, 6, 30), PeriodFrequency::Yearly);
    assert_eq!(dates.len(), 4);
    assert_eq!(dates[3], jiff::civil::date(2028, 6, 30));
}

#[test]
fn test_income_stream_window() {
    let mut params = single_bucket(0.0, ReturnProfile::None, 6);
    params.income.push(CashFlowStream {
        start_period: 2,
        end_period: Some(4),
        taxable: false,
        ..CashFlowStream::new("Contract", 1_000.0)
    });
    let trajectory = simulate(&params, 0).unwrap();
    let balances: Vec<f64> = trajectory.balances().collect();
    assert_eq!(
        balances,
        vec![0.0, 0.0, 0.0, 1_000.0, 2_000.0, 2_000.0, 2_000.0]
    );
}
