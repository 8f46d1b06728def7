use std::borrow::Cow;

use rand::seq::SliceRandom;
use rand::{Rng, distr::Distribution};
use serde::{Deserialize, Serialize};

use crate::error::InvalidParameterError;

/// Convert an annual rate to the equivalent compounded rate for one period
/// when a year is split into `periods_per_year` periods.
#[must_use]
#[inline]
pub fn periodic_rate(annual_rate: f64, periods_per_year: f64) -> f64 {
    if periods_per_year == 1.0 {
        return annual_rate;
    }
    (1.0 + annual_rate).powf(1.0 / periods_per_year) - 1.0
}

/// Parameters of the normal distribution of `ln(1 + r)` such that the gross
/// return `1 + r` has arithmetic mean `1 + mean` and standard deviation `std_dev`.
fn log_normal_params(mean: f64, std_dev: f64) -> (f64, f64) {
    let gross = 1.0 + mean;
    let sigma_sq = (1.0 + (std_dev / gross).powi(2)).ln();
    (gross.ln() - sigma_sq / 2.0, sigma_sq.sqrt())
}

/// Statistical model for one asset class's returns.
///
/// Rates are expressed annually and scaled to the simulation's period length
/// when sampled, except `PeriodFixed` and `Bootstrap` which are taken as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ReturnProfile {
    #[default]
    None,
    Fixed(f64),
    /// A per-period rate applied verbatim regardless of frequency
    PeriodFixed(f64),
    Normal {
        mean: f64,
        std_dev: f64,
    },
    /// Log-normal gross returns with the given arithmetic mean and volatility
    LogNormal {
        mean: f64,
        std_dev: f64,
    },
    /// Student's t distribution for fat-tailed returns.
    /// - `mean`: location
    /// - `scale`: scale parameter (not the standard deviation)
    /// - `df`: degrees of freedom, lower means fatter tails
    StudentT {
        mean: f64,
        scale: f64,
        df: f64,
    },
    /// Markov regime-switching model with bull/bear market states.
    /// Transition probabilities apply once per period and the path starts in
    /// the bull regime. Each regime is sampled one period at a time, so both
    /// must be memoryless: block or without-replacement bootstraps and nested
    /// regime models are rejected.
    RegimeSwitching {
        bull: Box<ReturnProfile>,
        bear: Box<ReturnProfile>,
        bull_to_bear_prob: f64,
        bear_to_bull_prob: f64,
    },
    /// Empirical resampling from a historical series recorded at the
    /// simulation's period frequency.
    /// - `block_size`: contiguous block length (circular); `None` or 1 is i.i.d.
    /// - `with_replacement`: when false, draws walk through shuffled passes of
    ///   the history so no observation repeats until all have been used
    Bootstrap {
        history: HistoricalReturns,
        #[serde(default)]
        block_size: Option<usize>,
        #[serde(default = "default_true")]
        with_replacement: bool,
    },
}

fn default_true() -> bool {
    true
}

impl ReturnProfile {
    /// Long-run US equity assumptions (arithmetic mean / volatility).
    pub const EQUITY_NORMAL: ReturnProfile = ReturnProfile::Normal {
        mean: 0.10,
        std_dev: 0.18,
    };
    pub const BOND_NORMAL: ReturnProfile = ReturnProfile::Normal {
        mean: 0.045,
        std_dev: 0.07,
    };
    /// Net return assumed for invested savings when nothing better is known
    pub const DEFAULT_NET_RETURN: ReturnProfile = ReturnProfile::Fixed(0.029);

    /// Create a custom regime-switching profile.
    #[must_use]
    pub fn regime_switching(
        bull: ReturnProfile,
        bear: ReturnProfile,
        bull_to_bear_prob: f64,
        bear_to_bull_prob: f64,
    ) -> ReturnProfile {
        ReturnProfile::RegimeSwitching {
            bull: Box::new(bull),
            bear: Box::new(bear),
            bull_to_bear_prob,
            bear_to_bull_prob,
        }
    }

    /// Create a bootstrap profile sampling with replacement.
    #[must_use]
    pub fn bootstrap(history: HistoricalReturns, block_size: Option<usize>) -> ReturnProfile {
        ReturnProfile::Bootstrap {
            history,
            block_size,
            with_replacement: true,
        }
    }

    /// Whether consecutive single-period draws are independent of each other
    #[must_use]
    pub fn is_memoryless(&self) -> bool {
        match self {
            ReturnProfile::RegimeSwitching { .. } => false,
            ReturnProfile::Bootstrap {
                block_size,
                with_replacement,
                ..
            } => *with_replacement && block_size.is_none_or(|bs| bs <= 1),
            _ => true,
        }
    }

    /// Check the profile's parameters without sampling.
    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        match self {
            ReturnProfile::None => Ok(()),
            ReturnProfile::Fixed(rate) | ReturnProfile::PeriodFixed(rate) => {
                check_finite("fixed return", *rate)?;
                if *rate <= -1.0 {
                    return Err(InvalidParameterError::InvalidDistributionParameters {
                        profile_type: "Fixed return",
                        mean: *rate,
                        std_dev: 0.0,
                        reason: "rate must be greater than -100%",
                    });
                }
                Ok(())
            }
            ReturnProfile::Normal { mean, std_dev } => {
                check_finite("normal mean", *mean)?;
                check_volatility("Normal return", *std_dev)
            }
            ReturnProfile::LogNormal { mean, std_dev } => {
                check_finite("log-normal mean", *mean)?;
                check_volatility("LogNormal return", *std_dev)?;
                if *mean <= -1.0 {
                    return Err(InvalidParameterError::InvalidDistributionParameters {
                        profile_type: "LogNormal return",
                        mean: *mean,
                        std_dev: *std_dev,
                        reason: "mean must be greater than -100%",
                    });
                }
                Ok(())
            }
            ReturnProfile::StudentT { mean, scale, df } => {
                check_finite("student-t mean", *mean)?;
                check_volatility("StudentT return", *scale)?;
                if !(df.is_finite() && *df > 0.0) {
                    return Err(InvalidParameterError::InvalidDistributionParameters {
                        profile_type: "StudentT return",
                        mean: *mean,
                        std_dev: *scale,
                        reason: "degrees of freedom must be positive and finite",
                    });
                }
                Ok(())
            }
            ReturnProfile::RegimeSwitching {
                bull,
                bear,
                bull_to_bear_prob,
                bear_to_bull_prob,
            } => {
                check_probability("bull_to_bear_prob", *bull_to_bear_prob)?;
                check_probability("bear_to_bull_prob", *bear_to_bull_prob)?;
                for (regime, profile) in [("bull", bull), ("bear", bear)] {
                    if !profile.is_memoryless() {
                        return Err(InvalidParameterError::StatefulRegime { regime });
                    }
                    profile.validate()?;
                }
                Ok(())
            }
            ReturnProfile::Bootstrap {
                history,
                block_size,
                ..
            } => {
                if history.is_empty() {
                    return Err(InvalidParameterError::EmptyHistoricalData {
                        name: history.name.to_string(),
                    });
                }
                if *block_size == Some(0) {
                    return Err(InvalidParameterError::ZeroBlockSize);
                }
                for r in history.returns.iter() {
                    check_finite("historical return", *r)?;
                }
                Ok(())
            }
        }
    }

    /// Sample a sequence of `n` per-period returns.
    ///
    /// Regime state and bootstrap position are carried across the sequence.
    pub fn sample_sequence<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        periods_per_year: f64,
    ) -> Result<Vec<f64>, InvalidParameterError> {
        match self {
            ReturnProfile::None => Ok(vec![0.0; n]),
            ReturnProfile::Fixed(rate) => Ok(vec![periodic_rate(*rate, periods_per_year); n]),
            ReturnProfile::PeriodFixed(rate) => Ok(vec![*rate; n]),
            ReturnProfile::Normal { mean, std_dev } => {
                let dist = rand_distr::Normal::new(
                    mean / periods_per_year,
                    std_dev / periods_per_year.sqrt(),
                )
                .map_err(|_| InvalidParameterError::InvalidDistributionParameters {
                    profile_type: "Normal return",
                    mean: *mean,
                    std_dev: *std_dev,
                    reason: "std_dev must be non-negative and finite",
                })?;
                Ok((0..n).map(|_| dist.sample(rng)).collect())
            }
            ReturnProfile::LogNormal { mean, std_dev } => {
                let (mu, sigma) = log_normal_params(*mean, *std_dev);
                let dist = rand_distr::LogNormal::new(
                    mu / periods_per_year,
                    sigma / periods_per_year.sqrt(),
                )
                .map_err(|_| InvalidParameterError::InvalidDistributionParameters {
                    profile_type: "LogNormal return",
                    mean: *mean,
                    std_dev: *std_dev,
                    reason: "std_dev must be non-negative and finite",
                })?;
                Ok((0..n).map(|_| dist.sample(rng) - 1.0).collect())
            }
            ReturnProfile::StudentT { mean, scale, df } => {
                let dist = rand_distr::StudentT::new(*df).map_err(|_| {
                    InvalidParameterError::InvalidDistributionParameters {
                        profile_type: "StudentT return",
                        mean: *mean,
                        std_dev: *scale,
                        reason: "degrees of freedom must be positive and finite",
                    }
                })?;
                let location = mean / periods_per_year;
                let spread = scale / periods_per_year.sqrt();
                Ok((0..n).map(|_| location + spread * dist.sample(rng)).collect())
            }
            ReturnProfile::RegimeSwitching {
                bull,
                bear,
                bull_to_bear_prob,
                bear_to_bull_prob,
            } => {
                let mut returns = Vec::with_capacity(n);
                let mut in_bull = true;

                for _ in 0..n {
                    let regime = if in_bull { bull } else { bear };
                    returns.extend(regime.sample_sequence(rng, 1, periods_per_year)?);

                    let transition_prob = if in_bull {
                        *bull_to_bear_prob
                    } else {
                        *bear_to_bull_prob
                    };
                    if rng.random::<f64>() < transition_prob {
                        in_bull = !in_bull;
                    }
                }

                Ok(returns)
            }
            ReturnProfile::Bootstrap {
                history,
                block_size,
                with_replacement,
            } => {
                let empty = || InvalidParameterError::EmptyHistoricalData {
                    name: history.name.to_string(),
                };
                let result = match (block_size, with_replacement) {
                    (Some(0), _) => return Err(InvalidParameterError::ZeroBlockSize),
                    (Some(bs), true) if *bs > 1 => history.block_bootstrap(rng, n, *bs),
                    (_, true) => history.sample_periods(rng, n),
                    (_, false) => history.sample_without_replacement(rng, n),
                };
                result.ok_or_else(empty)
            }
        }
    }
}

/// Inflation model. Rates are annual and scaled to the period length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum InflationProfile {
    #[default]
    None,
    Fixed(f64),
    Normal {
        mean: f64,
        std_dev: f64,
    },
    LogNormal {
        mean: f64,
        std_dev: f64,
    },
}

impl InflationProfile {
    /// Long-run US CPI assumptions.
    pub const US_HISTORICAL_FIXED: InflationProfile = InflationProfile::Fixed(0.0343);
    pub const US_HISTORICAL_NORMAL: InflationProfile = InflationProfile::Normal {
        mean: 0.0347,
        std_dev: 0.0279,
    };

    fn as_return_profile(&self) -> ReturnProfile {
        match *self {
            InflationProfile::None => ReturnProfile::None,
            InflationProfile::Fixed(rate) => ReturnProfile::Fixed(rate),
            InflationProfile::Normal { mean, std_dev } => ReturnProfile::Normal { mean, std_dev },
            InflationProfile::LogNormal { mean, std_dev } => {
                ReturnProfile::LogNormal { mean, std_dev }
            }
        }
    }

    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        self.as_return_profile().validate()
    }

    /// Sample a sequence of `n` per-period inflation rates.
    pub fn sample_sequence<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        periods_per_year: f64,
    ) -> Result<Vec<f64>, InvalidParameterError> {
        self.as_return_profile()
            .sample_sequence(rng, n, periods_per_year)
    }
}

/// Historical return series for bootstrap sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalReturns {
    /// Series name for display and error messages
    pub name: Cow<'static, str>,
    /// Observed per-period returns, oldest first
    pub returns: Cow<'static, [f64]>,
}

impl HistoricalReturns {
    #[must_use]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        returns: impl Into<Cow<'static, [f64]>>,
    ) -> Self {
        Self {
            name: name.into(),
            returns: returns.into(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Sample n periods with replacement (i.i.d. bootstrap).
    pub fn sample_periods<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Option<Vec<f64>> {
        if self.returns.is_empty() {
            return None;
        }
        Some(
            (0..n)
                .map(|_| self.returns[rng.random_range(0..self.returns.len())])
                .collect(),
        )
    }

    /// Block bootstrap: sample contiguous blocks to preserve autocorrelation.
    /// Blocks wrap around at the end of the series (circular bootstrap).
    pub fn block_bootstrap<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        block_size: usize,
    ) -> Option<Vec<f64>> {
        if self.returns.is_empty() || block_size == 0 {
            return None;
        }
        let mut result = Vec::with_capacity(n);
        while result.len() < n {
            let start = rng.random_range(0..self.returns.len());
            for i in 0..block_size {
                if result.len() >= n {
                    break;
                }
                let idx = (start + i) % self.returns.len();
                result.push(self.returns[idx]);
            }
        }
        Some(result)
    }

    /// Sample without replacement: walk a shuffled copy of the history and
    /// reshuffle once every observation has been drawn.
    pub fn sample_without_replacement<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
    ) -> Option<Vec<f64>> {
        if self.returns.is_empty() {
            return None;
        }
        let mut pool = self.returns.to_vec();
        let mut result = Vec::with_capacity(n);
        while result.len() < n {
            pool.shuffle(rng);
            let take = (n - result.len()).min(pool.len());
            result.extend_from_slice(&pool[..take]);
        }
        Some(result)
    }

    /// Arithmetic mean of the series
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.returns.is_empty() {
            return None;
        }
        Some(self.returns.iter().sum::<f64>() / self.returns.len() as f64)
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), InvalidParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidParameterError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

fn check_volatility(profile_type: &'static str, std_dev: f64) -> Result<(), InvalidParameterError> {
    if std_dev < 0.0 {
        return Err(InvalidParameterError::NegativeVolatility {
            profile_type,
            std_dev,
        });
    }
    check_finite("volatility", std_dev)
}

fn check_probability(field: &'static str, value: f64) -> Result<(), InvalidParameterError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InvalidParameterError::InvalidProbability { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_periodic_rate_compounds_back_to_annual() {
        let monthly = periodic_rate(0.12, 12.0);
        let annual = (1.0 + monthly).powi(12) - 1.0;
        assert!((annual - 0.12).abs() < 1e-12);
        assert_eq!(periodic_rate(0.07, 1.0), 0.07);
    }

    #[test]
    fn test_regimes_must_be_memoryless() {
        let history = HistoricalReturns::new("Index", vec![0.1, -0.05, 0.2]);
        let calm = ReturnProfile::Normal {
            mean: 0.08,
            std_dev: 0.1,
        };

        let blocks = ReturnProfile::bootstrap(history.clone(), Some(2));
        let profile = ReturnProfile::regime_switching(calm.clone(), blocks, 0.1, 0.3);
        assert_eq!(
            profile.validate(),
            Err(InvalidParameterError::StatefulRegime { regime: "bear" })
        );

        let nested = ReturnProfile::regime_switching(calm.clone(), calm.clone(), 0.5, 0.5);
        let profile = ReturnProfile::regime_switching(nested, calm.clone(), 0.1, 0.3);
        assert_eq!(
            profile.validate(),
            Err(InvalidParameterError::StatefulRegime { regime: "bull" })
        );

        let shuffled = ReturnProfile::Bootstrap {
            history: history.clone(),
            block_size: None,
            with_replacement: false,
        };
        assert!(!shuffled.is_memoryless());

        // i.i.d. resampling carries no state between periods
        let iid = ReturnProfile::bootstrap(history, Some(1));
        assert!(ReturnProfile::regime_switching(calm, iid, 0.1, 0.3)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_normal_sampling_statistics() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let profile = ReturnProfile::Normal {
            mean: 0.08,
            std_dev: 0.15,
        };
        let samples = profile.sample_sequence(&mut rng, 20_000, 1.0).unwrap();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!((mean - 0.08).abs() < 0.01, "mean {mean} too far from 0.08");
        assert!(
            (var.sqrt() - 0.15).abs() < 0.01,
            "std dev {} too far from 0.15",
            var.sqrt()
        );
    }

    #[test]
    fn test_log_normal_matches_arithmetic_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let profile = ReturnProfile::LogNormal {
            mean: 0.07,
            std_dev: 0.2,
        };
        let samples = profile.sample_sequence(&mut rng, 50_000, 1.0).unwrap();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;

        assert!((mean - 0.07).abs() < 0.01, "mean {mean} too far from 0.07");
        assert!(samples.iter().all(|r| *r > -1.0));
    }

    #[test]
    fn test_student_t_sampling_is_finite() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let profile = ReturnProfile::StudentT {
            mean: 0.10,
            scale: 0.15,
            df: 5.0,
        };
        let samples = profile.sample_sequence(&mut rng, 10_000, 12.0).unwrap();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;

        assert!(samples.iter().all(|r| r.is_finite()));
        assert!((mean - 0.10 / 12.0).abs() < 0.005);
    }

    #[test]
    fn test_regime_switching_never_leaving_bull() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let profile = ReturnProfile::regime_switching(
            ReturnProfile::PeriodFixed(0.05),
            ReturnProfile::PeriodFixed(-0.10),
            0.0,
            1.0,
        );
        let samples = profile.sample_sequence(&mut rng, 30, 1.0).unwrap();
        assert!(samples.iter().all(|r| *r == 0.05));
    }

    #[test]
    fn test_regime_switching_alternates_with_certain_transitions() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let profile = ReturnProfile::regime_switching(
            ReturnProfile::PeriodFixed(0.05),
            ReturnProfile::PeriodFixed(-0.10),
            1.0,
            1.0,
        );
        let samples = profile.sample_sequence(&mut rng, 4, 1.0).unwrap();
        assert_eq!(samples, vec![0.05, -0.10, 0.05, -0.10]);
    }

    #[test]
    fn test_bootstrap_draws_come_from_history() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let history = HistoricalReturns::new("toy", vec![0.1, -0.05, 0.02, 0.3]);
        let profile = ReturnProfile::bootstrap(history.clone(), None);
        let samples = profile.sample_sequence(&mut rng, 100, 1.0).unwrap();
        assert!(samples.iter().all(|r| history.returns.contains(r)));
    }

    #[test]
    fn test_block_bootstrap_keeps_contiguous_runs() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let history = HistoricalReturns::new("ramp", vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let samples = history.block_bootstrap(&mut rng, 5, 5).unwrap();
        for pair in samples.windows(2) {
            let expected = (pair[0] + 1.0) % 5.0;
            assert_eq!(pair[1], expected);
        }
    }

    #[test]
    fn test_without_replacement_uses_each_observation_once_per_pass() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let history = HistoricalReturns::new("four", vec![1.0, 2.0, 3.0, 4.0]);
        let profile = ReturnProfile::Bootstrap {
            history,
            block_size: None,
            with_replacement: false,
        };
        let samples = profile.sample_sequence(&mut rng, 8, 1.0).unwrap();

        for pass in samples.chunks(4) {
            let mut sorted = pass.to_vec();
            sorted.sort_by(f64::total_cmp);
            assert_eq!(sorted, vec![1.0, 2.0, 3.0, 4.0]);
        }
    }

    #[test]
    fn test_negative_volatility_rejected() {
        let profile = ReturnProfile::Normal {
            mean: 0.05,
            std_dev: -0.1,
        };
        assert!(matches!(
            profile.validate(),
            Err(InvalidParameterError::NegativeVolatility { .. })
        ));
    }

    #[test]
    fn test_empty_history_rejected() {
        let profile = ReturnProfile::bootstrap(HistoricalReturns::new("empty", vec![]), None);
        assert!(matches!(
            profile.validate(),
            Err(InvalidParameterError::EmptyHistoricalData { .. })
        ));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(profile.sample_sequence(&mut rng, 3, 1.0).is_err());
    }

    #[test]
    fn test_inflation_fixed_is_periodic() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let monthly = InflationProfile::Fixed(0.03)
            .sample_sequence(&mut rng, 12, 12.0)
            .unwrap();
        let factor: f64 = monthly.iter().map(|r| 1.0 + r).product();
        assert!((factor - 1.03).abs() < 1e-12);
    }
}
