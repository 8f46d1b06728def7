//! YAML parameter presets
//!
//! Presets use internally tagged enums with explicit field names so they read
//! naturally in YAML, and are converted into the engine's
//! [`SimulationParameters`] before running.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use jiff::civil::Date;
use networth_core::config::SimulationParameters;
use networth_core::model::{
    AccumulatorKind, Bucket, CashFlowStream, ContributionPolicy, Goal, HistoricalReturns,
    InflationProfile, MonteCarloConfig, PeriodFrequency, Property, ReturnProfile, TaxBracket,
    TaxPolicy, WithdrawalOrder, WithdrawalPolicy, WithdrawalStrategy,
};
use serde::{Deserialize, Serialize};

/// A saved scenario: household parameters plus Monte Carlo settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub name: String,
    /// Horizon in periods; takes precedence over `years`
    #[serde(default)]
    pub horizon: Option<usize>,
    #[serde(default)]
    pub years: Option<usize>,
    #[serde(default)]
    pub frequency: PeriodFrequency,
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub buckets: Vec<BucketData>,
    #[serde(default)]
    pub income: Vec<CashFlowStream>,
    #[serde(default)]
    pub expenses: Vec<CashFlowStream>,
    #[serde(default)]
    pub contribution: ContributionPolicy,
    #[serde(default)]
    pub withdrawal: WithdrawalData,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub inflation: InflationData,
    #[serde(default)]
    pub tax: TaxData,
    #[serde(default)]
    pub rebalance: bool,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub monte_carlo: MonteCarloData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketData {
    pub name: String,
    #[serde(default)]
    pub balance: f64,
    pub weight: f64,
    #[serde(default)]
    pub returns: ReturnProfileData,
}

/// YAML-friendly representation of a return profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReturnProfileData {
    #[default]
    None,
    Fixed {
        rate: f64,
    },
    /// Rate applied verbatim each period
    PeriodFixed {
        rate: f64,
    },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    LogNormal {
        mean: f64,
        std_dev: f64,
    },
    StudentT {
        mean: f64,
        scale: f64,
        df: f64,
    },
    RegimeSwitching {
        bull: Box<ReturnProfileData>,
        bear: Box<ReturnProfileData>,
        bull_to_bear_prob: f64,
        bear_to_bull_prob: f64,
    },
    /// Resampling from a series recorded at the preset's frequency
    Bootstrap {
        #[serde(default)]
        name: String,
        returns: Vec<f64>,
        #[serde(default)]
        block_size: Option<usize>,
        #[serde(default = "default_true")]
        with_replacement: bool,
    },
}

fn default_true() -> bool {
    true
}

impl ReturnProfileData {
    pub fn to_return_profile(&self) -> ReturnProfile {
        match self {
            ReturnProfileData::None => ReturnProfile::None,
            ReturnProfileData::Fixed { rate } => ReturnProfile::Fixed(*rate),
            ReturnProfileData::PeriodFixed { rate } => ReturnProfile::PeriodFixed(*rate),
            ReturnProfileData::Normal { mean, std_dev } => ReturnProfile::Normal {
                mean: *mean,
                std_dev: *std_dev,
            },
            ReturnProfileData::LogNormal { mean, std_dev } => ReturnProfile::LogNormal {
                mean: *mean,
                std_dev: *std_dev,
            },
            ReturnProfileData::StudentT { mean, scale, df } => ReturnProfile::StudentT {
                mean: *mean,
                scale: *scale,
                df: *df,
            },
            ReturnProfileData::RegimeSwitching {
                bull,
                bear,
                bull_to_bear_prob,
                bear_to_bull_prob,
            } => ReturnProfile::regime_switching(
                bull.to_return_profile(),
                bear.to_return_profile(),
                *bull_to_bear_prob,
                *bear_to_bull_prob,
            ),
            ReturnProfileData::Bootstrap {
                name,
                returns,
                block_size,
                with_replacement,
            } => ReturnProfile::Bootstrap {
                history: HistoricalReturns::new(name.clone(), returns.clone()),
                block_size: *block_size,
                with_replacement: *with_replacement,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InflationData {
    #[default]
    None,
    Fixed {
        rate: f64,
    },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    LogNormal {
        mean: f64,
        std_dev: f64,
    },
}

impl InflationData {
    pub fn to_inflation_profile(&self) -> InflationProfile {
        match *self {
            InflationData::None => InflationProfile::None,
            InflationData::Fixed { rate } => InflationProfile::Fixed(rate),
            InflationData::Normal { mean, std_dev } => InflationProfile::Normal { mean, std_dev },
            InflationData::LogNormal { mean, std_dev } => {
                InflationProfile::LogNormal { mean, std_dev }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaxData {
    #[default]
    None,
    Flat {
        rate: f64,
    },
    Progressive {
        brackets: Vec<TaxBracket>,
    },
    /// Built-in French-style progressive scale
    ProgressivePreset,
}

impl TaxData {
    pub fn to_tax_policy(&self) -> TaxPolicy {
        match self {
            TaxData::None => TaxPolicy::None,
            TaxData::Flat { rate } => TaxPolicy::Flat { rate: *rate },
            TaxData::Progressive { brackets } => TaxPolicy::Progressive {
                brackets: brackets.clone(),
            },
            TaxData::ProgressivePreset => TaxPolicy::progressive_preset(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WithdrawalStrategyData {
    #[default]
    None,
    Fixed {
        amount: f64,
        #[serde(default)]
        inflation_indexed: bool,
    },
    PercentOfBalance {
        rate: f64,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WithdrawalOrderData {
    #[default]
    Declared,
    ProRata,
    Custom {
        buckets: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WithdrawalData {
    #[serde(default)]
    pub strategy: WithdrawalStrategyData,
    #[serde(default)]
    pub start_period: usize,
    #[serde(default)]
    pub order: WithdrawalOrderData,
    #[serde(default)]
    pub allow_debt: bool,
}

impl WithdrawalData {
    pub fn to_withdrawal_policy(&self) -> WithdrawalPolicy {
        let strategy = match self.strategy {
            WithdrawalStrategyData::None => WithdrawalStrategy::None,
            WithdrawalStrategyData::Fixed {
                amount,
                inflation_indexed,
            } => WithdrawalStrategy::Fixed {
                amount,
                inflation_indexed,
            },
            WithdrawalStrategyData::PercentOfBalance { rate } => {
                WithdrawalStrategy::PercentOfBalance { rate }
            }
        };
        let order = match &self.order {
            WithdrawalOrderData::Declared => WithdrawalOrder::Declared,
            WithdrawalOrderData::ProRata => WithdrawalOrder::ProRata,
            WithdrawalOrderData::Custom { buckets } => WithdrawalOrder::Custom(buckets.clone()),
        };
        WithdrawalPolicy {
            strategy,
            start_period: self.start_period,
            order,
            allow_debt: self.allow_debt,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GoalData {
    #[default]
    NoShortfall,
    TerminalBalanceAtLeast {
        target: f64,
    },
    RealTerminalNetWorthAtLeast {
        target: f64,
    },
    All {
        goals: Vec<GoalData>,
    },
}

impl GoalData {
    pub fn to_goal(&self) -> Goal {
        match self {
            GoalData::NoShortfall => Goal::NoShortfall,
            GoalData::TerminalBalanceAtLeast { target } => Goal::TerminalBalanceAtLeast(*target),
            GoalData::RealTerminalNetWorthAtLeast { target } => {
                Goal::RealTerminalNetWorthAtLeast(*target)
            }
            GoalData::All { goals } => Goal::All(goals.iter().map(GoalData::to_goal).collect()),
        }
    }
}

fn default_paths() -> usize {
    1_000
}

fn default_percentiles() -> Vec<f64> {
    vec![10.0, 50.0, 90.0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloData {
    #[serde(default = "default_paths")]
    pub paths: usize,
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    #[serde(default)]
    pub goal: GoalData,
    #[serde(default)]
    pub streaming: bool,
}

impl Default for MonteCarloData {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            percentiles: default_percentiles(),
            goal: GoalData::default(),
            streaming: false,
        }
    }
}

impl Preset {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Engine parameters described by this preset (not yet validated)
    pub fn to_parameters(&self) -> SimulationParameters {
        let mut params = SimulationParameters {
            frequency: self.frequency,
            start_date: self.start_date,
            buckets: self
                .buckets
                .iter()
                .map(|b| {
                    Bucket::new(b.name.clone(), b.balance, b.weight)
                        .with_returns(b.returns.to_return_profile())
                })
                .collect(),
            income: self.income.clone(),
            expenses: self.expenses.clone(),
            contribution: self.contribution.clone(),
            withdrawal: self.withdrawal.to_withdrawal_policy(),
            properties: self.properties.clone(),
            inflation: self.inflation.to_inflation_profile(),
            tax: self.tax.to_tax_policy(),
            rebalance: self.rebalance,
            seed: self.seed,
            ..Default::default()
        };
        if let Some(horizon) = self.horizon {
            params.horizon = horizon;
        } else if let Some(years) = self.years {
            params.horizon = years * self.frequency.periods_per_year() as usize;
        }
        params
    }

    /// Monte Carlo settings from the preset, with command-line overrides applied
    pub fn monte_carlo_config(&self, overrides: &RunOverrides) -> MonteCarloConfig {
        let data = &self.monte_carlo;
        let streaming = overrides.streaming || data.streaming;
        MonteCarloConfig {
            path_count: overrides.paths.unwrap_or(data.paths),
            seed: overrides.seed.unwrap_or(self.seed),
            percentiles: data.percentiles.clone(),
            goal: data.goal.to_goal(),
            accumulator: if streaming {
                AccumulatorKind::Streaming
            } else {
                AccumulatorKind::Batch
            },
            parallel: !overrides.sequential,
            ..Default::default()
        }
    }
}

/// Command-line settings that take precedence over the preset
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub paths: Option<usize>,
    pub seed: Option<u64>,
    pub streaming: bool,
    pub sequential: bool,
}

/// Read and parse a preset file
pub fn load_preset(path: &Path) -> Result<Preset> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read preset {}", path.display()))?;
    Preset::from_yaml(&content)
        .wrap_err_with(|| format!("Failed to parse preset {}", path.display()))
}
