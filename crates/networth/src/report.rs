//! Plain-text and JSON rendering of simulation results

use std::fmt::Write;

use networth_core::config::SimulationParameters;
use networth_core::model::{DistributionSummary, MonteCarloResult, OutcomeStatistics, Trajectory};
use serde::Serialize;

/// Label for period `k`: its calendar date when the parameters carry a start
/// date, otherwise the period number
pub fn period_label(params: &SimulationParameters, k: usize) -> String {
    params
        .period_date(k)
        .map_or_else(|| format!("P{k}"), |date| date.to_string())
}

fn summary_row(out: &mut String, label: &str, summary: &DistributionSummary) {
    let _ = write!(
        out,
        "{label:<20} {:>14.0} {:>14.0} {:>14.0} {:>14.0}",
        summary.mean, summary.std_dev, summary.min, summary.max
    );
    for (_, value) in &summary.percentiles {
        let _ = write!(out, " {value:>14.0}");
    }
    out.push('\n');
}

/// Render aggregated statistics as a text report.
///
/// `band_step` controls how many periods separate printed band rows; the
/// terminal period is always printed.
pub fn render_statistics(
    params: &SimulationParameters,
    stats: &OutcomeStatistics,
    band_step: usize,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} paths over {} periods ({:?})",
        stats.path_count, stats.horizon, params.frequency
    );
    let _ = writeln!(out, "Success rate:          {:>6.1}%", stats.success_rate * 100.0);
    let _ = writeln!(
        out,
        "Shortfall probability: {:>6.1}%",
        stats.shortfall_probability * 100.0
    );
    out.push('\n');

    let _ = write!(
        out,
        "{:<20} {:>14} {:>14} {:>14} {:>14}",
        "", "mean", "std dev", "min", "max"
    );
    for p in &stats.percentiles {
        let _ = write!(out, " {:>14}", format!("p{p}"));
    }
    out.push('\n');
    summary_row(&mut out, "Terminal balance", &stats.terminal_balance);
    summary_row(&mut out, "Terminal net worth", &stats.terminal_net_worth);
    summary_row(&mut out, "Lowest balance", &stats.min_balance);
    out.push('\n');

    let _ = write!(out, "{:<12} {:>14}", "period", "mean");
    for p in &stats.percentiles {
        let _ = write!(out, " {:>14}", format!("p{p}"));
    }
    let _ = writeln!(out, " {:>10}", "short %");

    let step = band_step.max(1);
    let last = stats.bands.len().saturating_sub(1);
    for band in stats
        .bands
        .iter()
        .filter(|b| b.period % step == 0 || b.period == last)
    {
        let _ = write!(
            out,
            "{:<12} {:>14.0}",
            period_label(params, band.period),
            band.mean
        );
        for value in &band.values {
            let _ = write!(out, " {value:>14.0}");
        }
        let rate = stats
            .shortfall_rate_by_period
            .get(band.period)
            .copied()
            .unwrap_or(0.0);
        let _ = writeln!(out, " {:>9.1}%", rate * 100.0);
    }
    out
}

/// Render one trajectory period by period
pub fn render_trajectory(params: &SimulationParameters, trajectory: &Trajectory) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>14} {:>14} {:>14} {:>12} {:>12}",
        "period", "balance", "net worth", "real", "cash flow", "shortfall"
    );
    for state in trajectory.states() {
        let shortfall = state
            .shortfall
            .map_or_else(String::new, |event| format!("{:.0}", event.unmet));
        let _ = writeln!(
            out,
            "{:<12} {:>14.0} {:>14.0} {:>14.0} {:>12.0} {:>12}",
            period_label(params, state.period),
            state.total_balance(),
            state.net_worth(),
            state.real_net_worth(),
            state.net_cash_flow,
            shortfall
        );
    }
    let _ = writeln!(
        out,
        "\nLowest balance {:.0}, max drawdown {:.1}%, {} shortfall period(s)",
        trajectory.min_balance(),
        trajectory.max_drawdown() * 100.0,
        trajectory.shortfalls().count()
    );
    out
}

/// Sample trajectory rendered for JSON export
#[derive(Debug, Serialize)]
struct SamplePath<'a> {
    index: usize,
    labels: Vec<String>,
    balances: Vec<f64>,
    net_worth: Vec<f64>,
    shortfall_periods: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    states: Option<&'a Trajectory>,
}

#[derive(Debug, Serialize)]
struct MonteCarloReport<'a> {
    name: &'a str,
    statistics: &'a OutcomeStatistics,
    sample_paths: Vec<SamplePath<'a>>,
}

/// Monte Carlo result as pretty-printed JSON
pub fn monte_carlo_json(
    name: &str,
    params: &SimulationParameters,
    result: &MonteCarloResult,
) -> serde_json::Result<String> {
    let report = MonteCarloReport {
        name,
        statistics: &result.statistics,
        sample_paths: result
            .sample_paths
            .iter()
            .enumerate()
            .map(|(index, t)| SamplePath {
                index,
                labels: (0..t.len()).map(|k| period_label(params, k)).collect(),
                balances: t.balances().collect(),
                net_worth: t.states().iter().map(|s| s.net_worth()).collect(),
                shortfall_periods: t.shortfall_periods(),
                states: None,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// Single trajectory as pretty-printed JSON, including the full states
pub fn trajectory_json(
    params: &SimulationParameters,
    trajectory: &Trajectory,
) -> serde_json::Result<String> {
    let path = SamplePath {
        index: 0,
        labels: (0..trajectory.len())
            .map(|k| period_label(params, k))
            .collect(),
        balances: trajectory.balances().collect(),
        net_worth: trajectory.states().iter().map(|s| s.net_worth()).collect(),
        shortfall_periods: trajectory.shortfall_periods(),
        states: Some(trajectory),
    };
    serde_json::to_string_pretty(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use networth_core::model::{Bucket, CashFlowStream, PeriodFrequency, ReturnProfile};
    use networth_core::{aggregate, simulate};

    fn params() -> SimulationParameters {
        SimulationParameters {
            horizon: 3,
            buckets: vec![
                Bucket::new("Savings", 1_000.0, 1.0).with_returns(ReturnProfile::PeriodFixed(0.0)),
            ],
            expenses: vec![CashFlowStream::new("Rent", 400.0)],
            ..Default::default()
        }
    }

    #[test]
    fn test_period_labels() {
        let mut params = params();
        assert_eq!(period_label(&params, 2), "P2");

        params.frequency = PeriodFrequency::Monthly;
        params.start_date = Some(jiff::civil::date(2025, 11, 1));
        assert_eq!(period_label(&params, 2), "2026-01-01");
    }

    #[test]
    fn test_trajectory_report_marks_shortfall() {
        let params = params();
        let trajectory = simulate(&params, 0).unwrap();
        let text = render_trajectory(&params, &trajectory);

        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("period"));
        assert!(lines[1].starts_with("P0"));
        // 1000 - 400 - 400 leaves 200, so the third period is 200 short
        assert_eq!(lines[3].split_whitespace().count(), 5);
        assert_eq!(
            lines[4].split_whitespace().collect::<Vec<_>>(),
            vec!["P3", "0", "0", "0", "-400", "200"]
        );
        assert!(text.contains("1 shortfall period(s)"));
    }

    #[test]
    fn test_statistics_report_lists_every_step() {
        let params = params();
        let stats = aggregate(&params, 10, 1).unwrap();
        let text = render_statistics(&params, &stats, 2);

        assert!(text.contains("10 paths over 3 periods"));
        assert!(text.contains("Shortfall probability:  100.0%"));
        // periods 0 and 2 by step, 3 as the terminal period
        let rows = text
            .lines()
            .filter(|l| l.starts_with('P'))
            .map(|l| l.split_whitespace().next().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(rows, vec!["P0", "P2", "P3"]);
    }

    #[test]
    fn test_json_export() {
        let params = params();
        let trajectory = simulate(&params, 0).unwrap();
        let json = trajectory_json(&params, &trajectory).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["balances"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["shortfall_periods"], serde_json::json!([2]));
        assert!(value["states"]["states"].is_array());
        assert_eq!(value["states"]["states"][1]["net_cash_flow"], -400.0);
    }
}
