//! Exact and streaming estimators for distribution summaries

/// Linearly interpolated percentile of an ascending slice, `p` in `[0, 100]`.
///
/// Uses rank `p/100 * (n - 1)`. Returns NaN for an empty slice.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = rank - lo as f64;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

/// Running mean / variance (Welford) with min and max
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnlineStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl OnlineStats {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f64).max(0.0).sqrt()
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Observations held exactly before the P² markers take over
const EXACT_BUFFER: usize = 128;

/// P² streaming quantile estimator (Jain & Chlamtac).
///
/// The first `EXACT_BUFFER` observations are kept and answered exactly; the
/// five markers are then seeded from them and memory stays fixed from there
/// on. The outer markers are the exact minimum and maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct P2Quantile {
    /// Target quantile in `[0, 1]`
    p: f64,
    heights: [f64; 5],
    positions: [f64; 5],
    desired: [f64; 5],
    increments: [f64; 5],
    /// Observations seen before the markers are initialized
    warmup: Vec<f64>,
    count: usize,
}

impl P2Quantile {
    /// Estimator for percentile `p` in `[0, 100]`
    #[must_use]
    pub fn new(percentile: f64) -> Self {
        let p = (percentile / 100.0).clamp(0.0, 1.0);
        Self {
            p,
            heights: [0.0; 5],
            positions: [0.0, 1.0, 2.0, 3.0, 4.0],
            desired: [0.0; 5],
            increments: [0.0, p / 2.0, p, (1.0 + p) / 2.0, 1.0],
            warmup: Vec::new(),
            count: 0,
        }
    }

    fn markers_ready(&self) -> bool {
        self.count > EXACT_BUFFER
    }

    /// Place the markers on the buffered sample at the ranks P² would want
    /// after that many observations
    fn seed_markers(&mut self) {
        self.warmup.sort_by(f64::total_cmp);
        let last = self.warmup.len() - 1;
        for (d, inc) in self.desired.iter_mut().zip(&self.increments) {
            *d = inc * last as f64;
        }

        let mut ranks = self.desired.map(|d| d.round() as usize);
        ranks[0] = 0;
        ranks[4] = last;
        // markers need distinct ranks
        for i in 1..4 {
            ranks[i] = ranks[i].max(ranks[i - 1] + 1);
        }
        for i in (1..4).rev() {
            ranks[i] = ranks[i].min(ranks[i + 1] - 1);
        }

        for i in 0..5 {
            self.positions[i] = ranks[i] as f64;
            self.heights[i] = self.warmup[ranks[i]];
        }
        self.warmup = Vec::new();
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        if self.count <= EXACT_BUFFER {
            self.warmup.push(x);
            return;
        }
        if self.count == EXACT_BUFFER + 1 {
            self.seed_markers();
        }

        let q = &mut self.heights;
        let k = if x < q[0] {
            q[0] = x;
            0
        } else if x >= q[4] {
            q[4] = x;
            3
        } else {
            (0..4).find(|&i| x < q[i + 1]).unwrap_or(3)
        };

        for n in &mut self.positions[k + 1..] {
            *n += 1.0;
        }
        for (d, inc) in self.desired.iter_mut().zip(&self.increments) {
            *d += inc;
        }

        for i in 1..4 {
            let n = &self.positions;
            let d = self.desired[i] - n[i];
            if (d >= 1.0 && n[i + 1] - n[i] > 1.0) || (d <= -1.0 && n[i - 1] - n[i] < -1.0) {
                let d = d.signum();
                let candidate = self.parabolic(i, d);
                self.heights[i] = if self.heights[i - 1] < candidate
                    && candidate < self.heights[i + 1]
                {
                    candidate
                } else {
                    self.linear(i, d)
                };
                self.positions[i] += d;
            }
        }
    }

    fn parabolic(&self, i: usize, d: f64) -> f64 {
        let q = &self.heights;
        let n = &self.positions;
        q[i] + d / (n[i + 1] - n[i - 1])
            * ((n[i] - n[i - 1] + d) * (q[i + 1] - q[i]) / (n[i + 1] - n[i])
                + (n[i + 1] - n[i] - d) * (q[i] - q[i - 1]) / (n[i] - n[i - 1]))
    }

    fn linear(&self, i: usize, d: f64) -> f64 {
        let j = if d > 0.0 { i + 1 } else { i - 1 };
        let q = &self.heights;
        let n = &self.positions;
        q[i] + d * (q[j] - q[i]) / (n[j] - n[i])
    }

    /// Current estimate.
    ///
    /// Exact (same rank rule as [`percentile`]) until the buffer overflows;
    /// afterwards the markers are interpolated at the target rank.
    #[must_use]
    pub fn estimate(&self) -> f64 {
        if !self.markers_ready() {
            let mut sorted = self.warmup.clone();
            sorted.sort_by(f64::total_cmp);
            return percentile(&sorted, self.p * 100.0);
        }
        if self.p <= 0.0 {
            return self.heights[0];
        }
        if self.p >= 1.0 {
            return self.heights[4];
        }

        let target = self.desired[2];
        for j in 0..4 {
            if target <= self.positions[j + 1] {
                let span = self.positions[j + 1] - self.positions[j];
                let w = if span > 0.0 {
                    ((target - self.positions[j]) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                return self.heights[j] * (1.0 - w) + self.heights[j + 1] * w;
            }
        }
        self.heights[4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::distr::{Distribution, Uniform};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!(percentile(&[], 50.0).is_nan());
        assert_eq!(percentile(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn test_online_stats() {
        let mut stats = OnlineStats::default();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(x);
        }
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.std_dev() - 2.0).abs() < 1e-12);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
    }

    #[test]
    fn test_p2_exact_during_warmup() {
        let mut est = P2Quantile::new(50.0);
        for x in [3.0, 1.0, 2.0] {
            est.push(x);
        }
        assert_eq!(est.estimate(), 2.0);
    }

    #[test]
    fn test_p2_matches_exact_percentiles_on_small_samples() {
        let values = [100.0, 110.0, 120.0, 130.0, 140.0];
        for (p, expected) in [(10.0, 104.0), (50.0, 120.0), (90.0, 136.0)] {
            let mut est = P2Quantile::new(p);
            for x in values {
                est.push(x);
            }
            assert!((est.estimate() - expected).abs() < 1e-9, "p{p}: {}", est.estimate());
        }

        let mut values: Vec<f64> = (0..10).map(|i| 190.0 - 10.0 * f64::from(i)).collect();
        let mut estimators: Vec<P2Quantile> =
            [10.0, 50.0, 90.0].into_iter().map(P2Quantile::new).collect();
        for &x in &values {
            for est in &mut estimators {
                est.push(x);
            }
        }
        values.sort_by(f64::total_cmp);
        for (est, p) in estimators.iter().zip([10.0, 50.0, 90.0]) {
            assert!((est.estimate() - percentile(&values, p)).abs() < 1e-9);
        }
        assert!((estimators[0].estimate() - 109.0).abs() < 1e-9);
        assert!((estimators[2].estimate() - 181.0).abs() < 1e-9);
    }

    #[test]
    fn test_p2_handles_markers_after_buffer() {
        // ascending input of 0..1000 has exact p-th percentile 9.99 * p
        let mut estimators: Vec<P2Quantile> =
            [1.0, 10.0, 50.0, 90.0, 99.0].into_iter().map(P2Quantile::new).collect();
        for x in 0..1_000 {
            for est in &mut estimators {
                est.push(f64::from(x));
            }
        }
        for (est, p) in estimators.iter().zip([1.0, 10.0, 50.0, 90.0, 99.0]) {
            let exact = 9.99 * p;
            assert!(
                (est.estimate() - exact).abs() < 10.0,
                "p{p}: {} vs {exact}",
                est.estimate()
            );
        }
    }

    #[test]
    fn test_p2_tracks_uniform_quantiles() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let dist = Uniform::new(0.0, 1.0).unwrap();
        let mut estimators: Vec<P2Quantile> =
            [10.0, 50.0, 90.0].into_iter().map(P2Quantile::new).collect();
        for _ in 0..20_000 {
            let x = dist.sample(&mut rng);
            for est in &mut estimators {
                est.push(x);
            }
        }
        for (est, expected) in estimators.iter().zip([0.1, 0.5, 0.9]) {
            assert!(
                (est.estimate() - expected).abs() < 0.02,
                "estimate {} for {}",
                est.estimate(),
                expected
            );
        }
    }

    #[test]
    fn test_p2_extremes_are_exact() {
        let mut low = P2Quantile::new(0.0);
        let mut high = P2Quantile::new(100.0);
        for x in 0..100 {
            low.push(f64::from(x));
            high.push(f64::from(x));
        }
        assert_eq!(low.estimate(), 0.0);
        assert_eq!(high.estimate(), 99.0);
    }
}
