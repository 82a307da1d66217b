use bondstats_core::{MetricVector, StudyConfig};

use crate::store::{AggregationBucket, AggregationStore};
use crate::success::SuccessClassifier;

/// Finalized statistics for one (policy, traffic load) cell. Everything the
/// report emitters print comes from here; they never recompute.
#[derive(Debug, Clone)]
pub struct BucketStats {
    pub policy: u32,
    pub traffic_load: u32,
    /// Samples actually ingested for this cell.
    pub sample_count: u32,
    /// Per-field means; delay uses the nonzero-delay denominator.
    pub averages: MetricVector,
    /// Sample std-dev of delay over samples with delay > 0, against the
    /// averaged delay. NaN when fewer than two such samples.
    pub delay_std: f64,
    pub success_count: u32,
    pub success_rate_percent: f64,
    /// Mean delay over load-accomplished samples. NaN when none succeeded.
    pub success_mean_delay: f64,
    /// Population std-dev of delay over load-accomplished samples, against
    /// `success_mean_delay`. NaN when none succeeded.
    pub success_delay_std: f64,
    /// False when the cell holds a sample count other than the configured
    /// scenario count; such averages are diluted and flagged in reports.
    pub complete: bool,
}

/// Per-field means over a bucket. Every field divides by the configured
/// scenario count except delay, which divides by the number of samples that
/// observed a delay at all; zero-delay sentinels must not dilute it.
pub fn average_metrics(bucket: &AggregationBucket, num_scenarios: u32) -> MetricVector {
    let n = f64::from(num_scenarios);
    let sum = bucket.sum();
    let delay_denominator = i64::from(num_scenarios) - i64::from(bucket.zero_delay_count());
    let average_delay = if delay_denominator > 0 {
        sum.delay / delay_denominator as f64
    } else {
        f64::NAN
    };
    MetricVector {
        packets_generated: sum.packets_generated / n,
        avg_packets_generated: sum.avg_packets_generated / n,
        throughput: sum.throughput / n,
        rho: sum.rho / n,
        delay: average_delay,
        utilization: sum.utilization / n,
        drop_ratio: sum.drop_ratio / n,
    }
}

/// Whole-population delay dispersion: Bessel-corrected std-dev over samples
/// with delay > 0, against the reducer's average delay.
pub fn delay_std_nonzero(
    bucket: &AggregationBucket,
    average_delay: f64,
    num_scenarios: u32,
) -> f64 {
    let count_nonzero = i64::from(num_scenarios) - i64::from(bucket.zero_delay_count());
    if count_nonzero <= 1 {
        return f64::NAN;
    }
    let numerator: f64 = bucket
        .samples()
        .values()
        .filter(|m| m.delay > 0.0)
        .map(|m| (m.delay - average_delay).powi(2))
        .sum();
    (numerator / (count_nonzero - 1) as f64).sqrt()
}

/// Success-conditioned delay dispersion: population std-dev over
/// load-accomplished samples, against the success-conditioned mean.
///
/// The two dispersion series intentionally differ in both sample set
/// (nonzero-delay vs. load-accomplished) and normalization (N-1 vs. N);
/// reported values are defined relative to these exact formulas.
pub fn delay_std_success(
    bucket: &AggregationBucket,
    classifier: &SuccessClassifier,
    traffic_load: u32,
) -> f64 {
    if bucket.success_count() == 0 {
        return f64::NAN;
    }
    let mean = bucket.success_delay_sum() / f64::from(bucket.success_count());
    let numerator: f64 = bucket
        .samples()
        .values()
        .filter(|m| classifier.is_accomplished(m, traffic_load))
        .map(|m| (m.delay - mean).powi(2))
        .sum();
    (numerator / f64::from(bucket.success_count())).sqrt()
}

/// Reduce the whole store into per-cell statistics, in configuration order
/// (policies outer, loads inner). Cells never ingested yield zeroed sums,
/// NaN delay statistics and an incomplete flag.
pub fn compute_stats(store: &AggregationStore, cfg: &StudyConfig) -> Vec<BucketStats> {
    let empty = AggregationBucket::default();
    let mut stats = Vec::with_capacity(cfg.policies.len() * cfg.traffic_loads.len());
    for policy in &cfg.policies {
        for &load in &cfg.traffic_loads {
            let bucket = store.bucket(policy.code, load).unwrap_or(&empty);
            let averages = average_metrics(bucket, cfg.num_scenarios);
            let success_count = bucket.success_count();
            let success_mean_delay = if success_count > 0 {
                bucket.success_delay_sum() / f64::from(success_count)
            } else {
                f64::NAN
            };
            stats.push(BucketStats {
                policy: policy.code,
                traffic_load: load,
                sample_count: bucket.samples().len() as u32,
                delay_std: delay_std_nonzero(bucket, averages.delay, cfg.num_scenarios),
                averages,
                success_count,
                success_rate_percent: f64::from(success_count) * 100.0
                    / f64::from(cfg.num_scenarios),
                success_mean_delay,
                success_delay_std: delay_std_success(bucket, store.classifier(), load),
                complete: store.is_complete(cfg, policy.code, load),
            });
        }
    }
    stats
}

/// Lookup helper for emitters that print one row per load with one column
/// per policy.
pub fn stats_for<'a>(
    stats: &'a [BucketStats],
    policy: u32,
    traffic_load: u32,
) -> Option<&'a BucketStats> {
    stats
        .iter()
        .find(|s| s.policy == policy && s.traffic_load == traffic_load)
}
