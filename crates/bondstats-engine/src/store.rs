use std::collections::HashMap;

use bondstats_core::{MetricVector, ResultRecord, StudyConfig};
use serde::Serialize;
use tracing::warn;

use crate::success::SuccessClassifier;

/// Aggregation state for one (policy, traffic load) cell.
#[derive(Debug, Clone, Default)]
pub struct AggregationBucket {
    samples: HashMap<u32, MetricVector>,
    sum: MetricVector,
    zero_delay_count: u32,
    success_count: u32,
    success_delay_sum: f64,
}

impl AggregationBucket {
    pub fn samples(&self) -> &HashMap<u32, MetricVector> {
        &self.samples
    }

    pub fn sum(&self) -> &MetricVector {
        &self.sum
    }

    pub fn zero_delay_count(&self) -> u32 {
        self.zero_delay_count
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn success_delay_sum(&self) -> f64 {
        self.success_delay_sum
    }

    fn insert(
        &mut self,
        scenario_id: u32,
        metrics: MetricVector,
        traffic_load: u32,
        classifier: &SuccessClassifier,
    ) {
        if let Some(old) = self.samples.insert(scenario_id, metrics) {
            // Duplicate key: the new sample replaces the old one, so the
            // running sums must drop the old contribution first.
            warn!(scenario_id, traffic_load, "duplicate sample overwritten");
            self.retract(&old, traffic_load, classifier);
        }
        self.sum = self.sum.add(&metrics);
        if metrics.delay == 0.0 {
            self.zero_delay_count += 1;
        }
        if classifier.is_accomplished(&metrics, traffic_load) {
            self.success_count += 1;
            self.success_delay_sum += metrics.delay;
        }
    }

    fn retract(&mut self, old: &MetricVector, traffic_load: u32, classifier: &SuccessClassifier) {
        self.sum = self.sum.sub(old);
        if old.delay == 0.0 {
            self.zero_delay_count -= 1;
        }
        if classifier.is_accomplished(old, traffic_load) {
            self.success_count -= 1;
            self.success_delay_sum -= old.delay;
        }
    }

    /// Sum-reduce a partial bucket into this one. Shards must hold disjoint
    /// scenario ids; merging is how parallel ingestion joins thread-local
    /// buckets before any reader runs.
    pub fn merge(&mut self, other: AggregationBucket) {
        for (scenario_id, metrics) in other.samples {
            let previous = self.samples.insert(scenario_id, metrics);
            debug_assert!(previous.is_none(), "shards must not share scenario ids");
        }
        self.sum = self.sum.add(&other.sum);
        self.zero_delay_count += other.zero_delay_count;
        self.success_count += other.success_count;
        self.success_delay_sum += other.success_delay_sum;
    }
}

/// A bucket whose sample count deviates from the configured scenario count,
/// indicating missing or duplicated input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletenessWarning {
    pub policy: u32,
    pub traffic_load: u32,
    pub samples: u32,
    pub expected: u32,
}

/// All aggregation state of a study, keyed by (policy, traffic load).
/// `insert` is the only mutator in the pipeline; every later stage reads.
pub struct AggregationStore {
    classifier: SuccessClassifier,
    buckets: HashMap<(u32, u32), AggregationBucket>,
}

impl AggregationStore {
    pub fn new(cfg: &StudyConfig) -> Self {
        Self {
            classifier: SuccessClassifier::from_config(cfg),
            buckets: HashMap::new(),
        }
    }

    pub fn classifier(&self) -> &SuccessClassifier {
        &self.classifier
    }

    pub fn insert(&mut self, record: &ResultRecord) {
        self.buckets
            .entry((record.policy, record.traffic_load))
            .or_default()
            .insert(
                record.scenario_id,
                record.metrics,
                record.traffic_load,
                &self.classifier,
            );
    }

    pub fn bucket(&self, policy: u32, traffic_load: u32) -> Option<&AggregationBucket> {
        self.buckets.get(&(policy, traffic_load))
    }

    /// Fold another store (e.g. a per-shard partial) into this one.
    pub fn merge(&mut self, other: AggregationStore) {
        for (key, bucket) in other.buckets {
            match self.buckets.entry(key) {
                std::collections::hash_map::Entry::Occupied(mut e) => e.get_mut().merge(bucket),
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(bucket);
                }
            }
        }
    }

    /// Check every configured (policy, load) cell for the expected sample
    /// count. Deviations are reported, not fatal; statistics over such
    /// buckets are flagged as incomplete in the output.
    pub fn completeness(&self, cfg: &StudyConfig) -> Vec<CompletenessWarning> {
        let mut warnings = Vec::new();
        for policy in &cfg.policies {
            for &load in &cfg.traffic_loads {
                let samples = self
                    .bucket(policy.code, load)
                    .map_or(0, |b| b.samples.len() as u32);
                if samples != cfg.num_scenarios {
                    warn!(
                        policy = %policy.label,
                        load,
                        samples,
                        expected = cfg.num_scenarios,
                        "incomplete aggregation bucket"
                    );
                    warnings.push(CompletenessWarning {
                        policy: policy.code,
                        traffic_load: load,
                        samples,
                        expected: cfg.num_scenarios,
                    });
                }
            }
        }
        warnings
    }

    pub fn is_complete(&self, cfg: &StudyConfig, policy: u32, traffic_load: u32) -> bool {
        self.bucket(policy, traffic_load)
            .is_some_and(|b| b.samples.len() as u32 == cfg.num_scenarios)
    }
}
