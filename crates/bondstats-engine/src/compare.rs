use std::collections::BTreeMap;

use bondstats_core::StudyConfig;
use serde::Serialize;
use tracing::info;

use crate::store::AggregationStore;

/// Win counters for one traffic load. In the unconditional regime `draws`
/// stays zero and draws are inferred at report time as
/// `num_scenarios - p1_wins - p2_wins`; the success-aware regime counts
/// them explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadTally {
    pub p1_wins: u32,
    pub p2_wins: u32,
    pub draws: u32,
}

/// The single most lopsided P2 win seen across the whole study: the largest
/// finite ratio `delay_P1 / delay_P2` and the pair that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremeCase {
    pub ratio: f64,
    pub traffic_load: u32,
    pub delay_p1: f64,
    pub delay_p2: f64,
}

/// Pairwise delay comparison between the two designated policies.
#[derive(Debug, Clone)]
pub struct DelayComparison {
    pub p1: u32,
    pub p2: u32,
    /// Per-load tallies over every (scenario, load) pair present for both
    /// policies, regardless of load accomplishment.
    pub unconditional: BTreeMap<u32, LoadTally>,
    /// Per-load tallies where each side's load accomplishment is judged
    /// first: when both succeed the delay threshold decides (with explicit
    /// draws), when exactly one succeeds it wins outright, and when neither
    /// does the pair is uncounted.
    pub success_aware: BTreeMap<u32, LoadTally>,
    pub extreme: Option<ExtremeCase>,
}

/// Classify every (scenario, load) pair present for both configured
/// comparison policies.
pub fn compare_policies(store: &AggregationStore, cfg: &StudyConfig) -> DelayComparison {
    let (p1, p2) = (cfg.compare_p1, cfg.compare_p2);
    let delta = cfg.delay_delta;
    let classifier = store.classifier();

    let mut unconditional = BTreeMap::new();
    let mut success_aware = BTreeMap::new();
    let mut extreme: Option<ExtremeCase> = None;

    for &load in &cfg.traffic_loads {
        let plain = unconditional.entry(load).or_insert(LoadTally::default());
        let aware = success_aware.entry(load).or_insert(LoadTally::default());

        let (Some(bucket1), Some(bucket2)) = (store.bucket(p1, load), store.bucket(p2, load))
        else {
            continue;
        };

        // Sorted ids keep the extreme-case tie behavior deterministic.
        let mut shared: Vec<u32> = bucket1
            .samples()
            .keys()
            .filter(|s| bucket2.samples().contains_key(s))
            .copied()
            .collect();
        shared.sort_unstable();

        for scenario_id in shared {
            let m1 = &bucket1.samples()[&scenario_id];
            let m2 = &bucket2.samples()[&scenario_id];
            let diff = m2.delay - m1.delay;

            // Unconditional regime.
            if diff > delta {
                plain.p1_wins += 1;
            } else if diff < -delta {
                plain.p2_wins += 1;
                let ratio = m1.delay / m2.delay;
                if ratio.is_finite()
                    && extreme.is_none_or(|best| ratio > best.ratio)
                {
                    extreme = Some(ExtremeCase {
                        ratio,
                        traffic_load: load,
                        delay_p1: m1.delay,
                        delay_p2: m2.delay,
                    });
                }
            }

            // Success-aware regime.
            let s1 = classifier.is_accomplished(m1, load);
            let s2 = classifier.is_accomplished(m2, load);
            match (s1, s2) {
                (true, true) => {
                    if diff > delta {
                        aware.p1_wins += 1;
                    } else if diff < -delta {
                        aware.p2_wins += 1;
                    } else {
                        aware.draws += 1;
                    }
                }
                (true, false) => aware.p1_wins += 1,
                (false, true) => aware.p2_wins += 1,
                (false, false) => {}
            }
        }
    }

    if let Some(case) = &extreme {
        info!(
            ratio = case.ratio,
            load = case.traffic_load,
            delay_p1 = case.delay_p1,
            delay_p2 = case.delay_p2,
            "most lopsided win for the second comparison policy"
        );
    }

    DelayComparison { p1, p2, unconditional, success_aware, extreme }
}
