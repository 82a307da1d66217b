use bondstats_core::{MetricVector, StudyConfig};

/// Decides whether a run actually served its offered generation rate
/// ("load-accomplished").
#[derive(Debug, Clone, Copy)]
pub struct SuccessClassifier {
    sim_time: f64,
    throughput_delta_factor: f64,
}

impl SuccessClassifier {
    pub fn new(sim_time: f64, throughput_delta_factor: f64) -> Self {
        Self { sim_time, throughput_delta_factor }
    }

    pub fn from_config(cfg: &StudyConfig) -> Self {
        Self::new(cfg.sim_time, cfg.throughput_delta_factor)
    }

    /// A sample is load-accomplished iff
    /// `|throughput - packets_generated / sim_time| < factor * traffic_load`.
    ///
    /// The left-hand side compares against the *generated* rate while the
    /// tolerance band scales with the *offered* load. Downstream statistics
    /// are defined relative to this exact test, so the asymmetry is kept.
    pub fn is_accomplished(&self, metrics: &MetricVector, traffic_load: u32) -> bool {
        let generated_rate = metrics.packets_generated / self.sim_time;
        (metrics.throughput - generated_rate).abs()
            < self.throughput_delta_factor * f64::from(traffic_load)
    }
}
