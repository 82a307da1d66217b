use crate::metrics::MetricVector;
use serde::Serialize;

/// One ingested sample: a single simulator run identified by
/// (policy, traffic load, scenario id).
///
/// The pipeline assumes at most one record per identity key; a duplicate
/// overwrites the earlier sample and is logged, not fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    /// Channel-access policy code (e.g. 0, 2, 4, 6 in the default study).
    pub policy: u32,
    /// Offered packet-generation rate level.
    pub traffic_load: u32,
    /// Randomized topology seed this run was simulated under.
    pub scenario_id: u32,
    /// Node count from the description field. Informational only.
    pub node_count: u32,
    pub metrics: MetricVector,
}
