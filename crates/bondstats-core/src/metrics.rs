use serde::Serialize;

/// The metrics one simulator run reports, in wire order.
///
/// All fields are non-negative. `delay` is special: a value of exactly zero
/// means no packet observed delay during the run. It is a sentinel, not a
/// zero-latency measurement, and delay statistics exclude it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricVector {
    pub packets_generated: f64,
    pub avg_packets_generated: f64,
    pub throughput: f64,
    pub rho: f64,
    pub delay: f64,
    pub utilization: f64,
    pub drop_ratio: f64,
}

impl MetricVector {
    /// Number of metric fields a record line carries.
    pub const FIELD_COUNT: usize = 7;

    /// Field-wise sum.
    pub fn add(&self, other: &MetricVector) -> MetricVector {
        MetricVector {
            packets_generated: self.packets_generated + other.packets_generated,
            avg_packets_generated: self.avg_packets_generated + other.avg_packets_generated,
            throughput: self.throughput + other.throughput,
            rho: self.rho + other.rho,
            delay: self.delay + other.delay,
            utilization: self.utilization + other.utilization,
            drop_ratio: self.drop_ratio + other.drop_ratio,
        }
    }

    /// Field-wise difference. Used to retract an overwritten sample's
    /// contribution from a running sum.
    pub fn sub(&self, other: &MetricVector) -> MetricVector {
        MetricVector {
            packets_generated: self.packets_generated - other.packets_generated,
            avg_packets_generated: self.avg_packets_generated - other.avg_packets_generated,
            throughput: self.throughput - other.throughput,
            rho: self.rho - other.rho,
            delay: self.delay - other.delay,
            utilization: self.utilization - other.utilization,
            drop_ratio: self.drop_ratio - other.drop_ratio,
        }
    }
}
