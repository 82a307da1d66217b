pub mod config;
pub mod metrics;
pub mod record;

pub use config::{ConfigError, PolicySpec, StudyConfig};
pub use metrics::MetricVector;
pub use record::ResultRecord;
