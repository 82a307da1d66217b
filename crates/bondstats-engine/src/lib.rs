pub mod compare;
pub mod ingest;
pub mod report;
pub mod stats;
pub mod store;
pub mod success;

pub use compare::{DelayComparison, ExtremeCase, LoadTally, compare_policies};
pub use ingest::{IngestError, ingest_into, parse_line};
pub use stats::{BucketStats, compute_stats};
pub use store::{AggregationBucket, AggregationStore, CompletenessWarning};
pub use success::SuccessClassifier;
