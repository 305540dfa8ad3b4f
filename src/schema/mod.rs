mod field;
mod partition;
mod cluster;

pub use field::{BqType, FieldConfig, FieldMode};
pub use partition::{PartitionRange, RangePartitioning, TimePartitionType, TimePartitioning};
pub use cluster::{ClusterConfig, MAX_CLUSTER_FIELDS};
