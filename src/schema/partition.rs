use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimePartitionType {
    Hour,
    #[default]
    Day,
    Month,
    Year,
}

/// Time-unit or ingestion-time partitioning, shaped like the BigQuery table resource.
/// Without `field` the table is partitioned on ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimePartitioning {
    #[serde(rename = "type", default)]
    pub partition_type: TimePartitionType,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "expirationMs", default)]
    pub expiration_ms: Option<i64>,
}

impl TimePartitioning {
    fn on(field: impl Into<String>, partition_type: TimePartitionType) -> Self {
        Self {
            partition_type,
            field: Some(field.into()),
            expiration_ms: None,
        }
    }

    pub fn day(field: impl Into<String>) -> Self {
        Self::on(field, TimePartitionType::Day)
    }

    pub fn hour(field: impl Into<String>) -> Self {
        Self::on(field, TimePartitionType::Hour)
    }

    pub fn month(field: impl Into<String>) -> Self {
        Self::on(field, TimePartitionType::Month)
    }

    pub fn year(field: impl Into<String>) -> Self {
        Self::on(field, TimePartitionType::Year)
    }

    pub fn ingestion_time(granularity: TimePartitionType) -> Self {
        Self {
            partition_type: granularity,
            field: None,
            expiration_ms: None,
        }
    }

    pub fn with_expiration_ms(mut self, expiration_ms: i64) -> Self {
        self.expiration_ms = Some(expiration_ms);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionRange {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
}

/// Integer-range partitioning on a single INT64 column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangePartitioning {
    pub field: String,
    pub range: PartitionRange,
}

impl RangePartitioning {
    pub fn new(field: impl Into<String>, start: i64, end: i64, interval: i64) -> Self {
        Self {
            field: field.into(),
            range: PartitionRange { start, end, interval },
        }
    }

    /// `None` when the count does not fit in an `i64`.
    pub fn partition_count(&self) -> Option<i64> {
        let PartitionRange { start, end, interval } = self.range;
        if interval <= 0 || end <= start {
            return Some(0);
        }
        let span = i128::from(end) - i128::from(start);
        let interval = i128::from(interval);
        i64::try_from((span + interval - 1) / interval).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_partitioning_day() {
        let config = TimePartitioning::day("date");
        assert_eq!(config.field, Some("date".to_string()));
        assert_eq!(config.partition_type, TimePartitionType::Day);
    }

    #[test]
    fn test_time_partitioning_wire_shape() {
        let config = TimePartitioning::hour("event_ts").with_expiration_ms(86_400_000);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({"type": "HOUR", "field": "event_ts", "expirationMs": 86_400_000})
        );
    }

    #[test]
    fn test_time_partitioning_defaults_to_day() {
        let config: TimePartitioning = serde_json::from_value(json!({"field": "date"})).unwrap();
        assert_eq!(config.partition_type, TimePartitionType::Day);
        assert!(config.expiration_ms.is_none());
    }

    #[test]
    fn test_ingestion_time() {
        let config = TimePartitioning::ingestion_time(TimePartitionType::Month);
        assert!(config.field.is_none());
        assert_eq!(config.partition_type, TimePartitionType::Month);
    }

    #[test]
    fn test_range_partitioning_wire_shape() {
        let config = RangePartitioning::new("customer_id", 0, 100, 10);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({"field": "customer_id", "range": {"start": 0, "end": 100, "interval": 10}})
        );
    }

    #[test]
    fn test_range_partition_count() {
        assert_eq!(RangePartitioning::new("id", 0, 100, 10).partition_count(), Some(10));
        assert_eq!(RangePartitioning::new("id", 0, 101, 10).partition_count(), Some(11));
        assert_eq!(RangePartitioning::new("id", 0, 100, 0).partition_count(), Some(0));
    }

    #[test]
    fn test_range_partition_count_extremes() {
        let full = RangePartitioning::new("id", i64::MIN, i64::MAX, i64::MAX);
        assert_eq!(full.partition_count(), Some(3));
        assert_eq!(RangePartitioning::new("id", i64::MIN, i64::MAX, 1).partition_count(), None);
    }
}
