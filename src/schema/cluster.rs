use serde::{Deserialize, Serialize};
use crate::error::{BqFlowError, Result};

pub const MAX_CLUSTER_FIELDS: usize = 4;

/// Ordered clustering columns. Serialized as a plain list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct ClusterConfig {
    pub fields: Vec<String>,
}

impl ClusterConfig {
    pub fn new(fields: Vec<String>) -> Result<Self> {
        let config = Self { fields };
        config.validate()?;
        Ok(config)
    }

    pub fn from_fields(fields: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let fields: Vec<String> = fields.into_iter().map(|f| f.into()).collect();
        Self::new(fields)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.len() > MAX_CLUSTER_FIELDS {
            return Err(BqFlowError::Cluster(format!(
                "BigQuery supports maximum {} clustering fields, got {}",
                MAX_CLUSTER_FIELDS,
                self.fields.len()
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
