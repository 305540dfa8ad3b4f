use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use crate::error::Result;

/// Reference to a query object (or custom operator) of another entity/stage, used to
/// order execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Dependency {
    pub entity: String,
    pub stage: String,
    pub name: String,
}

impl Dependency {
    pub fn new(entity: impl Into<String>, stage: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            stage: stage.into(),
            name: name.into(),
        }
    }

    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.entity, self.stage, self.name)
    }
}
