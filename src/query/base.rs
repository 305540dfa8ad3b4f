use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::version::validate_version;

fn default_static() -> bool {
    true
}

/// Fields shared by every query object. Flattened into each object's dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct QueryBase {
    #[serde(default)]
    pub name: String,
    pub query: String,
    pub version: String,
    #[serde(default)]
    pub encrypt: Option<bool>,
    /// When false the version is appended to the generated table name.
    #[serde(rename = "STATIC", default = "default_static")]
    pub is_static: bool,
    #[serde(default)]
    pub destination_data_mart: Option<String>,
}

impl QueryBase {
    pub fn new(name: impl Into<String>, query: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let base = Self {
            name: name.into(),
            query: query.into(),
            version: version.into(),
            encrypt: None,
            is_static: true,
            destination_data_mart: None,
        };
        base.validate()?;
        Ok(base)
    }

    pub fn validate(&self) -> Result<()> {
        validate_version(&self.version)
    }

    /// Name of the table the object writes to: `name` when static, otherwise
    /// `name_<major>_<minor>_<patch>`.
    pub fn table_name(&self) -> String {
        if self.is_static {
            self.name.clone()
        } else {
            format!("{}_{}", self.name, self.version.replace(['.', '-', '+'], "_"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BqFlowError;

    #[test]
    fn test_new_validates_version() {
        assert!(QueryBase::new("q", "SELECT 1", "1.0.0").is_ok());
        let err = QueryBase::new("q", "SELECT 1", "1.0").unwrap_err();
        assert!(matches!(err, BqFlowError::InvalidVersion(_)));
    }

    #[test]
    fn test_table_name() {
        let mut base = QueryBase::new("orders", "SELECT 1", "1.2.0").unwrap();
        assert_eq!(base.table_name(), "orders");
        base.is_static = false;
        assert_eq!(base.table_name(), "orders_1_2_0");
    }
}
