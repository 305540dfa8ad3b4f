//! Versioned query objects: the leaves of an entity.
//!
//! Every object shares a [`QueryBase`] and serializes to a dictionary with
//! SCREAMING_SNAKE_CASE keys plus a `KIND` discriminator. [`Query`] is the sum type
//! stored inside entities and used to read an arbitrary query dictionary back.

mod base;
mod dependency;
mod transformation;
mod view;
mod function;
mod procedure;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use crate::error::{BqFlowError, Result};
use crate::schema::FieldConfig;

pub use base::QueryBase;
pub use dependency::Dependency;
pub use transformation::{
    SchemaUpdateOption, Transformation, WriteDisposition, DEFAULT_SCHEMA_UPDATE_OPTIONS,
    DEFAULT_WRITE_DISPOSITION,
};
pub use view::View;
pub use function::{Argument, Function};
pub use procedure::{ArgumentMode, ProcedureArgument, StoredProcedure};

pub(crate) const KIND_KEY: &str = "KIND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Transformation,
    View,
    Function,
    StoredProcedure,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Transformation => "transformation",
            QueryKind::View => "view",
            QueryKind::Function => "function",
            QueryKind::StoredProcedure => "stored_procedure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transformation" => Some(QueryKind::Transformation),
            "view" => Some(QueryKind::View),
            "function" => Some(QueryKind::Function),
            "stored_procedure" => Some(QueryKind::StoredProcedure),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common behaviour of every query object.
///
/// Implementors only provide [`QueryObject::base`] and their `KIND`; the dictionary
/// round trip comes from their serde derives.
pub trait QueryObject: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug {
    const KIND: QueryKind;

    fn base(&self) -> &QueryBase;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn version(&self) -> &str {
        &self.base().version
    }

    fn validate(&self) -> Result<()> {
        self.base().validate()
    }

    fn to_dict(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        match value.as_object_mut() {
            Some(map) => {
                map.insert(KIND_KEY.to_string(), Value::String(Self::KIND.as_str().to_string()));
            }
            None => {
                return Err(BqFlowError::InvalidDict(format!(
                    "{} did not serialize to an object",
                    Self::KIND
                )))
            }
        }
        Ok(value)
    }

    fn from_dict(value: &Value) -> Result<Self> {
        if let Some(kind) = value.get(KIND_KEY).and_then(Value::as_str) {
            if kind != Self::KIND.as_str() {
                return Err(BqFlowError::InvalidDict(format!(
                    "expected KIND '{}', found '{}'",
                    Self::KIND,
                    kind
                )));
            }
        }
        let object: Self = serde_json::from_value(value.clone())?;
        object.validate()?;
        Ok(object)
    }
}

/// Query objects that declare the columns of the table they produce.
pub trait WithSchema {
    fn schema(&self) -> &[FieldConfig];

    fn get_field(&self, name: &str) -> Option<&FieldConfig> {
        self.schema().iter().find(|f| f.name == name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Transformation(Transformation),
    View(View),
    Function(Function),
    StoredProcedure(StoredProcedure),
}

impl Query {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Transformation(_) => QueryKind::Transformation,
            Query::View(_) => QueryKind::View,
            Query::Function(_) => QueryKind::Function,
            Query::StoredProcedure(_) => QueryKind::StoredProcedure,
        }
    }

    pub fn base(&self) -> &QueryBase {
        match self {
            Query::Transformation(q) => q.base(),
            Query::View(q) => q.base(),
            Query::Function(q) => q.base(),
            Query::StoredProcedure(q) => q.base(),
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn version(&self) -> &str {
        &self.base().version
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Query::Transformation(q) => q.validate(),
            Query::View(q) => q.validate(),
            Query::Function(q) => q.validate(),
            Query::StoredProcedure(q) => q.validate(),
        }
    }

    pub fn dependencies(&self) -> &[Dependency] {
        match self {
            Query::Transformation(q) => &q.dependencies,
            Query::View(q) => &q.dependencies,
            Query::Function(q) => &q.dependencies,
            Query::StoredProcedure(q) => &q.dependencies,
        }
    }

    pub fn to_dict(&self) -> Result<Value> {
        match self {
            Query::Transformation(q) => q.to_dict(),
            Query::View(q) => q.to_dict(),
            Query::Function(q) => q.to_dict(),
            Query::StoredProcedure(q) => q.to_dict(),
        }
    }

    /// Dispatches on `KIND`; a dictionary without one is read as a transformation.
    pub fn from_dict(value: &Value) -> Result<Self> {
        let kind = match value.get(KIND_KEY) {
            None | Some(Value::Null) => QueryKind::Transformation,
            Some(Value::String(s)) => QueryKind::parse(s).ok_or_else(|| {
                BqFlowError::InvalidDict(format!("unknown query KIND '{}'", s))
            })?,
            Some(other) => {
                return Err(BqFlowError::InvalidDict(format!(
                    "KIND must be a string, got {}",
                    other
                )))
            }
        };

        Ok(match kind {
            QueryKind::Transformation => Query::Transformation(Transformation::from_dict(value)?),
            QueryKind::View => Query::View(View::from_dict(value)?),
            QueryKind::Function => Query::Function(Function::from_dict(value)?),
            QueryKind::StoredProcedure => Query::StoredProcedure(StoredProcedure::from_dict(value)?),
        })
    }
}

impl From<Transformation> for Query {
    fn from(q: Transformation) -> Self {
        Query::Transformation(q)
    }
}

impl From<View> for Query {
    fn from(q: View) -> Self {
        Query::View(q)
    }
}

impl From<Function> for Query {
    fn from(q: Function) -> Self {
        Query::Function(q)
    }
}

impl From<StoredProcedure> for Query {
    fn from(q: StoredProcedure) -> Self {
        Query::StoredProcedure(q)
    }
}

/// Reads `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_from_dict_dispatches_on_kind() {
        let view = View::new("v", "SELECT 1", "1.0.0").unwrap();
        let loaded = Query::from_dict(&view.to_dict().unwrap()).unwrap();
        assert_eq!(loaded.kind(), QueryKind::View);
        assert_eq!(loaded, Query::View(view));
    }

    #[test]
    fn test_query_without_kind_is_transformation() {
        let loaded = Query::from_dict(&json!({"QUERY": "SELECT 1", "VERSION": "1.0.0", "NAME": "t"}))
            .unwrap();
        assert_eq!(loaded.kind(), QueryKind::Transformation);
        assert_eq!(loaded.name(), "t");
    }

    #[test]
    fn test_query_unknown_kind() {
        let err = Query::from_dict(&json!({"QUERY": "SELECT 1", "VERSION": "1.0.0", "KIND": "model"}))
            .unwrap_err();
        assert!(matches!(err, BqFlowError::InvalidDict(_)));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let view = View::new("v", "SELECT 1", "1.0.0").unwrap();
        let err = Transformation::from_dict(&view.to_dict().unwrap()).unwrap_err();
        assert!(matches!(err, BqFlowError::InvalidDict(_)));
    }

    #[test]
    fn test_from_dict_validates_version() {
        let err = View::from_dict(&json!({"NAME": "v", "QUERY": "SELECT 1", "VERSION": "one"}))
            .unwrap_err();
        assert!(matches!(err, BqFlowError::InvalidVersion(_)));
    }
}
