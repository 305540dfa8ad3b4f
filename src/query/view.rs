use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::schema::FieldConfig;
use super::{null_as_default, Dependency, QueryBase, QueryKind, QueryObject, WithSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct View {
    #[serde(flatten)]
    pub base: QueryBase,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub destination_table: Option<String>,
    #[serde(rename = "DEPENDS_ON", default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<Dependency>,
    #[serde(rename = "PARSING_DEPENDS_ON", default, deserialize_with = "null_as_default")]
    pub parsing_dependencies: Vec<Dependency>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: Vec<FieldConfig>,
    #[serde(default)]
    pub force_cache_refresh: bool,
}

impl View {
    pub fn new(name: impl Into<String>, query: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base: QueryBase::new(name, query, version)?,
            description: None,
            destination_table: None,
            dependencies: Vec::new(),
            parsing_dependencies: Vec::new(),
            schema: Vec::new(),
            force_cache_refresh: false,
        })
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_destination_table(mut self, table: impl Into<String>) -> Self {
        self.destination_table = Some(table.into());
        self
    }

    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.base.encrypt = Some(encrypt);
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.base.is_static = is_static;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_parsing_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.parsing_dependencies = dependencies;
        self
    }

    pub fn with_schema(mut self, schema: Vec<FieldConfig>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_force_cache_refresh(mut self, force: bool) -> Self {
        self.force_cache_refresh = force;
        self
    }
}

impl QueryObject for View {
    const KIND: QueryKind = QueryKind::View;

    fn base(&self) -> &QueryBase {
        &self.base
    }
}

impl WithSchema for View {
    fn schema(&self) -> &[FieldConfig] {
        &self.schema
    }
}
