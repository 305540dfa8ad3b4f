use serde::{Deserialize, Serialize};
use crate::error::Result;
use super::{null_as_default, Dependency, QueryBase, QueryKind, QueryObject};

fn default_language() -> String {
    "sql".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Argument {
    pub name: String,
    /// SQL type, e.g. `STRING` or `ARRAY<INT64>`.
    #[serde(rename = "TYPE")]
    pub arg_type: String,
}

impl Argument {
    pub fn new(name: impl Into<String>, arg_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg_type: arg_type.into(),
        }
    }
}

/// A user-defined function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Function {
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
    pub argument_list: Vec<Argument>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        version: impl Into<String>,
        argument_list: Vec<Argument>,
        return_type: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            base: QueryBase::new(name, query, version)?,
            description: None,
            destination_table: None,
            dependencies: Vec::new(),
            parsing_dependencies: Vec::new(),
            argument_list,
            return_type,
            language: default_language(),
        })
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.base.is_static = is_static;
        self
    }

    pub fn with_destination_data_mart(mut self, alias: impl Into<String>) -> Self {
        self.base.destination_data_mart = Some(alias.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl QueryObject for Function {
    const KIND: QueryKind = QueryKind::Function;

    fn base(&self) -> &QueryBase {
        &self.base
    }
}
