use serde::{Deserialize, Serialize};
use crate::error::Result;
use super::{null_as_default, Dependency, QueryBase, QueryKind, QueryObject};

fn default_language() -> String {
    "sql".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArgumentMode {
    In,
    Out,
    Inout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ProcedureArgument {
    pub name: String,
    #[serde(rename = "TYPE")]
    pub arg_type: String,
    #[serde(default)]
    pub mode: Option<ArgumentMode>,
}

impl ProcedureArgument {
    pub fn new(name: impl Into<String>, arg_type: impl Into<String>, mode: Option<ArgumentMode>) -> Self {
        Self {
            name: name.into(),
            arg_type: arg_type.into(),
            mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StoredProcedure {
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
    pub argument_list: Vec<ProcedureArgument>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl StoredProcedure {
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        version: impl Into<String>,
        argument_list: Vec<ProcedureArgument>,
    ) -> Result<Self> {
        Ok(Self {
            base: QueryBase::new(name, query, version)?,
            description: None,
            destination_table: None,
            dependencies: Vec::new(),
            parsing_dependencies: Vec::new(),
            argument_list,
            return_type: None,
            language: default_language(),
        })
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl QueryObject for StoredProcedure {
    const KIND: QueryKind = QueryKind::StoredProcedure;

    fn base(&self) -> &QueryBase {
        &self.base
    }
}
