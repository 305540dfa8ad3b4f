//! Custom operators injected next to the generated query tasks.
//!
//! The operator itself is built by external code; here it is described by a
//! [`BuilderSignature`] so the declared parameters can be checked up front.

pub mod requirement;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use crate::error::{BqFlowError, Result};
use crate::query::Dependency;

pub use requirement::{parse_requirement, Requirement};

/// Parameters every builder must declare, in this order.
pub const BUILDER_PARAMETERS: [&str; 2] = ["dag", "env"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BuilderSignature {
    /// Import path of the builder, e.g. `plugins.export.build_operator`.
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl BuilderSignature {
    pub fn new(path: impl Into<String>, parameters: &[&str]) -> Self {
        Self {
            path: path.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// A builder declaring the standard `(dag, env)` parameters.
    pub fn standard(path: impl Into<String>) -> Self {
        Self::new(path, &BUILDER_PARAMETERS)
    }

    pub fn validate(&self) -> Result<()> {
        if self.parameters.iter().map(String::as_str).eq(BUILDER_PARAMETERS) {
            Ok(())
        } else {
            Err(BqFlowError::WrongSignature(format!(
                "builder {} declares ({}), expected ({})",
                self.path,
                self.parameters.join(", "),
                BUILDER_PARAMETERS.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CustomCode {
    pub name: String,
    pub version: String,
    pub builder: BuilderSignature,
    #[serde(rename = "DEPENDS_ON", default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub func_kwargs: IndexMap<String, Value>,
    #[serde(default)]
    pub run_before_keyset: bool,
}

impl CustomCode {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        builder: BuilderSignature,
    ) -> Result<Self> {
        let code = Self {
            name: name.into(),
            version: version.into(),
            builder,
            dependencies: Vec::new(),
            requirements: Vec::new(),
            func_kwargs: IndexMap::new(),
            run_before_keyset: false,
        };
        code.validate()?;
        Ok(code)
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Fails on the first line that is not a valid requirement.
    pub fn with_requirements<I, S>(mut self, requirements: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self.validate_requirements()?;
        Ok(self)
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.func_kwargs.insert(key.into(), value.into());
        self
    }

    pub fn with_run_before_keyset(mut self, run_before_keyset: bool) -> Self {
        self.run_before_keyset = run_before_keyset;
        self
    }

    /// `name_version`, the identifier dependencies point at.
    pub fn identifier(&self) -> String {
        format!("{}_{}", self.name, self.version)
    }

    pub fn validate(&self) -> Result<()> {
        self.builder.validate().map_err(|e| match e {
            BqFlowError::WrongSignature(msg) => {
                BqFlowError::WrongSignature(format!("custom code {}: {}", self.identifier(), msg))
            }
            other => other,
        })?;
        self.validate_requirements()
    }

    fn validate_requirements(&self) -> Result<()> {
        for line in &self.requirements {
            let req = parse_requirement(line)?;
            debug!(custom_code = %self.identifier(), requirement = %req.name, "Validated requirement");
        }
        Ok(())
    }

    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(value: &Value) -> Result<Self> {
        let code: Self = serde_json::from_value(value.clone())?;
        code.validate()?;
        Ok(code)
    }
}
