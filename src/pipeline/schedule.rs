use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use crate::error::{BqFlowError, Result};
use crate::version::{is_valid_version, validate_version};

/// Identifies a pipeline another one is chained after.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineRef {
    pub name: String,
    pub version: String,
}

impl PipelineRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        validate_version(&version)?;
        Ok(Self {
            name: name.into(),
            version,
        })
    }
}

impl fmt::Display for PipelineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_target_pipeline(&self.name, &self.version))
    }
}

pub fn format_target_pipeline(name: &str, version: &str) -> String {
    format!("{}_{}", name, version)
}

/// Splits `<name>_<version>` on its last underscore.
///
/// Semver never contains `_`, so the split is unambiguous whenever the suffix is
/// a valid version; anything else yields `None`.
pub fn parse_target_pipeline(target: &str) -> Option<PipelineRef> {
    let (name, version) = target.rsplit_once('_')?;
    if name.is_empty() || !is_valid_version(version) {
        return None;
    }
    Some(PipelineRef {
        name: name.to_string(),
        version: version.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Cron(String),
    /// Run once the referenced pipeline has completed.
    After(PipelineRef),
}

impl Schedule {
    pub fn cron(expr: impl Into<String>) -> Self {
        Schedule::Cron(expr.into())
    }

    pub fn after(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Ok(Schedule::After(PipelineRef::new(name, version)?))
    }

    /// Cron expressions contain spaces or start with `@`, so they never parse as a
    /// target pipeline.
    pub fn parse(s: &str) -> Self {
        match parse_target_pipeline(s) {
            Some(target) => Schedule::After(target),
            None => Schedule::Cron(s.to_string()),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Schedule::Cron(expr) => expr.clone(),
            Schedule::After(target) => target.to_string(),
        }
    }

    pub fn target(&self) -> Option<&PipelineRef> {
        match self {
            Schedule::After(target) => Some(target),
            Schedule::Cron(_) => None,
        }
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Schedule::parse(&s))
    }
}

impl TryFrom<&str> for PipelineRef {
    type Error = BqFlowError;

    fn try_from(target: &str) -> Result<Self> {
        parse_target_pipeline(target).ok_or_else(|| {
            BqFlowError::InvalidDict(format!("'{}' is not a <name>_<version> pipeline reference", target))
        })
    }
}
