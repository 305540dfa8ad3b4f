use std::fmt;
use indexmap::IndexMap;
use serde_json::Value;
use crate::error::{BqFlowError, Result};
use super::{Entity, VersionMap};

/// One concrete parameter assignment, e.g. `{"language": "fr", "country": "be"}`.
pub type Parameters = IndexMap<String, String>;

/// BigQuery dataset names are limited to 1024 characters.
pub const MAX_NAME_LENGTH: usize = 1024;

/// Appends every parameter value, in map order, to `name`.
pub fn parametrized_name(name: &str, parameters: &Parameters) -> Result<String> {
    if parameters.is_empty() {
        return Ok(name.to_string());
    }

    let mut rendered = name.to_string();
    for value in parameters.values() {
        rendered.push('_');
        rendered.push_str(value);
    }

    if rendered.chars().count() > MAX_NAME_LENGTH {
        return Err(BqFlowError::NameTooLong(format!(
            "'{}...' exceeds {} characters",
            rendered.chars().take(64).collect::<String>(),
            MAX_NAME_LENGTH
        )));
    }
    Ok(rendered)
}

/// An entity rendered once per parameter assignment of a parametrized pipeline.
///
/// Override [`EntityTemplate::get_stage_versions`] to vary stage versions with the
/// parameters; the default ignores them.
pub trait EntityTemplate: fmt::Debug + Send + Sync {
    fn entity(&self) -> &Entity;

    fn name(&self) -> &str {
        &self.entity().name
    }

    fn stages(&self) -> Vec<&str> {
        self.entity().stages()
    }

    fn get_stage_versions(&self, stage: &str, _parameters: &Parameters) -> Result<VersionMap> {
        self.entity().get_stage_versions(stage).cloned()
    }

    fn to_dict(&self, parameters: &Parameters) -> Result<Value> {
        let mut stage_config = IndexMap::new();
        for stage in self.stages() {
            stage_config.insert(stage.to_string(), self.get_stage_versions(stage, parameters)?);
        }
        let entity = self.entity();
        entity.render(&parametrized_name(&entity.name, parameters)?, &stage_config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParametrizedEntity {
    pub entity: Entity,
}

impl ParametrizedEntity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            entity: Entity::new(name, version),
        }
    }

    pub fn base_layer(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            entity: Entity::base_layer(name, version),
        }
    }

    pub fn with_stage_versions<I, K, V>(self, stage: &str, versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Ok(Self {
            entity: self.entity.with_stage_versions(stage, versions)?,
        })
    }
}

impl From<Entity> for ParametrizedEntity {
    fn from(entity: Entity) -> Self {
        Self { entity }
    }
}

impl EntityTemplate for ParametrizedEntity {
    fn entity(&self) -> &Entity {
        &self.entity
    }
}
