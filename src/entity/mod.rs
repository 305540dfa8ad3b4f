//! Entities group versioned query objects by pipeline stage.
//!
//! A free-form entity accepts any stage name, in insertion order. A base-layer
//! entity has the fixed [`BASE_LAYER_STAGES`] and nothing else; unset stages
//! resolve to an empty version map.

mod parametrized;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use crate::custom_code::CustomCode;
use crate::error::{BqFlowError, Result};
use crate::pipeline::PipelineKind;
use crate::query::{Function, Query, StoredProcedure, Transformation, View};

pub use parametrized::{
    parametrized_name, EntityTemplate, Parameters, ParametrizedEntity, MAX_NAME_LENGTH,
};

pub type VersionMap = IndexMap<String, String>;

pub const BASE_LAYER_STAGES: [&str; 5] = [
    "datalake",
    "preamble",
    "staging",
    "data_warehouse",
    "data_mart",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLayout {
    #[default]
    FreeForm,
    BaseLayer,
}

impl StageLayout {
    /// The only stages allowed by this layout, `None` when any name is accepted.
    pub fn fixed_stages(&self) -> Option<&'static [&'static str]> {
        match self {
            StageLayout::FreeForm => None,
            StageLayout::BaseLayer => Some(&BASE_LAYER_STAGES),
        }
    }
}

/// Read access to the per-stage query versions of an entity.
pub trait StageConfigProvider {
    fn stages(&self) -> Vec<&str>;
    fn get_stage_versions(&self, stage: &str) -> Result<&VersionMap>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub version: String,
    pub kind: Option<PipelineKind>,
    layout: StageLayout,
    stage_config: IndexMap<String, VersionMap>,
    transformations: IndexMap<String, IndexMap<String, Query>>,
    custom_operators: IndexMap<String, Vec<CustomCode>>,
}

impl Entity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_layout(name, version, StageLayout::FreeForm)
    }

    /// Entity restricted to the five base-layer stages.
    pub fn base_layer(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_layout(name, version, StageLayout::BaseLayer)
    }

    pub fn with_layout(name: impl Into<String>, version: impl Into<String>, layout: StageLayout) -> Self {
        let stage_config = layout
            .fixed_stages()
            .unwrap_or_default()
            .iter()
            .map(|s| (s.to_string(), VersionMap::new()))
            .collect();

        Self {
            name: name.into(),
            version: version.into(),
            kind: None,
            layout,
            stage_config,
            transformations: IndexMap::new(),
            custom_operators: IndexMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: PipelineKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_stage_versions<I, K, V>(mut self, stage: &str, versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let versions = versions.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.set_stage_versions(stage, versions)?;
        Ok(self)
    }

    pub fn with_stage_config(mut self, stage_config: IndexMap<String, VersionMap>) -> Result<Self> {
        for (stage, versions) in stage_config {
            self.set_stage_versions(&stage, versions)?;
        }
        Ok(self)
    }

    /// Replaces the version map of `stage`.
    pub fn set_stage_versions(&mut self, stage: &str, versions: VersionMap) -> Result<()> {
        self.check_stage(stage)?;
        self.stage_config.insert(stage.to_string(), versions);
        Ok(())
    }

    pub fn layout(&self) -> StageLayout {
        self.layout
    }

    pub fn is_base_layer(&self) -> bool {
        self.layout == StageLayout::BaseLayer
    }

    pub fn stages(&self) -> Vec<&str> {
        self.stage_config.keys().map(String::as_str).collect()
    }

    pub fn get_stage_versions(&self, stage: &str) -> Result<&VersionMap> {
        self.stage_config.get(stage).ok_or_else(|| {
            BqFlowError::StageNotFound(format!("stage '{}' not found in entity '{}'", stage, self.name))
        })
    }

    pub fn stage_config(&self) -> &IndexMap<String, VersionMap> {
        &self.stage_config
    }

    pub fn transformations(&self) -> &IndexMap<String, IndexMap<String, Query>> {
        &self.transformations
    }

    pub fn get_query(&self, stage: &str, name: &str) -> Option<&Query> {
        self.transformations.get(stage)?.get(name)
    }

    pub fn custom_operators(&self) -> &IndexMap<String, Vec<CustomCode>> {
        &self.custom_operators
    }

    pub fn add_transformation(&mut self, stage: &str, transformation: Transformation) -> Result<()> {
        self.add_query(stage, transformation)
    }

    pub fn add_view(&mut self, stage: &str, view: View) -> Result<()> {
        self.add_query(stage, view)
    }

    pub fn add_function(&mut self, stage: &str, function: Function) -> Result<()> {
        self.add_query(stage, function)
    }

    pub fn add_stored_procedure(&mut self, stage: &str, procedure: StoredProcedure) -> Result<()> {
        self.add_query(stage, procedure)
    }

    /// Attaches a query object and records its version in the stage config.
    ///
    /// Names are unique per stage across all query kinds.
    pub fn add_query(&mut self, stage: &str, query: impl Into<Query>) -> Result<()> {
        let query = query.into();
        let name = query.name().to_string();
        let version = query.version().to_string();
        let kind = query.kind();
        self.attach_query(stage, query)?;

        debug!(entity = %self.name, stage = %stage, kind = %kind, name = %name, "Attached query object");
        self.stage_config
            .entry(stage.to_string())
            .or_default()
            .insert(name, version);
        Ok(())
    }

    /// Stores the object without touching the stage config.
    fn attach_query(&mut self, stage: &str, query: Query) -> Result<()> {
        self.check_stage(stage)?;

        let queries = self.transformations.entry(stage.to_string()).or_default();
        if queries.contains_key(query.name()) {
            return Err(BqFlowError::ConflictingName(format!(
                "'{}' already exists in stage '{}' of entity '{}'",
                query.name(),
                stage,
                self.name
            )));
        }
        queries.insert(query.name().to_string(), query);
        Ok(())
    }

    pub fn add_custom_operator(&mut self, stage: &str, code: CustomCode) -> Result<()> {
        self.check_stage(stage)?;
        debug!(entity = %self.name, stage = %stage, operator = %code.identifier(), "Attached custom operator");
        self.custom_operators.entry(stage.to_string()).or_default().push(code);
        Ok(())
    }

    fn check_stage(&self, stage: &str) -> Result<()> {
        match self.layout.fixed_stages() {
            Some(stages) if !stages.iter().any(|s| *s == stage) => {
                Err(BqFlowError::StageNotFound(format!(
                    "'{}' is not one of the stages ({}) of entity '{}'",
                    stage,
                    stages.join(", "),
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn to_dict(&self) -> Result<Value> {
        self.render(&self.name, &self.stage_config)
    }

    /// Dictionary form with a substituted name and stage config; used by templates.
    pub(crate) fn render(&self, name: &str, stage_config: &IndexMap<String, VersionMap>) -> Result<Value> {
        let mut transformations = Vec::with_capacity(self.transformations.len());
        for (stage, queries) in &self.transformations {
            transformations.push(StageQueries {
                name: stage.clone(),
                queries: queries.values().map(Query::to_dict).collect::<Result<_>>()?,
            });
        }

        let dict = EntityDict {
            name: name.to_string(),
            version: self.version.clone(),
            kind: self.kind,
            layout: self.layout,
            stage_config: stage_config
                .iter()
                .map(|(stage, versions)| StageVersions {
                    name: stage.clone(),
                    versions: versions.clone(),
                })
                .collect(),
            transformations,
            custom_operators: self
                .custom_operators
                .iter()
                .map(|(stage, operators)| StageOperators {
                    name: stage.clone(),
                    operators: operators.clone(),
                })
                .collect(),
        };
        Ok(serde_json::to_value(dict)?)
    }

    /// Uses the `layout` key when present, free-form otherwise.
    pub fn from_dict(value: &Value) -> Result<Self> {
        Self::from_dict_with_layout(value, None)
    }

    pub fn from_dict_base_layer(value: &Value) -> Result<Self> {
        Self::from_dict_with_layout(value, Some(StageLayout::BaseLayer))
    }

    fn from_dict_with_layout(value: &Value, layout: Option<StageLayout>) -> Result<Self> {
        let dict: EntityDict = serde_json::from_value(value.clone())?;
        let layout = layout.unwrap_or(dict.layout);
        let mut entity = Self::with_layout(dict.name, dict.version, layout);
        entity.kind = dict.kind;

        for stage in dict.stage_config {
            entity.set_stage_versions(&stage.name, stage.versions)?;
        }
        // stage_config wins over the versions of the attached objects.
        for stage in dict.transformations {
            for query in &stage.queries {
                entity.attach_query(&stage.name, Query::from_dict(query)?)?;
            }
        }
        for stage in dict.custom_operators {
            for code in stage.operators {
                code.validate()?;
                entity.add_custom_operator(&stage.name, code)?;
            }
        }
        Ok(entity)
    }
}

impl StageConfigProvider for Entity {
    fn stages(&self) -> Vec<&str> {
        Entity::stages(self)
    }

    fn get_stage_versions(&self, stage: &str) -> Result<&VersionMap> {
        Entity::get_stage_versions(self, stage)
    }
}

#[derive(Serialize, Deserialize)]
struct EntityDict {
    name: String,
    version: String,
    #[serde(default)]
    kind: Option<PipelineKind>,
    #[serde(default, skip_serializing_if = "is_free_form")]
    layout: StageLayout,
    #[serde(default)]
    stage_config: Vec<StageVersions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    transformations: Vec<StageQueries>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    custom_operators: Vec<StageOperators>,
}

fn is_free_form(layout: &StageLayout) -> bool {
    *layout == StageLayout::FreeForm
}

#[derive(Serialize, Deserialize)]
struct StageVersions {
    name: String,
    #[serde(default)]
    versions: VersionMap,
}

#[derive(Serialize, Deserialize)]
struct StageQueries {
    name: String,
    queries: Vec<Value>,
}

#[derive(Serialize, Deserialize)]
struct StageOperators {
    name: String,
    operators: Vec<CustomCode>,
}
