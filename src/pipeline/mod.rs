//! Pipelines: the schedulable aggregate of entities.

mod parametrized;
mod schedule;
mod start_time;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use crate::entity::{Entity, EntityTemplate, Parameters, ParametrizedEntity};
use crate::error::Result;
use crate::trigger::Trigger;
use crate::version::validate_version;

pub use parametrized::ParametrizedPipeline;
pub use schedule::{format_target_pipeline, parse_target_pipeline, PipelineRef, Schedule};
pub use start_time::{StartTime, START_TIME_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    #[default]
    Vanilla,
    DeltaTracking,
    DataVault,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Vanilla => "vanilla",
            PipelineKind::DeltaTracking => "delta_tracking",
            PipelineKind::DataVault => "data_vault",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity as held by a pipeline.
///
/// Entities are shared, not copied, between the pipelines unrolled from one
/// parametrized definition.
#[derive(Debug, Clone)]
pub enum PipelineEntity {
    Static(Arc<Entity>),
    Parametrized(Arc<dyn EntityTemplate>),
}

impl PipelineEntity {
    pub fn template(template: impl EntityTemplate + 'static) -> Self {
        PipelineEntity::Parametrized(Arc::new(template))
    }

    pub fn name(&self) -> &str {
        match self {
            PipelineEntity::Static(entity) => &entity.name,
            PipelineEntity::Parametrized(template) => template.name(),
        }
    }

    pub fn is_parametrized(&self) -> bool {
        matches!(self, PipelineEntity::Parametrized(_))
    }

    pub fn to_dict(&self, parameters: &Parameters) -> Result<Value> {
        match self {
            PipelineEntity::Static(entity) => entity.to_dict(),
            PipelineEntity::Parametrized(template) => template.to_dict(parameters),
        }
    }
}

impl PartialEq for PipelineEntity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PipelineEntity::Static(a), PipelineEntity::Static(b)) => a == b,
            (PipelineEntity::Parametrized(a), PipelineEntity::Parametrized(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Entity> for PipelineEntity {
    fn from(entity: Entity) -> Self {
        PipelineEntity::Static(Arc::new(entity))
    }
}

impl From<Arc<Entity>> for PipelineEntity {
    fn from(entity: Arc<Entity>) -> Self {
        PipelineEntity::Static(entity)
    }
}

impl From<ParametrizedEntity> for PipelineEntity {
    fn from(entity: ParametrizedEntity) -> Self {
        PipelineEntity::template(entity)
    }
}

impl From<Arc<dyn EntityTemplate>> for PipelineEntity {
    fn from(template: Arc<dyn EntityTemplate>) -> Self {
        PipelineEntity::Parametrized(template)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub schedule: Option<Schedule>,
    pub kind: PipelineKind,
    pub start_time: Option<StartTime>,
    pub trigger: Option<Trigger>,
    pub entities: Vec<PipelineEntity>,
    /// Render-time parameters; parametrized entities are rendered with them.
    pub params: Parameters,
    pub dag_params: IndexMap<String, String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        validate_version(&version)?;

        Ok(Self {
            name: name.into(),
            version,
            description: None,
            schedule: None,
            kind: PipelineKind::default(),
            start_time: None,
            trigger: None,
            entities: Vec::new(),
            params: Parameters::new(),
            dag_params: IndexMap::new(),
        })
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_cron(mut self, expr: impl Into<String>) -> Self {
        self.schedule = Some(Schedule::cron(expr));
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Chains this pipeline to run after `upstream`.
    pub fn schedule_after(mut self, upstream: &Pipeline) -> Self {
        self.schedule = Some(Schedule::After(upstream.as_ref_target()));
        self
    }

    pub fn with_kind(mut self, kind: PipelineKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_start_time(mut self, start_time: StartTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<PipelineEntity>) -> Self {
        self.entities.push(entity.into());
        self
    }

    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_dag_params(mut self, dag_params: IndexMap<String, String>) -> Self {
        self.dag_params = dag_params;
        self
    }

    pub fn add_entity(&mut self, entity: impl Into<PipelineEntity>) {
        self.entities.push(entity.into());
    }

    pub fn as_ref_target(&self) -> PipelineRef {
        PipelineRef {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    pub fn get_entity(&self, name: &str) -> Option<&PipelineEntity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn to_dict(&self) -> Result<Value> {
        let entities = self
            .entities
            .iter()
            .map(|e| e.to_dict(&self.params))
            .collect::<Result<Vec<_>>>()?;

        let dict = PipelineDict {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            schedule: self.schedule.clone(),
            start_time: self.start_time.map(|s| s.format()),
            timezone: self.start_time.and_then(|s| s.timezone_name()).map(str::to_string),
            trigger: self.trigger.as_ref().map(Trigger::to_dict).transpose()?,
            kind: self.kind,
            params: self.params.clone(),
            dag_params: self.dag_params.clone(),
            entities,
        };
        Ok(serde_json::to_value(dict)?)
    }

    /// Entities are read back as static entities.
    pub fn from_dict(value: &Value) -> Result<Self> {
        let dict: PipelineDict = serde_json::from_value(value.clone())?;
        validate_version(&dict.version)?;

        let start_time = dict
            .start_time
            .as_deref()
            .map(|s| StartTime::parse(s, dict.timezone.as_deref()))
            .transpose()?;

        let trigger = dict.trigger.as_ref().map(Trigger::from_dict).transpose()?;

        let entities = dict
            .entities
            .iter()
            .map(|e| Entity::from_dict(e).map(PipelineEntity::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: dict.name,
            version: dict.version,
            description: dict.description,
            schedule: dict.schedule,
            kind: dict.kind,
            start_time,
            trigger,
            entities,
            params: dict.params,
            dag_params: dict.dag_params,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct PipelineDict {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    schedule: Option<Schedule>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    trigger: Option<Value>,
    #[serde(default)]
    kind: PipelineKind,
    #[serde(default)]
    params: Parameters,
    #[serde(default)]
    dag_params: IndexMap<String, String>,
    #[serde(default)]
    entities: Vec<Value>,
}
