use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};
use crate::entity::{parametrized_name, Parameters};
use crate::error::{BqFlowError, Result};
use crate::trigger::Trigger;
use crate::version::validate_version;
use super::{Pipeline, PipelineEntity, PipelineKind, Schedule, StartTime};

/// A pipeline definition expanded into one concrete pipeline per combination of
/// parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametrizedPipeline {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub schedule: Option<Schedule>,
    pub kind: PipelineKind,
    pub start_time: Option<StartTime>,
    pub trigger: Option<Trigger>,
    /// Axis name to candidate values, in declaration order.
    pub parameters: IndexMap<String, Vec<String>>,
    pub dag_params: IndexMap<String, String>,
    entities: Vec<PipelineEntity>,
}

impl ParametrizedPipeline {
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
            parameters: IndexMap::new(),
            dag_params: IndexMap::new(),
            entities: Vec::new(),
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

    pub fn with_parameter<I, S>(mut self, axis: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters
            .insert(axis.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dag_params(mut self, dag_params: IndexMap<String, String>) -> Self {
        self.dag_params = dag_params;
        self
    }

    pub fn with_entity(mut self, entity: impl Into<PipelineEntity>) -> Result<Self> {
        self.add_entity(entity)?;
        Ok(self)
    }

    /// Only parametrized entities are accepted.
    pub fn add_entity(&mut self, entity: impl Into<PipelineEntity>) -> Result<()> {
        let entity = entity.into();
        if !entity.is_parametrized() {
            return Err(BqFlowError::NotParametrized(format!(
                "entity type not valid, this pipeline only supports parameterized entity (got '{}')",
                entity.name()
            )));
        }
        self.entities.push(entity);
        Ok(())
    }

    pub fn entities(&self) -> &[PipelineEntity] {
        &self.entities
    }

    /// Cartesian product of the parameter axes; the last axis varies fastest.
    ///
    /// No axes yields a single empty assignment, an empty axis yields none.
    pub fn parameter_combinations(&self) -> Vec<Parameters> {
        let axes: Vec<(&String, &Vec<String>)> = self.parameters.iter().collect();
        let mut combinations = Vec::with_capacity(self.combination_count());
        cartesian_product(&axes, 0, &mut Parameters::new(), &mut combinations);
        combinations
    }

    pub fn combination_count(&self) -> usize {
        self.parameters.values().map(Vec::len).product()
    }

    /// One concrete pipeline per parameter combination. Entities are shared with
    /// this definition, not copied.
    pub fn unrolled_pipelines(&self) -> Result<Vec<Pipeline>> {
        let combinations = self.parameter_combinations();
        info!(pipeline = %self.name, combinations = combinations.len(), "Expanding parametrized pipeline");

        combinations
            .into_iter()
            .map(|params| self.render(params))
            .collect()
    }

    pub fn to_dict(&self) -> Result<Vec<Value>> {
        self.unrolled_pipelines()?
            .iter()
            .map(Pipeline::to_dict)
            .collect()
    }

    fn render(&self, params: Parameters) -> Result<Pipeline> {
        let name = parametrized_name(&self.name, &params)?;
        debug!(pipeline = %name, "Rendered pipeline variant");

        Ok(Pipeline {
            name,
            version: self.version.clone(),
            description: self.description.clone(),
            schedule: self.schedule.clone(),
            kind: self.kind,
            start_time: self.start_time,
            trigger: self.trigger.clone(),
            entities: self.entities.clone(),
            params,
            dag_params: self.dag_params.clone(),
        })
    }
}

fn cartesian_product(
    axes: &[(&String, &Vec<String>)],
    index: usize,
    current: &mut Parameters,
    results: &mut Vec<Parameters>,
) {
    if index == axes.len() {
        results.push(current.clone());
        return;
    }

    let (name, values) = axes[index];
    for value in values {
        current.insert(name.clone(), value.clone());
        cartesian_product(axes, index + 1, current, results);
        current.shift_remove(name.as_str());
    }
}
