pub mod error;
pub mod version;
pub mod schema;
pub mod query;
pub mod entity;
pub mod pipeline;
pub mod trigger;
pub mod custom_code;
pub mod loader;
pub mod diff;

pub use error::{BqFlowError, Result};
pub use version::{is_valid_version, validate_version};
pub use schema::{
    BqType, ClusterConfig, FieldConfig, FieldMode, PartitionRange, RangePartitioning,
    TimePartitionType, TimePartitioning,
};
pub use query::{
    Argument, ArgumentMode, Dependency, Function, ProcedureArgument, Query, QueryBase, QueryKind,
    QueryObject, SchemaUpdateOption, StoredProcedure, Transformation, View, WithSchema,
    WriteDisposition,
};
pub use entity::{
    parametrized_name, Entity, EntityTemplate, Parameters, ParametrizedEntity, StageConfigProvider,
    StageLayout, VersionMap, BASE_LAYER_STAGES,
};
pub use pipeline::{
    format_target_pipeline, parse_target_pipeline, ParametrizedPipeline, Pipeline, PipelineEntity,
    PipelineKind, PipelineRef, Schedule, StartTime,
};
pub use trigger::{trigger_factory, Trigger, TriggerKind};
pub use custom_code::{BuilderSignature, CustomCode, Requirement};
pub use loader::DefinitionLoader;
pub use diff::{changed_pipelines, fingerprint, format_definition_diff, has_changes, ChangeStatus, DefinitionChange};
