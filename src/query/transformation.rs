use serde::{Deserialize, Serialize};
use crate::error::{BqFlowError, Result};
use crate::schema::{ClusterConfig, FieldConfig, RangePartitioning, TimePartitioning};
use super::{null_as_default, Dependency, QueryBase, QueryKind, QueryObject, WithSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WriteDisposition {
    #[serde(rename = "UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "WRITE_EMPTY")]
    WriteEmpty,
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,
    #[serde(rename = "WRITE_APPEND")]
    Append,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaUpdateOption {
    AllowFieldAddition,
    AllowFieldRelaxation,
}

pub const DEFAULT_WRITE_DISPOSITION: WriteDisposition = WriteDisposition::Append;
pub const DEFAULT_SCHEMA_UPDATE_OPTIONS: &[SchemaUpdateOption] = &[SchemaUpdateOption::AllowFieldAddition];

fn default_write_disposition() -> WriteDisposition {
    DEFAULT_WRITE_DISPOSITION
}

fn default_schema_update_options() -> Vec<SchemaUpdateOption> {
    DEFAULT_SCHEMA_UPDATE_OPTIONS.to_vec()
}

fn default_true() -> bool {
    true
}

/// A single SQL task whose result is (optionally) written to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Transformation {
    #[serde(flatten)]
    pub base: QueryBase,
    #[serde(default)]
    pub has_output: bool,
    #[serde(default)]
    pub destination_table: Option<String>,
    #[serde(default = "default_true")]
    pub keep_old_columns: bool,
    #[serde(default)]
    pub persist_backup: Option<bool>,
    #[serde(default = "default_write_disposition")]
    pub write_disposition: WriteDisposition,
    #[serde(default)]
    pub time_partitioning: Option<TimePartitioning>,
    #[serde(default)]
    pub range_partitioning: Option<RangePartitioning>,
    #[serde(default)]
    pub cluster_fields: Option<ClusterConfig>,
    /// Days before the output table expires.
    #[serde(default)]
    pub table_expiration: Option<u32>,
    /// Days before a partition of the output table expires.
    #[serde(default)]
    pub partition_expiration: Option<u32>,
    #[serde(default)]
    pub required_partition_filter: bool,
    #[serde(default = "default_schema_update_options")]
    pub schema_update_options: Vec<SchemaUpdateOption>,
    #[serde(rename = "DEPENDS_ON", default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<Dependency>,
    #[serde(rename = "PARSING_DEPENDS_ON", default, deserialize_with = "null_as_default")]
    pub parsing_dependencies: Vec<Dependency>,
    /// Sandbox only: drop and recreate the output table on each run.
    #[serde(default)]
    pub destroy_table: bool,
    /// Fan-out: one task per table, named `<name>_<table>`.
    #[serde(default)]
    pub tables: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: Vec<FieldConfig>,
    #[serde(default)]
    pub run_before_keyset: bool,
    #[serde(default)]
    pub trigger_rule: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub execution_timeout: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keysets_used: Vec<String>,
    #[serde(default)]
    pub force_cache_refresh: bool,
}

impl Transformation {
    pub fn new(name: impl Into<String>, query: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base: QueryBase::new(name, query, version)?,
            has_output: false,
            destination_table: None,
            keep_old_columns: true,
            persist_backup: None,
            write_disposition: DEFAULT_WRITE_DISPOSITION,
            time_partitioning: None,
            range_partitioning: None,
            cluster_fields: None,
            table_expiration: None,
            partition_expiration: None,
            required_partition_filter: false,
            schema_update_options: DEFAULT_SCHEMA_UPDATE_OPTIONS.to_vec(),
            dependencies: Vec::new(),
            parsing_dependencies: Vec::new(),
            destroy_table: false,
            tables: None,
            schema: Vec::new(),
            run_before_keyset: false,
            trigger_rule: None,
            execution_timeout: None,
            keysets_used: Vec::new(),
            force_cache_refresh: false,
        })
    }

    fn check_partitioning(&self) -> Result<()> {
        if self.time_partitioning.is_some() && self.range_partitioning.is_some() {
            return Err(BqFlowError::MultiPartitioning(format!(
                "transformation {} defines both time partitioning and range partitioning, only one is allowed",
                self.base.name
            )));
        }
        Ok(())
    }

    pub fn with_output(mut self, has_output: bool) -> Self {
        self.has_output = has_output;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.base.is_static = is_static;
        self
    }

    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.base.encrypt = Some(encrypt);
        self
    }

    pub fn with_destination_data_mart(mut self, alias: impl Into<String>) -> Self {
        self.base.destination_data_mart = Some(alias.into());
        self
    }

    pub fn with_destination_table(mut self, table: impl Into<String>) -> Self {
        self.destination_table = Some(table.into());
        self
    }

    pub fn with_keep_old_columns(mut self, keep: bool) -> Self {
        self.keep_old_columns = keep;
        self
    }

    pub fn with_persist_backup(mut self, persist: bool) -> Self {
        self.persist_backup = Some(persist);
        self
    }

    pub fn with_write_disposition(mut self, disposition: WriteDisposition) -> Self {
        self.write_disposition = disposition;
        self
    }

    pub fn with_time_partitioning(mut self, partitioning: TimePartitioning) -> Result<Self> {
        self.time_partitioning = Some(partitioning);
        self.check_partitioning()?;
        Ok(self)
    }

    pub fn with_range_partitioning(mut self, partitioning: RangePartitioning) -> Result<Self> {
        self.range_partitioning = Some(partitioning);
        self.check_partitioning()?;
        Ok(self)
    }

    pub fn with_cluster_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        self.cluster_fields = Some(ClusterConfig::from_fields(fields)?);
        Ok(self)
    }

    pub fn with_table_expiration(mut self, days: u32) -> Self {
        self.table_expiration = Some(days);
        self
    }

    pub fn with_partition_expiration(mut self, days: u32) -> Self {
        self.partition_expiration = Some(days);
        self
    }

    pub fn with_required_partition_filter(mut self, required: bool) -> Self {
        self.required_partition_filter = required;
        self
    }

    pub fn with_schema_update_options(mut self, options: Vec<SchemaUpdateOption>) -> Self {
        self.schema_update_options = options;
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

    pub fn with_destroy_table(mut self, destroy: bool) -> Self {
        self.destroy_table = destroy;
        self
    }

    pub fn with_tables(mut self, tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tables = Some(tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_schema(mut self, schema: Vec<FieldConfig>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_run_before_keyset(mut self, run_before: bool) -> Self {
        self.run_before_keyset = run_before;
        self
    }

    pub fn with_trigger_rule(mut self, rule: impl Into<String>) -> Self {
        self.trigger_rule = Some(rule.into());
        self
    }

    pub fn with_execution_timeout(mut self, seconds: u64) -> Self {
        self.execution_timeout = Some(seconds);
        self
    }

    pub fn with_keysets_used(mut self, keysets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keysets_used = keysets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_force_cache_refresh(mut self, force: bool) -> Self {
        self.force_cache_refresh = force;
        self
    }

    /// Task names produced by the fan-out over `tables`, or the plain name.
    pub fn task_names(&self) -> Vec<String> {
        match &self.tables {
            Some(tables) if !tables.is_empty() => tables
                .iter()
                .map(|t| format!("{}_{}", self.base.name, t))
                .collect(),
            _ => vec![self.base.name.clone()],
        }
    }
}

impl QueryObject for Transformation {
    const KIND: QueryKind = QueryKind::Transformation;

    fn base(&self) -> &QueryBase {
        &self.base
    }

    fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.check_partitioning()?;
        if let Some(cluster) = &self.cluster_fields {
            cluster.validate()?;
        }
        Ok(())
    }
}

impl WithSchema for Transformation {
    fn schema(&self) -> &[FieldConfig] {
        &self.schema
    }
}
