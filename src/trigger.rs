//! Event sources that can start a pipeline run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use crate::error::{BqFlowError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Trigger {
    #[serde(rename = "pubsub")]
    PubSub {
        topic: String,
        /// Project hosting the subscription; the orchestrator's own project when unset.
        #[serde(default)]
        subscription_project: Option<String>,
    },
    #[serde(rename = "gcs_watch_prefix")]
    GcsPrefixWatch { bucket: String, prefix: String },
    #[serde(rename = "gcs_object_exist")]
    GcsObjectExist { bucket: String, object: String },
    #[serde(rename = "gcs_object_change")]
    GcsObjectChange { bucket: String, object: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    PubSub,
    GcsPrefixWatch,
    GcsObjectExist,
    GcsObjectChange,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 4] = [
        TriggerKind::PubSub,
        TriggerKind::GcsPrefixWatch,
        TriggerKind::GcsObjectExist,
        TriggerKind::GcsObjectChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::PubSub => "pubsub",
            TriggerKind::GcsPrefixWatch => "gcs_watch_prefix",
            TriggerKind::GcsObjectExist => "gcs_object_exist",
            TriggerKind::GcsObjectChange => "gcs_object_change",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a `type` discriminator to its trigger variant.
pub fn trigger_factory(kind: &str) -> Result<TriggerKind> {
    match kind {
        "pubsub" => Ok(TriggerKind::PubSub),
        "gcs_watch_prefix" => Ok(TriggerKind::GcsPrefixWatch),
        "gcs_object_exist" => Ok(TriggerKind::GcsObjectExist),
        "gcs_object_change" => Ok(TriggerKind::GcsObjectChange),
        other => Err(BqFlowError::UnknownTrigger(format!(
            "'{}' is not one of: {}",
            other,
            TriggerKind::ALL.map(|k| k.as_str()).join(", ")
        ))),
    }
}

impl Trigger {
    pub fn pubsub(topic: impl Into<String>) -> Self {
        Trigger::PubSub {
            topic: topic.into(),
            subscription_project: None,
        }
    }

    pub fn pubsub_in_project(topic: impl Into<String>, project: impl Into<String>) -> Self {
        Trigger::PubSub {
            topic: topic.into(),
            subscription_project: Some(project.into()),
        }
    }

    pub fn gcs_prefix_watch(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Trigger::GcsPrefixWatch {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn gcs_object_exist(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Trigger::GcsObjectExist {
            bucket: bucket.into(),
            object: object.into(),
        }
    }

    pub fn gcs_object_change(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Trigger::GcsObjectChange {
            bucket: bucket.into(),
            object: object.into(),
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::PubSub { .. } => TriggerKind::PubSub,
            Trigger::GcsPrefixWatch { .. } => TriggerKind::GcsPrefixWatch,
            Trigger::GcsObjectExist { .. } => TriggerKind::GcsObjectExist,
            Trigger::GcsObjectChange { .. } => TriggerKind::GcsObjectChange,
        }
    }

    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(value: &Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BqFlowError::InvalidDict("trigger without a 'type' field".to_string()))?;
        trigger_factory(kind)?;
        Ok(serde_json::from_value(value.clone())?)
    }
}
