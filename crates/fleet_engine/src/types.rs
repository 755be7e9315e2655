use std::collections::BTreeMap;

use fleet_core::{
    Action, BatchProgress, BulkResult, CategorizedError, CycleId, EntityName, EntitySnapshot,
    FleetReport,
};
use serde::Deserialize;

/// `GET /api/{cluster}/connectors/{name}/status`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectorStatus {
    #[serde(default)]
    pub name: Option<String>,
    pub connector: ConnectorState,
    #[serde(default)]
    pub tasks: Vec<TaskStatus>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectorState {
    pub state: String,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskStatus {
    pub id: u32,
    pub state: String,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub trace: Option<String>,
}

/// `GET /api/{cluster}/connectors/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectorInfo {
    pub name: String,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub tasks: Vec<TaskRef>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskRef {
    pub connector: String,
    pub task: u32,
}

/// One entry of `GET /api/{cluster}/connector-plugins`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginInfo {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Response of the config validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigValidation {
    pub name: String,
    pub error_count: u32,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub configs: Vec<ConfigEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigEntry {
    pub value: ConfigValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ConfigValidation {
    /// Fields that carry at least one validation error.
    pub fn field_errors(&self) -> Vec<(&str, &[String])> {
        self.configs
            .iter()
            .filter(|entry| !entry.value.errors.is_empty())
            .map(|entry| (entry.value.name.as_str(), entry.value.errors.as_slice()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RefreshProgress {
        cycle: CycleId,
        progress: BatchProgress,
    },
    RefreshCompleted {
        cycle: CycleId,
        result: Result<FleetReport, CategorizedError>,
    },
    EntityRefreshed {
        name: EntityName,
        generation: u64,
        result: Result<EntitySnapshot, CategorizedError>,
    },
    BulkCompleted {
        action: Action,
        result: BulkResult,
    },
}
