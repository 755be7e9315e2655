//! Fleet engine: HTTP gateway, typed API client and batch orchestration.
mod api;
mod batch;
mod bulk;
mod engine;
mod fetch;
mod fleet;
mod types;

pub use api::{ApiClient, ApiError, ApiTimeouts};
pub use batch::{BatchConfigError, BatchExecutor, BatchOutcome, FetchOutcome, Indexed};
pub use bulk::apply_action;
pub use engine::{ChannelEventSink, EngineConfig, EngineError, EngineHandle, EventSink};
pub use fetch::{
    Gateway, GatewayError, GatewayRequest, GatewayResponse, GatewaySettings, ReqwestGateway,
};
pub use fleet::{build_snapshot, fetch_entity, refresh_fleet};
pub use types::{
    ConfigEntry, ConfigValidation, ConfigValue, ConnectorInfo, ConnectorState, ConnectorStatus,
    EngineEvent, PluginInfo, TaskRef, TaskStatus,
};
