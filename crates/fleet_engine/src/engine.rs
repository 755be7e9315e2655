use std::sync::{mpsc, Arc};
use std::thread;

use console_logging::{console_error, console_info};
use fleet_core::{Action, CycleId, EntityName, EntityRef};
use thiserror::Error;

use crate::fetch::{GatewaySettings, ReqwestGateway};
use crate::{
    apply_action, fetch_entity, refresh_fleet, ApiClient, ApiError, ApiTimeouts, BatchConfigError,
    BatchExecutor, EngineEvent, GatewayError,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Batch(#[from] BatchConfigError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub cluster_id: String,
    pub concurrency: usize,
    pub timeouts: ApiTimeouts,
    pub gateway: GatewaySettings,
}

/// Receives engine events, possibly from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    RefreshFleet { cycle: CycleId },
    RefreshEntity { name: EntityName, generation: u64 },
    ApplyAction { names: Vec<EntityName>, action: Action },
}

struct Worker {
    client: ApiClient,
    cluster_id: String,
    executor: BatchExecutor,
    sink: Arc<dyn EventSink>,
}

/// Owns a background thread running a tokio runtime. Commands are fire and
/// forget; results come back through the [`EventSink`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    client: ApiClient,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let gateway = ReqwestGateway::new(&config.gateway)?;
        let client = ApiClient::new(Arc::new(gateway), &config.base_url, config.timeouts)?;
        let executor = BatchExecutor::new(config.concurrency)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let worker = Arc::new(Worker {
            client: client.clone(),
            cluster_id: config.cluster_id,
            executor,
            sink,
        });
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let worker = worker.clone();
                runtime.spawn(async move {
                    worker.handle(command).await;
                });
            }
            console_info!("engine command channel closed; shutting down");
        });

        Ok(Self { cmd_tx, client })
    }

    pub fn refresh_fleet(&self, cycle: CycleId) {
        self.send(EngineCommand::RefreshFleet { cycle });
    }

    /// Refetches one connector; the result echoes `generation`.
    pub fn refresh_entity(&self, name: impl Into<EntityName>, generation: u64) {
        self.send(EngineCommand::RefreshEntity {
            name: name.into(),
            generation,
        });
    }

    pub fn apply_action(&self, names: Vec<EntityName>, action: Action) {
        self.send(EngineCommand::ApplyAction { names, action });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            console_error!("engine thread is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // In-flight requests settle as cancelled instead of running to their deadline.
        self.client.cancellation().cancel();
    }
}

impl Worker {
    async fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::RefreshFleet { cycle } => {
                let sink = self.sink.clone();
                let on_progress = |progress| {
                    sink.emit(EngineEvent::RefreshProgress { cycle, progress });
                };
                let result =
                    refresh_fleet(&self.client, &self.cluster_id, &self.executor, on_progress)
                        .await
                        .map_err(|err| err.categorized());
                self.sink.emit(EngineEvent::RefreshCompleted { cycle, result });
            }
            EngineCommand::RefreshEntity { name, generation } => {
                let entity = EntityRef::new(self.cluster_id.as_str(), name.as_str());
                let result = fetch_entity(&self.client, &entity)
                    .await
                    .map_err(|err| err.categorized());
                self.sink.emit(EngineEvent::EntityRefreshed {
                    name,
                    generation,
                    result,
                });
            }
            EngineCommand::ApplyAction { names, action } => {
                let result =
                    apply_action(&self.client, &self.cluster_id, &names, action, &self.executor)
                        .await;
                self.sink.emit(EngineEvent::BulkCompleted { action, result });
            }
        }
    }
}
