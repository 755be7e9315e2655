use console_logging::{console_debug, console_info};
use fleet_core::{
    BatchProgress, EntityFailure, EntityRef, EntitySnapshot, EntityState, FleetReport, TaskCounts,
};
use futures_util::future::try_join;

use crate::batch::FetchOutcome;
use crate::{ApiClient, ApiError, BatchExecutor, ConnectorInfo, ConnectorStatus};

const CONNECTOR_CLASS: &str = "connector.class";

/// Builds the table row for one connector from its status and config.
pub fn build_snapshot(
    name: &str,
    status: &ConnectorStatus,
    info: &ConnectorInfo,
) -> EntitySnapshot {
    let task_counts = status
        .tasks
        .iter()
        .fold(TaskCounts::default(), |mut counts, task| {
            counts.total += 1;
            match EntityState::from_api(&task.state) {
                EntityState::Running => counts.running += 1,
                EntityState::Failed => counts.failed += 1,
                EntityState::Paused | EntityState::Unknown => {}
            }
            counts
        });

    EntitySnapshot {
        name: name.to_string(),
        state: EntityState::from_api(&status.connector.state),
        task_counts,
        plugin: info.config.get(CONNECTOR_CLASS).cloned(),
        topics: topics(info),
        worker_id: status.connector.worker_id.clone(),
    }
}

fn topics(info: &ConnectorInfo) -> Vec<String> {
    let raw = info
        .config
        .get("topics")
        .or_else(|| info.config.get("topic"));
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Fetches status and config for one connector concurrently.
pub async fn fetch_entity(
    client: &ApiClient,
    entity: &EntityRef,
) -> Result<EntitySnapshot, ApiError> {
    let (status, info) = try_join(
        client.connector_status(&entity.cluster_id, &entity.name),
        client.connector_info(&entity.cluster_id, &entity.name),
    )
    .await?;
    Ok(build_snapshot(&entity.name, &status, &info))
}

/// Lists the fleet and fans out per-connector fetches.
///
/// Fails only when the listing itself fails; per-connector failures are
/// reported in [`FleetReport::failures`].
pub async fn refresh_fleet(
    client: &ApiClient,
    cluster: &str,
    executor: &BatchExecutor,
    on_progress: impl FnMut(BatchProgress),
) -> Result<FleetReport, ApiError> {
    let names = client.list_connectors(cluster).await?;
    let entities: Vec<EntityRef> = names
        .iter()
        .map(|name| EntityRef::new(cluster, name.as_str()))
        .collect();

    let outcome = executor
        .run(&entities, |entity| fetch_entity(client, entity), on_progress)
        .await;

    let mut report = FleetReport::default();
    for item in outcome.into_outcomes() {
        match item {
            FetchOutcome::Success { result, .. } => report.snapshots.push(result),
            FetchOutcome::Failure { index, error } => {
                let name = entities[index].name.clone();
                console_debug!("connector {name} could not be refreshed: {error}");
                report.failures.push(EntityFailure {
                    name,
                    error: error.categorized(),
                });
            }
        }
    }

    console_info!(
        "refreshed {cluster}: {} connector(s), {} failed",
        entities.len(),
        report.failures.len()
    );
    Ok(report)
}
